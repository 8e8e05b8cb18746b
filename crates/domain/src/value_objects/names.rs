//! Validated name newtypes for domain entities
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed (or normalized) on the way in

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Minimum length for workspace and channel names
const MIN_NAME_LENGTH: usize = 3;

/// Maximum length for workspace and channel names
const MAX_NAME_LENGTH: usize = 80;

/// Maximum length for a message body (rich-text payloads included)
const MAX_BODY_LENGTH: usize = 20_000;

/// Maximum length for a reaction value
const MAX_REACTION_LENGTH: usize = 32;

/// Maximum length for an order label
const MAX_ORDER_NAME_LENGTH: usize = 100;

fn check_length(kind: &str, value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(format!(
            "{} must be between {} and {} characters",
            kind, min, max
        )));
    }
    Ok(())
}

// ============================================================================
// WorkspaceName
// ============================================================================

/// A validated workspace name (trimmed, 3-80 chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceName(String);

impl WorkspaceName {
    /// Create a new validated workspace name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the trimmed name is shorter than
    /// 3 or longer than 80 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Workspace name cannot be empty"));
        }
        check_length("Workspace name", trimmed, MIN_NAME_LENGTH, MAX_NAME_LENGTH)?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WorkspaceName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<WorkspaceName> for String {
    fn from(name: WorkspaceName) -> String {
        name.0
    }
}

// ============================================================================
// ChannelName
// ============================================================================

/// A normalized channel name.
///
/// Every run of whitespace becomes a single `-` and the result is lowercased,
/// so `"Team  Updates"` is stored as `"team-updates"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// Normalize and validate a channel name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the normalized name is outside
    /// 3-80 characters or consists only of dashes.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let normalized = Self::normalize(&name.into());
        check_length("Channel name", &normalized, MIN_NAME_LENGTH, MAX_NAME_LENGTH)?;
        if normalized.chars().all(|c| c == '-') {
            return Err(DomainError::validation(
                "Channel name cannot be empty or whitespace only",
            ));
        }
        Ok(Self(normalized))
    }

    fn normalize(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut in_whitespace = false;
        for c in raw.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    out.push('-');
                }
                in_whitespace = true;
            } else {
                out.extend(c.to_lowercase());
                in_whitespace = false;
            }
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> String {
        name.0
    }
}

// ============================================================================
// MessageBody
// ============================================================================

/// Message body as submitted by the editor (plain text or serialized rich text).
///
/// Stored verbatim; only rejected when blank or oversized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(body: impl Into<String>) -> Result<Self, DomainError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(DomainError::validation("Message body cannot be empty"));
        }
        if body.chars().count() > MAX_BODY_LENGTH {
            return Err(DomainError::validation(format!(
                "Message body cannot exceed {} characters",
                MAX_BODY_LENGTH
            )));
        }
        Ok(Self(body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MessageBody {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MessageBody> for String {
    fn from(body: MessageBody) -> String {
        body.0
    }
}

// ============================================================================
// ReactionValue
// ============================================================================

/// An emoji (or short token) attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReactionValue(String);

impl ReactionValue {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Reaction cannot be empty"));
        }
        if trimmed.chars().count() > MAX_REACTION_LENGTH {
            return Err(DomainError::validation(format!(
                "Reaction cannot exceed {} characters",
                MAX_REACTION_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReactionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ReactionValue {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ReactionValue> for String {
    fn from(value: ReactionValue) -> String {
        value.0
    }
}

// ============================================================================
// OrderName
// ============================================================================

/// Optional customer-facing label on a pickup order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderName(String);

impl OrderName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Order name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_ORDER_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Order name cannot exceed {} characters",
                MAX_ORDER_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Blank input means "no name".
    pub fn optional(name: Option<String>) -> Result<Option<Self>, DomainError> {
        match name {
            Some(n) if !n.trim().is_empty() => Self::new(n).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OrderName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<OrderName> for String {
    fn from(name: OrderName) -> String {
        name.0
    }
}
