//! Short human-typed codes: workspace join codes, pickup order codes and
//! e-mail verification codes.
//!
//! Randomness is injected as a closure `pick(n) -> index in 0..n` so the
//! domain stays free of RNG dependencies and tests stay deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

fn generate_from(alphabet: &[u8], len: usize, mut pick: impl FnMut(usize) -> usize) -> String {
    (0..len)
        .map(|_| {
            let idx = pick(alphabet.len()).min(alphabet.len() - 1);
            char::from(alphabet[idx])
        })
        .collect()
}

fn parse_from(kind: &str, alphabet: &[u8], len: usize, raw: &str) -> Result<String, DomainError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != len {
        return Err(DomainError::validation(format!(
            "{} must be {} characters",
            kind, len
        )));
    }
    if !code.bytes().all(|b| alphabet.contains(&b)) {
        return Err(DomainError::validation(format!(
            "{} contains invalid characters",
            kind
        )));
    }
    Ok(code)
}

// ============================================================================
// JoinCode
// ============================================================================

/// Six-character workspace invitation code (`0-9A-Z`, stored uppercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JoinCode(String);

impl JoinCode {
    pub const ALPHABET: &'static [u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    pub const LENGTH: usize = 6;

    pub fn generate(pick: impl FnMut(usize) -> usize) -> Self {
        Self(generate_from(Self::ALPHABET, Self::LENGTH, pick))
    }

    /// Parse user input; comparison is case-insensitive so input is uppercased.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        parse_from("Join code", Self::ALPHABET, Self::LENGTH, raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for JoinCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<JoinCode> for String {
    fn from(code: JoinCode) -> String {
        code.0
    }
}

// ============================================================================
// OrderCode
// ============================================================================

/// Three-character pickup code shown to customers.
///
/// The alphabet leaves out `I`, `L`, `O` and `0` which are easily confused
/// when read off a screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderCode(String);

impl OrderCode {
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ123456789";
    pub const LENGTH: usize = 3;

    pub fn generate(pick: impl FnMut(usize) -> usize) -> Self {
        Self(generate_from(Self::ALPHABET, Self::LENGTH, pick))
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        parse_from("Order code", Self::ALPHABET, Self::LENGTH, raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OrderCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<OrderCode> for String {
    fn from(code: OrderCode) -> String {
        code.0
    }
}

// ============================================================================
// VerificationCode
// ============================================================================

/// Four-digit one-time sign-in code delivered by e-mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    pub const ALPHABET: &'static [u8] = b"0123456789";
    pub const LENGTH: usize = 4;

    pub fn generate(pick: impl FnMut(usize) -> usize) -> Self {
        Self(generate_from(Self::ALPHABET, Self::LENGTH, pick))
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        parse_from("Verification code", Self::ALPHABET, Self::LENGTH, raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
