//! Authentication records: bearer sessions and one-time e-mail codes.
//!
//! Only SHA-256 hashes of tokens and codes are stored.

use chrono::{DateTime, Utc};

use crate::value_objects::Email;
use crate::{SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A pending sign-in code sent to an e-mail address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub email: Email,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
