//! Error types for port operations.

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Stored data could not be mapped back into domain types.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unique or foreign-key constraint violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failures delivering transactional e-mail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MailerError {
    #[error("Mail request failed: {0}")]
    RequestFailed(String),
    #[error("Mail provider rejected the message: {0}")]
    Rejected(String),
}

/// Failures reading or writing uploaded files.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Blob I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob metadata is corrupt: {0}")]
    Corrupt(String),
}
