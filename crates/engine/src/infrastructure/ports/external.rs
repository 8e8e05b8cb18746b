//! External service port traits (e-mail delivery, file storage).

use async_trait::async_trait;
use grupa_domain::{Email, StorageId, VerificationCode};

use super::error::{BlobError, MailerError};
use super::types::StoredBlob;

/// Transactional e-mail used by the sign-in flow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailerPort: Send + Sync {
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> Result<(), MailerError>;
}

/// Storage for uploaded message images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, id: StorageId, content_type: &str, bytes: &[u8]) -> Result<(), BlobError>;
    async fn get(&self, id: StorageId) -> Result<Option<StoredBlob>, BlobError>;
    /// Removing a missing blob is not an error.
    async fn delete(&self, id: StorageId) -> Result<(), BlobError>;
}
