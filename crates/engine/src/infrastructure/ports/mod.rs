//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Record storage (SQLite today)
//! - E-mail delivery (Resend, or a log-only mailer in development)
//! - Upload storage (local filesystem)
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;
mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{
    AuthRepo, ChannelRepo, ConversationRepo, MemberRepo, MessageRepo, OrderRepo, ReactionRepo,
    UserRepo, WorkspaceRepo,
};

pub use types::{MessageScope, StoredBlob, ThreadStats};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{BlobStore, MailerPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{
    MockAuthRepo, MockChannelRepo, MockConversationRepo, MockMemberRepo, MockMessageRepo,
    MockOrderRepo, MockReactionRepo, MockUserRepo, MockWorkspaceRepo,
};

#[cfg(test)]
pub use external::{MockBlobStore, MockMailerPort};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{pick_index, ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{BlobError, MailerError, RepoError};
