//! Team chat use cases: workspaces, members, channels, conversations,
//! messages and reactions.
//!
//! Reads the caller is not allowed to see return `None` or an empty list.
//! Mutations the caller is not allowed to perform fail with
//! `ChatError::Forbidden`.

mod access;
mod channel;
mod conversation;
mod member;
mod message;
mod reaction;
mod workspace;

use grupa_domain::DomainError;

use crate::infrastructure::ports::RepoError;

pub use access::Access;
pub use channel::ChannelOps;
pub use conversation::ConversationOps;
pub use member::{MemberOps, MemberWithUser};
pub use message::{MessageListItem, MessageListScope, MessageOps, MessageView, NewMessage};
pub use reaction::{ReactionOps, ReactionToggle};
pub use workspace::{JoinCodeMatch, WorkspaceInfo, WorkspaceOps};

/// Shared error type for chat use cases.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{entity_type} not found")]
    NotFound { entity_type: &'static str, id: String },
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl ChatError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }
}

impl From<DomainError> for ChatError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::Parse(msg) => Self::InvalidInput(msg),
            DomainError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            DomainError::Constraint(msg) | DomainError::InvalidStateTransition(msg) => {
                Self::Conflict(msg)
            }
        }
    }
}

/// Container for chat use cases.
pub struct ChatUseCases {
    pub workspace: WorkspaceOps,
    pub member: MemberOps,
    pub channel: ChannelOps,
    pub conversation: ConversationOps,
    pub message: MessageOps,
    pub reaction: ReactionOps,
}

impl ChatUseCases {
    pub fn new(
        workspace: WorkspaceOps,
        member: MemberOps,
        channel: ChannelOps,
        conversation: ConversationOps,
        message: MessageOps,
        reaction: ReactionOps,
    ) -> Self {
        Self {
            workspace,
            member,
            channel,
            conversation,
            message,
            reaction,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};
    use grupa_domain::{Member, MemberRole, UserId, WorkspaceId};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 4, 10, 30, 0).unwrap()
    }

    pub fn member(workspace_id: WorkspaceId, user_id: UserId, role: MemberRole) -> Member {
        Member::new(workspace_id, user_id, role, now())
    }
}
