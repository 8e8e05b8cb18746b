//! Repository port traits for database access.
//!
//! One trait per record type. Cascading deletes are a single repository
//! call so the adapter can run them in one transaction; they return the
//! storage ids of message images that are no longer referenced.

use async_trait::async_trait;
use grupa_domain::*;

use super::error::RepoError;
use super::types::{MessageScope, ThreadStats};

// =============================================================================
// Identity
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError>;
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepoError>;
    /// Insert or update.
    async fn save(&self, user: &User) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthRepo: Send + Sync {
    async fn save_session(&self, session: &Session) -> Result<(), RepoError>;
    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>, RepoError>;
    async fn delete_session(&self, token_hash: &str) -> Result<(), RepoError>;

    /// Store a pending code, dropping any earlier codes for the same address.
    async fn replace_verification(
        &self,
        pending: &PendingVerification,
    ) -> Result<(), RepoError>;
    /// Remove and return the pending code matching `email` and `code_hash`.
    ///
    /// A mismatch counts against the pending code, which is dropped once
    /// `max_failed_attempts` mismatches have been recorded.
    async fn take_verification(
        &self,
        email: &Email,
        code_hash: &str,
        max_failed_attempts: u32,
    ) -> Result<Option<PendingVerification>, RepoError>;
}

// =============================================================================
// Workspaces and membership
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkspaceRepo: Send + Sync {
    async fn get(&self, id: WorkspaceId) -> Result<Option<Workspace>, RepoError>;
    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<Workspace>, RepoError>;
    /// Workspaces the user is a member of, oldest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Workspace>, RepoError>;
    /// Insert a new workspace together with its creator's membership and
    /// default channel.
    async fn create(
        &self,
        workspace: &Workspace,
        owner: &Member,
        default_channel: &Channel,
    ) -> Result<(), RepoError>;
    async fn save(&self, workspace: &Workspace) -> Result<(), RepoError>;
    /// Delete the workspace and everything in it.
    async fn delete_cascade(&self, id: WorkspaceId) -> Result<Vec<StorageId>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepo: Send + Sync {
    async fn get(&self, id: MemberId) -> Result<Option<Member>, RepoError>;
    async fn find(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> Result<Option<Member>, RepoError>;
    async fn list_in_workspace(&self, workspace_id: WorkspaceId)
        -> Result<Vec<Member>, RepoError>;
    /// Insert or update the role. Fails with `ConstraintViolation` when the
    /// user already has a different member record in the workspace.
    async fn save(&self, member: &Member) -> Result<(), RepoError>;
    /// Delete the member with its messages, reactions and conversations.
    async fn delete_cascade(&self, id: MemberId) -> Result<Vec<StorageId>, RepoError>;
}

// =============================================================================
// Channels and conversations
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelRepo: Send + Sync {
    async fn get(&self, id: ChannelId) -> Result<Option<Channel>, RepoError>;
    async fn find_by_name(
        &self,
        workspace_id: WorkspaceId,
        name: &ChannelName,
    ) -> Result<Option<Channel>, RepoError>;
    async fn list_in_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<Channel>, RepoError>;
    async fn save(&self, channel: &Channel) -> Result<(), RepoError>;
    /// Delete the channel with its messages and their reactions.
    async fn delete_cascade(&self, id: ChannelId) -> Result<Vec<StorageId>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepo: Send + Sync {
    async fn get(&self, id: ConversationId) -> Result<Option<Conversation>, RepoError>;
    /// Conversation between the two members in either order.
    async fn find_between(
        &self,
        workspace_id: WorkspaceId,
        a: MemberId,
        b: MemberId,
    ) -> Result<Option<Conversation>, RepoError>;
    async fn save(&self, conversation: &Conversation) -> Result<(), RepoError>;
}

// =============================================================================
// Messages and reactions
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn get(&self, id: MessageId) -> Result<Option<Message>, RepoError>;
    /// Insert or update.
    async fn save(&self, message: &Message) -> Result<(), RepoError>;
    /// Newest first. The cursor is opaque to callers.
    async fn list_page(
        &self,
        scope: MessageScope,
        page: &PageRequest,
    ) -> Result<Page<Message>, RepoError>;
    async fn thread_stats(&self, parent_id: MessageId) -> Result<ThreadStats, RepoError>;
    /// Delete the message, its reactions and its thread replies.
    async fn delete_cascade(&self, id: MessageId) -> Result<Vec<StorageId>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionRepo: Send + Sync {
    /// Reactions on a message in insertion order.
    async fn list_for_message(&self, message_id: MessageId) -> Result<Vec<Reaction>, RepoError>;
    async fn find(
        &self,
        message_id: MessageId,
        member_id: MemberId,
        value: &ReactionValue,
    ) -> Result<Option<Reaction>, RepoError>;
    async fn save(&self, reaction: &Reaction) -> Result<(), RepoError>;
    async fn delete(&self, id: ReactionId) -> Result<(), RepoError>;
}

// =============================================================================
// Pickup orders
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError>;
    async fn find_active_by_code(&self, code: &OrderCode) -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepoError>;
    /// Insert or update.
    async fn save(&self, order: &Order) -> Result<(), RepoError>;
}
