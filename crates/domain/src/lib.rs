//! Grupa domain model.
//!
//! Typed identifiers, validated value objects, aggregates with guarded state
//! transitions and the pure algorithms the server builds on (code generation,
//! reaction aggregation). Nothing here performs I/O.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod pagination;
pub mod value_objects;

pub use aggregates::{
    Message, MessageDraft, Order, OrderRecord, OrderStatus, Workspace, MAX_PREPARATION_MINUTES,
};

pub use entities::{
    summarize_reactions, Channel, Conversation, Member, MemberRole, PendingVerification,
    Reaction, ReactionSummary, Session, User, UserProfile, DEFAULT_CHANNEL_NAME,
};

pub use error::DomainError;

pub use ids::{
    ChannelId, ConversationId, MemberId, MessageId, OrderId, ReactionId, SessionId, StorageId,
    UserId, WorkspaceId,
};

pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub use value_objects::{
    ChannelName, Email, JoinCode, MessageBody, OrderCode, OrderName, ReactionValue,
    VerificationCode, WorkspaceName,
};
