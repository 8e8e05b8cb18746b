//! Grupa Shared - wire types for the server and its clients
//!
//! This crate contains the types both sides of the wire agree on:
//! - REST request bodies and query strings
//! - WebSocket message types (ClientMessage, ServerMessage)
//! - Error codes and the JSON error envelope
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and uuid
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod messages;
pub mod requests;
pub mod responses;

pub use messages::{ChangeAction, ClientMessage, EntityKind, ServerMessage};
pub use requests::{
    CreateChannelBody, CreateConversationBody, CreateMessageBody, CreateOrderBody,
    CreateWorkspaceBody, JoinWorkspaceBody, ListMessagesQuery, RequestCodeBody,
    ToggleReactionBody, UpdateChannelBody, UpdateMemberBody, UpdateMessageBody,
    UpdateWorkspaceBody, VerifyCodeBody,
};
pub use responses::{ErrorBody, ErrorCode};
