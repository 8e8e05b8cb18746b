//! REST request bodies and query strings.

mod auth;
mod channel;
mod member;
mod message;
mod order;
mod workspace;

pub use auth::{RequestCodeBody, VerifyCodeBody};
pub use channel::{CreateChannelBody, UpdateChannelBody};
pub use member::{CreateConversationBody, UpdateMemberBody};
pub use message::{CreateMessageBody, ListMessagesQuery, ToggleReactionBody, UpdateMessageBody};
pub use order::CreateOrderBody;
pub use workspace::{CreateWorkspaceBody, JoinWorkspaceBody, UpdateWorkspaceBody};
