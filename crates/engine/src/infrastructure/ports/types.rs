//! Plain data carried across port boundaries.

use grupa_domain::{ChannelId, ConversationId, Message, MessageId};

/// Exact placement a message list is filtered on. All three fields are
/// compared, so top-level channel messages have `parent_message_id == None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageScope {
    pub channel_id: Option<ChannelId>,
    pub conversation_id: Option<ConversationId>,
    pub parent_message_id: Option<MessageId>,
}

/// Reply statistics for one thread parent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThreadStats {
    pub count: u32,
    pub last_reply: Option<Message>,
}

/// Bytes and media type of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}
