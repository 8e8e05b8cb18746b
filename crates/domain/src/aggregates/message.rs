//! Message aggregate - a post in a channel, a direct conversation, or a thread.
//!
//! # Invariants
//!
//! - A message belongs to exactly one of a channel or a conversation.
//!   Thread replies inherit that placement from their parent.
//! - `updated_at` is only set once the author edits the body.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DomainError;
use crate::value_objects::MessageBody;
use crate::{ChannelId, ConversationId, MemberId, MessageId, StorageId, WorkspaceId};

/// Input for posting a new message.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub workspace_id: WorkspaceId,
    pub member_id: MemberId,
    pub body: MessageBody,
    pub image: Option<StorageId>,
    pub channel_id: Option<ChannelId>,
    pub conversation_id: Option<ConversationId>,
    pub parent_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    workspace_id: WorkspaceId,
    member_id: MemberId,
    body: MessageBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<StorageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_id: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<ConversationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_message_id: Option<MessageId>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Post a new message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless exactly one of channel or
    /// conversation is set.
    pub fn post(draft: MessageDraft, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match (draft.channel_id.is_some(), draft.conversation_id.is_some()) {
            (true, false) | (false, true) => {}
            _ => {
                return Err(DomainError::validation(
                    "Message must belong to either a channel or a conversation, but not both or neither",
                ))
            }
        }

        Ok(Self {
            id: MessageId::new(),
            workspace_id: draft.workspace_id,
            member_id: draft.member_id,
            body: draft.body,
            image: draft.image,
            channel_id: draft.channel_id,
            conversation_id: draft.conversation_id,
            parent_message_id: draft.parent_message_id,
            created_at: now,
            updated_at: None,
        })
    }

    /// Reconstitute a message from storage.
    pub fn from_parts(
        id: MessageId,
        draft: MessageDraft,
        created_at: DateTime<Utc>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            workspace_id: draft.workspace_id,
            member_id: draft.member_id,
            body: draft.body,
            image: draft.image,
            channel_id: draft.channel_id,
            conversation_id: draft.conversation_id,
            parent_message_id: draft.parent_message_id,
            created_at,
            updated_at,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    #[inline]
    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    #[inline]
    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    #[inline]
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    #[inline]
    pub fn image(&self) -> Option<StorageId> {
        self.image
    }

    #[inline]
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel_id
    }

    #[inline]
    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }

    #[inline]
    pub fn parent_message_id(&self) -> Option<MessageId> {
        self.parent_message_id
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_authored_by(&self, member_id: MemberId) -> bool {
        self.member_id == member_id
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn edit(&mut self, body: MessageBody, now: DateTime<Utc>) {
        self.body = body;
        self.updated_at = Some(now);
    }
}
