//! Posting, editing, deleting and reading messages.
//!
//! Reads return populated views: the author member and user, the image URL
//! and aggregated reactions. Messages whose author member or user no longer
//! exists are left out of reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use grupa_domain::{
    summarize_reactions, ChannelId, ConversationId, Member, MemberId, Message, MessageBody,
    MessageDraft, MessageId, Page, PageRequest, ReactionSummary, StorageId, User, UserId,
    WorkspaceId,
};
use serde::Serialize;

use super::{Access, ChatError};
use crate::infrastructure::ports::{
    BlobStore, ChannelRepo, ClockPort, ConversationRepo, MemberRepo, MessageRepo, MessageScope,
    ReactionRepo, RepoError, UserRepo,
};
use crate::use_cases::upload::{discard_blobs, image_url};

/// Input for [`MessageOps::create`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub workspace_id: WorkspaceId,
    pub body: String,
    pub image: Option<StorageId>,
    pub channel_id: Option<ChannelId>,
    pub conversation_id: Option<ConversationId>,
    pub parent_message_id: Option<MessageId>,
}

/// Placement filter for [`MessageOps::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageListScope {
    pub channel_id: Option<ChannelId>,
    pub conversation_id: Option<ConversationId>,
    pub parent_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub member: Member,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub reactions: Vec<ReactionSummary>,
}

/// A message as shown in a channel, conversation or thread listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListItem {
    #[serde(flatten)]
    pub view: MessageView,
    pub thread_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_timestamp: Option<DateTime<Utc>>,
}

pub struct MessageOps {
    messages: Arc<dyn MessageRepo>,
    members: Arc<dyn MemberRepo>,
    users: Arc<dyn UserRepo>,
    channels: Arc<dyn ChannelRepo>,
    conversations: Arc<dyn ConversationRepo>,
    reactions: Arc<dyn ReactionRepo>,
    access: Access,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn ClockPort>,
}

impl MessageOps {
    pub fn new(
        messages: Arc<dyn MessageRepo>,
        members: Arc<dyn MemberRepo>,
        users: Arc<dyn UserRepo>,
        channels: Arc<dyn ChannelRepo>,
        conversations: Arc<dyn ConversationRepo>,
        reactions: Arc<dyn ReactionRepo>,
        access: Access,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            messages,
            members,
            users,
            channels,
            conversations,
            reactions,
            access,
            blobs,
            clock,
        }
    }

    /// Post a message. A thread reply that names neither a channel nor a
    /// conversation is placed in its parent's conversation.
    pub async fn create(&self, user_id: UserId, input: NewMessage) -> Result<Message, ChatError> {
        let body = MessageBody::new(input.body)?;
        let workspace_id = input.workspace_id;
        let member = self.access.require_member(workspace_id, user_id).await?;

        let mut conversation_id = input.conversation_id;
        if let Some(parent_id) = input.parent_message_id {
            let parent = self.load(parent_id).await?;
            if parent.workspace_id() != workspace_id {
                return Err(ChatError::InvalidInput(
                    "Parent message belongs to another workspace".to_string(),
                ));
            }
            if input.channel_id.is_none() && conversation_id.is_none() {
                conversation_id = parent.conversation_id();
            }
        }

        if let Some(channel_id) = input.channel_id {
            let channel = self
                .channels
                .get(channel_id)
                .await?
                .ok_or_else(|| ChatError::not_found("Channel", channel_id))?;
            if channel.workspace_id != workspace_id {
                return Err(ChatError::InvalidInput(
                    "Channel belongs to another workspace".to_string(),
                ));
            }
        }
        if let Some(conversation_id) = conversation_id {
            let conversation = self
                .conversations
                .get(conversation_id)
                .await?
                .ok_or_else(|| ChatError::not_found("Conversation", conversation_id))?;
            if conversation.workspace_id != workspace_id {
                return Err(ChatError::InvalidInput(
                    "Conversation belongs to another workspace".to_string(),
                ));
            }
        }

        let message = Message::post(
            MessageDraft {
                workspace_id,
                member_id: member.id,
                body,
                image: input.image,
                channel_id: input.channel_id,
                conversation_id,
                parent_message_id: input.parent_message_id,
            },
            self.clock.now(),
        )?;
        self.messages.save(&message).await?;
        tracing::debug!(message_id = %message.id(), workspace_id = %workspace_id, "Message posted");
        Ok(message)
    }

    /// Edit the body of the caller's own message.
    pub async fn update(
        &self,
        user_id: UserId,
        id: MessageId,
        body: String,
    ) -> Result<Message, ChatError> {
        let body = MessageBody::new(body)?;
        let mut message = self.load(id).await?;
        self.require_author(&message, user_id).await?;

        message.edit(body, self.clock.now());
        self.messages.save(&message).await?;
        Ok(message)
    }

    /// Delete the caller's own message with its reactions, replies and images.
    pub async fn remove(&self, user_id: UserId, id: MessageId) -> Result<Message, ChatError> {
        let message = self.load(id).await?;
        self.require_author(&message, user_id).await?;

        let orphaned = self.messages.delete_cascade(id).await?;
        discard_blobs(self.blobs.as_ref(), &orphaned).await;
        tracing::debug!(message_id = %id, images = orphaned.len(), "Message deleted");
        Ok(message)
    }

    pub async fn get_by_id(
        &self,
        user_id: UserId,
        id: MessageId,
    ) -> Result<Option<MessageView>, ChatError> {
        let Some(message) = self.messages.get(id).await? else {
            return Ok(None);
        };
        if self
            .access
            .membership(message.workspace_id(), user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        self.populate(message).await
    }

    /// One page of messages in a channel, conversation or thread, newest
    /// first.
    pub async fn list(
        &self,
        user_id: UserId,
        scope: MessageListScope,
        page: &PageRequest,
    ) -> Result<Page<MessageListItem>, ChatError> {
        let (workspace_id, scope) = self.resolve_scope(scope).await?;
        self.access.require_member(workspace_id, user_id).await?;

        let raw = self
            .messages
            .list_page(scope, page)
            .await
            .map_err(|e| match e {
                RepoError::Serialization(msg) => ChatError::InvalidInput(msg),
                other => other.into(),
            })?;

        let mut items = Vec::with_capacity(raw.page.len());
        for message in raw.page {
            let message_id = message.id();
            let Some(view) = self.populate(message).await? else {
                continue;
            };
            let stats = self.messages.thread_stats(message_id).await?;
            let (thread_image, thread_timestamp) = match stats.last_reply {
                Some(reply) => {
                    let image = self.author_image(reply.member_id()).await?;
                    (image, Some(reply.created_at()))
                }
                None => (None, None),
            };
            items.push(MessageListItem {
                view,
                thread_count: stats.count,
                thread_image,
                thread_timestamp,
            });
        }

        Ok(Page {
            page: items,
            is_done: raw.is_done,
            continue_cursor: raw.continue_cursor,
        })
    }

    /// Work out the workspace and exact placement a listing covers.
    async fn resolve_scope(
        &self,
        scope: MessageListScope,
    ) -> Result<(WorkspaceId, MessageScope), ChatError> {
        let MessageListScope {
            channel_id,
            mut conversation_id,
            parent_message_id,
        } = scope;

        let parent = match parent_message_id {
            Some(id) => Some(self.load(id).await?),
            None => None,
        };
        if channel_id.is_none() && conversation_id.is_none() {
            conversation_id = parent.as_ref().and_then(Message::conversation_id);
        }

        let workspace_id = if let Some(channel_id) = channel_id {
            self.channels
                .get(channel_id)
                .await?
                .ok_or_else(|| ChatError::not_found("Channel", channel_id))?
                .workspace_id
        } else if let Some(conversation_id) = conversation_id {
            self.conversations
                .get(conversation_id)
                .await?
                .ok_or_else(|| ChatError::not_found("Conversation", conversation_id))?
                .workspace_id
        } else if let Some(parent) = &parent {
            parent.workspace_id()
        } else {
            return Err(ChatError::InvalidInput(
                "A channel, conversation or parent message is required".to_string(),
            ));
        };

        Ok((
            workspace_id,
            MessageScope {
                channel_id,
                conversation_id,
                parent_message_id,
            },
        ))
    }

    async fn populate(&self, message: Message) -> Result<Option<MessageView>, ChatError> {
        let Some(member) = self.members.get(message.member_id()).await? else {
            return Ok(None);
        };
        let Some(user) = self.users.get(member.user_id).await? else {
            return Ok(None);
        };
        let reactions = self.reactions.list_for_message(message.id()).await?;

        Ok(Some(MessageView {
            image_url: message.image().map(image_url),
            reactions: summarize_reactions(&reactions),
            message,
            member,
            user,
        }))
    }

    async fn author_image(&self, member_id: MemberId) -> Result<Option<String>, ChatError> {
        let Some(member) = self.members.get(member_id).await? else {
            return Ok(None);
        };
        Ok(self
            .users
            .get(member.user_id)
            .await?
            .and_then(|user| user.image))
    }

    async fn require_author(&self, message: &Message, user_id: UserId) -> Result<(), ChatError> {
        let member = self
            .access
            .require_member(message.workspace_id(), user_id)
            .await?;
        if !message.is_authored_by(member.id) {
            return Err(ChatError::Forbidden("only the author can change a message"));
        }
        Ok(())
    }

    async fn load(&self, id: MessageId) -> Result<Message, ChatError> {
        self.messages
            .get(id)
            .await?
            .ok_or_else(|| ChatError::not_found("Message", id))
    }
}
