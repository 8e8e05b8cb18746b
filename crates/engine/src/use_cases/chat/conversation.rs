//! Direct-message conversations between two members.

use std::sync::Arc;

use grupa_domain::{Conversation, MemberId, UserId, WorkspaceId};

use super::{Access, ChatError};
use crate::infrastructure::ports::{ClockPort, ConversationRepo, MemberRepo};

pub struct ConversationOps {
    conversations: Arc<dyn ConversationRepo>,
    members: Arc<dyn MemberRepo>,
    access: Access,
    clock: Arc<dyn ClockPort>,
}

impl ConversationOps {
    pub fn new(
        conversations: Arc<dyn ConversationRepo>,
        members: Arc<dyn MemberRepo>,
        access: Access,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            conversations,
            members,
            access,
            clock,
        }
    }

    /// Return the conversation between the caller and `other_member_id`,
    /// creating it on first use. The flag is `true` when it was created.
    pub async fn create_or_get(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
        other_member_id: MemberId,
    ) -> Result<(Conversation, bool), ChatError> {
        let me = self.access.require_member(workspace_id, user_id).await?;
        let other = self
            .members
            .get(other_member_id)
            .await?
            .filter(|m| m.workspace_id == workspace_id)
            .ok_or_else(|| ChatError::not_found("Member", other_member_id))?;

        if let Some(existing) = self
            .conversations
            .find_between(workspace_id, me.id, other.id)
            .await?
        {
            return Ok((existing, false));
        }

        let conversation = Conversation::new(workspace_id, me.id, other.id, self.clock.now());
        self.conversations.save(&conversation).await?;
        tracing::debug!(conversation_id = %conversation.id, workspace_id = %workspace_id, "Conversation created");
        Ok((conversation, true))
    }
}
