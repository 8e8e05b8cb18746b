//! Toggling reactions on messages.

use std::sync::Arc;

use grupa_domain::{MessageId, Reaction, ReactionId, ReactionValue, UserId, WorkspaceId};
use serde::Serialize;

use super::{Access, ChatError};
use crate::infrastructure::ports::{ClockPort, MessageRepo, ReactionRepo, RepoError};

/// Result of a toggle: the reaction that was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionToggle {
    pub id: ReactionId,
    pub added: bool,
    pub message_id: MessageId,
    pub workspace_id: WorkspaceId,
}

pub struct ReactionOps {
    reactions: Arc<dyn ReactionRepo>,
    messages: Arc<dyn MessageRepo>,
    access: Access,
    clock: Arc<dyn ClockPort>,
}

impl ReactionOps {
    pub fn new(
        reactions: Arc<dyn ReactionRepo>,
        messages: Arc<dyn MessageRepo>,
        access: Access,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            reactions,
            messages,
            access,
            clock,
        }
    }

    /// Remove the caller's reaction with this value if present, otherwise
    /// add it.
    pub async fn toggle(
        &self,
        user_id: UserId,
        message_id: MessageId,
        value: String,
    ) -> Result<ReactionToggle, ChatError> {
        let value = ReactionValue::new(value)?;
        let message = self
            .messages
            .get(message_id)
            .await?
            .ok_or_else(|| ChatError::not_found("Message", message_id))?;
        let workspace_id = message.workspace_id();
        let member = self.access.require_member(workspace_id, user_id).await?;

        if let Some(existing) = self.reactions.find(message_id, member.id, &value).await? {
            self.reactions.delete(existing.id).await?;
            return Ok(ReactionToggle {
                id: existing.id,
                added: false,
                message_id,
                workspace_id,
            });
        }

        let reaction = Reaction::new(workspace_id, message_id, member.id, value, self.clock.now());
        self.reactions.save(&reaction).await.map_err(|e| match e {
            RepoError::ConstraintViolation(_) => {
                ChatError::Conflict("Reaction was toggled concurrently".to_string())
            }
            other => other.into(),
        })?;
        Ok(ReactionToggle {
            id: reaction.id,
            added: true,
            message_id,
            workspace_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockMemberRepo, MockMessageRepo, MockReactionRepo};
    use crate::use_cases::chat::test_support::{member, now};
    use grupa_domain::{ChannelId, MemberRole, Message, MessageBody, MessageDraft};
    use mockall::predicate::*;

    fn message(ws: WorkspaceId) -> Message {
        Message::post(
            MessageDraft {
                workspace_id: ws,
                member_id: grupa_domain::MemberId::new(),
                body: MessageBody::new("hi").unwrap(),
                image: None,
                channel_id: Some(ChannelId::new()),
                conversation_id: None,
                parent_message_id: None,
            },
            now(),
        )
        .unwrap()
    }

    fn ops(reactions: MockReactionRepo, message: Message, is_member: bool) -> ReactionOps {
        let mut messages = MockMessageRepo::new();
        messages
            .expect_get()
            .returning(move |_| Ok(Some(message.clone())));
        let mut access = MockMemberRepo::new();
        access.expect_find().returning(move |ws, user| {
            Ok(is_member.then(|| member(ws, user, MemberRole::Member)))
        });
        ReactionOps::new(
            Arc::new(reactions),
            Arc::new(messages),
            Access::new(Arc::new(access)),
            Arc::new(FixedClock(now())),
        )
    }

    #[tokio::test]
    async fn adds_when_absent() {
        let msg = message(WorkspaceId::new());
        let msg_id = msg.id();
        let mut reactions = MockReactionRepo::new();
        reactions.expect_find().returning(|_, _, _| Ok(None));
        reactions
            .expect_save()
            .withf(move |r| r.message_id == msg_id && r.value.as_str() == "🎉")
            .times(1)
            .returning(|_| Ok(()));

        let toggled = ops(reactions, msg, true)
            .toggle(UserId::new(), msg_id, "🎉".into())
            .await
            .unwrap();
        assert!(toggled.added);
    }

    #[tokio::test]
    async fn removes_when_present() {
        let ws = WorkspaceId::new();
        let msg = message(ws);
        let msg_id = msg.id();
        let existing = Reaction::new(
            ws,
            msg_id,
            grupa_domain::MemberId::new(),
            ReactionValue::new("🎉").unwrap(),
            now(),
        );
        let existing_id = existing.id;
        let mut reactions = MockReactionRepo::new();
        reactions
            .expect_find()
            .returning(move |_, _, _| Ok(Some(existing.clone())));
        reactions
            .expect_delete()
            .with(eq(existing_id))
            .times(1)
            .returning(|_| Ok(()));
        reactions.expect_save().never();

        let toggled = ops(reactions, msg, true)
            .toggle(UserId::new(), msg_id, "🎉".into())
            .await
            .unwrap();
        assert!(!toggled.added);
        assert_eq!(toggled.id, existing_id);
    }

    #[tokio::test]
    async fn non_members_cannot_react() {
        let msg = message(WorkspaceId::new());
        let msg_id = msg.id();
        let mut reactions = MockReactionRepo::new();
        reactions.expect_save().never();

        let err = ops(reactions, msg, false)
            .toggle(UserId::new(), msg_id, "🎉".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
    }

    #[tokio::test]
    async fn rejects_blank_value() {
        let msg = message(WorkspaceId::new());
        let err = ops(MockReactionRepo::new(), msg, true)
            .toggle(UserId::new(), MessageId::new(), "  ".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput(_)));
    }
}
