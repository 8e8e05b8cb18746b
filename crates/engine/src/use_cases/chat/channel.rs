//! Channels inside a workspace.

use std::sync::Arc;

use grupa_domain::{Channel, ChannelId, ChannelName, UserId, WorkspaceId};

use super::{Access, ChatError};
use crate::infrastructure::ports::{BlobStore, ChannelRepo, ClockPort, RepoError};
use crate::use_cases::upload::discard_blobs;

pub struct ChannelOps {
    channels: Arc<dyn ChannelRepo>,
    access: Access,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn ClockPort>,
}

impl ChannelOps {
    pub fn new(
        channels: Arc<dyn ChannelRepo>,
        access: Access,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            channels,
            access,
            blobs,
            clock,
        }
    }

    pub async fn list(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<Channel>, ChatError> {
        if self.access.membership(workspace_id, user_id).await?.is_none() {
            return Ok(Vec::new());
        }
        Ok(self.channels.list_in_workspace(workspace_id).await?)
    }

    pub async fn get_by_id(
        &self,
        user_id: UserId,
        id: ChannelId,
    ) -> Result<Option<Channel>, ChatError> {
        let Some(channel) = self.channels.get(id).await? else {
            return Ok(None);
        };
        if self
            .access
            .membership(channel.workspace_id, user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        Ok(Some(channel))
    }

    pub async fn create(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
        name: String,
    ) -> Result<Channel, ChatError> {
        let name = ChannelName::new(name)?;
        self.access.require_admin(workspace_id, user_id).await?;
        self.ensure_name_free(workspace_id, &name, None).await?;

        let channel = Channel::new(workspace_id, name, self.clock.now());
        self.channels.save(&channel).await.map_err(name_conflict)?;
        tracing::info!(channel_id = %channel.id, workspace_id = %workspace_id, "Channel created");
        Ok(channel)
    }

    pub async fn update_name(
        &self,
        user_id: UserId,
        id: ChannelId,
        name: String,
    ) -> Result<Channel, ChatError> {
        let name = ChannelName::new(name)?;
        let mut channel = self.load(id).await?;
        self.access.require_admin(channel.workspace_id, user_id).await?;
        self.ensure_name_free(channel.workspace_id, &name, Some(id))
            .await?;

        channel.name = name;
        self.channels.save(&channel).await.map_err(name_conflict)?;
        Ok(channel)
    }

    /// Delete the channel and its messages.
    pub async fn remove(&self, user_id: UserId, id: ChannelId) -> Result<Channel, ChatError> {
        let channel = self.load(id).await?;
        self.access.require_admin(channel.workspace_id, user_id).await?;

        let orphaned = self.channels.delete_cascade(id).await?;
        discard_blobs(self.blobs.as_ref(), &orphaned).await;
        tracing::info!(channel_id = %id, images = orphaned.len(), "Channel deleted");
        Ok(channel)
    }

    async fn ensure_name_free(
        &self,
        workspace_id: WorkspaceId,
        name: &ChannelName,
        except: Option<ChannelId>,
    ) -> Result<(), ChatError> {
        match self.channels.find_by_name(workspace_id, name).await? {
            Some(existing) if Some(existing.id) != except => Err(ChatError::Conflict(format!(
                "A channel named '{}' already exists",
                name
            ))),
            _ => Ok(()),
        }
    }

    async fn load(&self, id: ChannelId) -> Result<Channel, ChatError> {
        self.channels
            .get(id)
            .await?
            .ok_or_else(|| ChatError::not_found("Channel", id))
    }
}

fn name_conflict(e: RepoError) -> ChatError {
    match e {
        RepoError::ConstraintViolation(_) => {
            ChatError::Conflict("A channel with this name already exists".to_string())
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockBlobStore, MockChannelRepo, MockMemberRepo};
    use crate::use_cases::chat::test_support::{member, now};
    use grupa_domain::MemberRole;

    fn ops(channels: MockChannelRepo, role: Option<MemberRole>) -> ChannelOps {
        let mut access = MockMemberRepo::new();
        access
            .expect_find()
            .returning(move |ws, user| Ok(role.map(|role| member(ws, user, role))));
        ChannelOps::new(
            Arc::new(channels),
            Access::new(Arc::new(access)),
            Arc::new(MockBlobStore::new()),
            Arc::new(FixedClock(now())),
        )
    }

    fn channel(ws: WorkspaceId, name: &str) -> Channel {
        Channel::new(ws, ChannelName::new(name).unwrap(), now())
    }

    #[tokio::test]
    async fn create_normalises_name() {
        let mut channels = MockChannelRepo::new();
        channels.expect_find_by_name().returning(|_, _| Ok(None));
        channels
            .expect_save()
            .withf(|c| c.name.as_str() == "team-updates")
            .times(1)
            .returning(|_| Ok(()));

        let created = ops(channels, Some(MemberRole::Admin))
            .create(UserId::new(), WorkspaceId::new(), "Team   Updates".into())
            .await
            .unwrap();
        assert_eq!(created.name.as_str(), "team-updates");
    }

    #[tokio::test]
    async fn create_requires_admin() {
        let mut channels = MockChannelRepo::new();
        channels.expect_save().never();
        let err = ops(channels, Some(MemberRole::Member))
            .create(UserId::new(), WorkspaceId::new(), "random".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let mut channels = MockChannelRepo::new();
        channels
            .expect_find_by_name()
            .returning(|ws, name| Ok(Some(channel(ws, name.as_str()))));
        let err = ops(channels, Some(MemberRole::Admin))
            .create(UserId::new(), WorkspaceId::new(), "general".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Conflict(_)));
    }

    #[tokio::test]
    async fn rename_to_own_name_is_allowed() {
        let ws = WorkspaceId::new();
        let existing = channel(ws, "general");
        let id = existing.id;
        let mut channels = MockChannelRepo::new();
        let stored = existing.clone();
        channels
            .expect_get()
            .returning(move |_| Ok(Some(stored.clone())));
        channels
            .expect_find_by_name()
            .returning(move |_, _| Ok(Some(existing.clone())));
        channels.expect_save().times(1).returning(|_| Ok(()));

        let renamed = ops(channels, Some(MemberRole::Admin))
            .update_name(UserId::new(), id, "General".into())
            .await
            .unwrap();
        assert_eq!(renamed.name.as_str(), "general");
    }

    #[tokio::test]
    async fn list_is_empty_for_non_members() {
        let mut channels = MockChannelRepo::new();
        channels.expect_list_in_workspace().never();
        let listed = ops(channels, None)
            .list(UserId::new(), WorkspaceId::new())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
}
