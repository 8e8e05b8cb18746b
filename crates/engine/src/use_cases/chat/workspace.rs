//! Workspace lifecycle: creation, join codes, renaming and deletion.

use std::sync::Arc;

use grupa_domain::{
    Channel, ChannelName, JoinCode, Member, MemberRole, UserId, Workspace, WorkspaceId,
    WorkspaceName, DEFAULT_CHANNEL_NAME,
};
use serde::Serialize;

use super::{Access, ChatError};
use crate::infrastructure::ports::{
    pick_index, BlobStore, ClockPort, MemberRepo, RandomPort, RepoError, WorkspaceRepo,
};
use crate::use_cases::upload::discard_blobs;

/// What the join screen shows for a workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    pub name: WorkspaceName,
    pub is_member: bool,
}

/// Workspace owning a join code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCodeMatch {
    pub id: WorkspaceId,
    pub name: WorkspaceName,
}

pub struct WorkspaceOps {
    workspaces: Arc<dyn WorkspaceRepo>,
    members: Arc<dyn MemberRepo>,
    access: Access,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl WorkspaceOps {
    pub fn new(
        workspaces: Arc<dyn WorkspaceRepo>,
        members: Arc<dyn MemberRepo>,
        access: Access,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            workspaces,
            members,
            access,
            blobs,
            clock,
            random,
        }
    }

    /// Workspaces the caller belongs to.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Workspace>, ChatError> {
        Ok(self.workspaces.list_for_user(user_id).await?)
    }

    /// Create a workspace with the caller as its admin and a default channel.
    pub async fn create(&self, user_id: UserId, name: String) -> Result<Workspace, ChatError> {
        let name = WorkspaceName::new(name)?;
        let now = self.clock.now();

        let workspace = Workspace::new(name, user_id, self.generate_join_code(), now);
        let owner = Member::new(workspace.id(), user_id, MemberRole::Admin, now);
        let general = Channel::new(workspace.id(), ChannelName::new(DEFAULT_CHANNEL_NAME)?, now);

        self.workspaces.create(&workspace, &owner, &general).await?;
        tracing::info!(workspace_id = %workspace.id(), user_id = %user_id, "Workspace created");
        Ok(workspace)
    }

    pub async fn get_by_id(
        &self,
        user_id: UserId,
        id: WorkspaceId,
    ) -> Result<Option<Workspace>, ChatError> {
        if self.access.membership(id, user_id).await?.is_none() {
            return Ok(None);
        }
        Ok(self.workspaces.get(id).await?)
    }

    pub async fn get_info(
        &self,
        user_id: UserId,
        id: WorkspaceId,
    ) -> Result<Option<WorkspaceInfo>, ChatError> {
        let Some(workspace) = self.workspaces.get(id).await? else {
            return Ok(None);
        };
        let is_member = self.access.membership(id, user_id).await?.is_some();
        Ok(Some(WorkspaceInfo {
            name: workspace.name().clone(),
            is_member,
        }))
    }

    /// Look up the workspace a join code belongs to. Malformed codes simply
    /// match nothing.
    pub async fn verify_join_code(&self, code: &str) -> Result<Option<JoinCodeMatch>, ChatError> {
        let Ok(code) = JoinCode::parse(code) else {
            return Ok(None);
        };
        Ok(self
            .workspaces
            .find_by_join_code(&code)
            .await?
            .map(|workspace| JoinCodeMatch {
                id: workspace.id(),
                name: workspace.name().clone(),
            }))
    }

    pub async fn update(
        &self,
        user_id: UserId,
        id: WorkspaceId,
        name: String,
    ) -> Result<Workspace, ChatError> {
        let name = WorkspaceName::new(name)?;
        self.access.require_admin(id, user_id).await?;

        let mut workspace = self.load(id).await?;
        workspace.rename(name);
        self.workspaces.save(&workspace).await?;
        Ok(workspace)
    }

    pub async fn new_join_code(
        &self,
        user_id: UserId,
        id: WorkspaceId,
    ) -> Result<Workspace, ChatError> {
        self.access.require_admin(id, user_id).await?;

        let mut workspace = self.load(id).await?;
        workspace.rotate_join_code(self.generate_join_code());
        self.workspaces.save(&workspace).await?;
        tracing::info!(workspace_id = %id, "Join code rotated");
        Ok(workspace)
    }

    /// Join a workspace with its current join code.
    pub async fn join(
        &self,
        user_id: UserId,
        id: WorkspaceId,
        code: &str,
    ) -> Result<Member, ChatError> {
        let code = JoinCode::parse(code)?;
        let workspace = self.load(id).await?;

        if !workspace.accepts_join_code(&code) {
            return Err(ChatError::InvalidInput("Invalid join code".to_string()));
        }
        if self.access.membership(id, user_id).await?.is_some() {
            return Err(ChatError::Conflict(
                "Already a member of this workspace".to_string(),
            ));
        }

        let member = Member::new(id, user_id, MemberRole::Member, self.clock.now());
        self.members.save(&member).await.map_err(|e| match e {
            RepoError::ConstraintViolation(_) => {
                ChatError::Conflict("Already a member of this workspace".to_string())
            }
            other => other.into(),
        })?;
        tracing::info!(workspace_id = %id, user_id = %user_id, "Member joined workspace");
        Ok(member)
    }

    /// Delete the workspace and everything in it.
    pub async fn remove(&self, user_id: UserId, id: WorkspaceId) -> Result<(), ChatError> {
        self.access.require_admin(id, user_id).await?;

        let orphaned = self.workspaces.delete_cascade(id).await?;
        discard_blobs(self.blobs.as_ref(), &orphaned).await;
        tracing::info!(workspace_id = %id, images = orphaned.len(), "Workspace deleted");
        Ok(())
    }

    async fn load(&self, id: WorkspaceId) -> Result<Workspace, ChatError> {
        self.workspaces
            .get(id)
            .await?
            .ok_or_else(|| ChatError::not_found("Workspace", id))
    }

    fn generate_join_code(&self) -> JoinCode {
        JoinCode::generate(pick_index(self.random.as_ref()))
    }
}
