//! Membership checks that guard every workspace-scoped operation.

use std::sync::Arc;

use grupa_domain::{Member, UserId, WorkspaceId};

use super::ChatError;
use crate::infrastructure::ports::{MemberRepo, RepoError};

#[derive(Clone)]
pub struct Access {
    members: Arc<dyn MemberRepo>,
}

impl Access {
    pub fn new(members: Arc<dyn MemberRepo>) -> Self {
        Self { members }
    }

    /// The caller's member record, if any.
    pub async fn membership(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> Result<Option<Member>, RepoError> {
        self.members.find(workspace_id, user_id).await
    }

    pub async fn require_member(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> Result<Member, ChatError> {
        match self.membership(workspace_id, user_id).await? {
            Some(member) => Ok(member),
            None => {
                tracing::debug!(workspace_id = %workspace_id, user_id = %user_id, "Caller is not a member");
                Err(ChatError::Forbidden("not a member of this workspace"))
            }
        }
    }

    pub async fn require_admin(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> Result<Member, ChatError> {
        let member = self.require_member(workspace_id, user_id).await?;
        if !member.is_admin() {
            tracing::debug!(workspace_id = %workspace_id, user_id = %user_id, "Caller is not an admin");
            return Err(ChatError::Forbidden("admin role required"));
        }
        Ok(member)
    }
}
