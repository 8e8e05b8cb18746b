//! Workspace membership: listing, roles and removal.

use std::sync::Arc;

use grupa_domain::{Member, MemberId, MemberRole, User, UserId, WorkspaceId};
use serde::Serialize;

use super::{Access, ChatError};
use crate::infrastructure::ports::{BlobStore, MemberRepo, UserRepo};
use crate::use_cases::upload::discard_blobs;

/// A member record with its user populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: Member,
    pub user: User,
}

pub struct MemberOps {
    members: Arc<dyn MemberRepo>,
    users: Arc<dyn UserRepo>,
    access: Access,
    blobs: Arc<dyn BlobStore>,
}

impl MemberOps {
    pub fn new(
        members: Arc<dyn MemberRepo>,
        users: Arc<dyn UserRepo>,
        access: Access,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            members,
            users,
            access,
            blobs,
        }
    }

    /// Members of the workspace with their users. Empty for non-members.
    pub async fn list(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<MemberWithUser>, ChatError> {
        if self.access.membership(workspace_id, user_id).await?.is_none() {
            return Ok(Vec::new());
        }

        let members = self.members.list_in_workspace(workspace_id).await?;
        let mut populated = Vec::with_capacity(members.len());
        for member in members {
            if let Some(user) = self.users.get(member.user_id).await? {
                populated.push(MemberWithUser { member, user });
            }
        }
        Ok(populated)
    }

    pub async fn get_by_id(
        &self,
        user_id: UserId,
        member_id: MemberId,
    ) -> Result<Option<MemberWithUser>, ChatError> {
        let Some(member) = self.members.get(member_id).await? else {
            return Ok(None);
        };
        if self
            .access
            .membership(member.workspace_id, user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        Ok(self
            .users
            .get(member.user_id)
            .await?
            .map(|user| MemberWithUser { member, user }))
    }

    /// The caller's own member record.
    pub async fn current(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> Result<Option<Member>, ChatError> {
        Ok(self.access.membership(workspace_id, user_id).await?)
    }

    pub async fn update_role(
        &self,
        user_id: UserId,
        member_id: MemberId,
        role: MemberRole,
    ) -> Result<Member, ChatError> {
        let mut member = self.load(member_id).await?;
        self.access.require_admin(member.workspace_id, user_id).await?;

        member.role = role;
        self.members.save(&member).await?;
        tracing::info!(member_id = %member_id, role = %role, "Member role updated");
        Ok(member)
    }

    /// Remove a member together with their messages, reactions and
    /// conversations. Admin members cannot be removed; regular members may
    /// only remove themselves.
    pub async fn remove(&self, user_id: UserId, member_id: MemberId) -> Result<Member, ChatError> {
        let member = self.load(member_id).await?;
        let caller = self.access.require_member(member.workspace_id, user_id).await?;

        if member.is_admin() {
            let reason = if caller.id == member.id {
                "admins cannot remove themselves"
            } else {
                "admin members cannot be removed"
            };
            return Err(ChatError::Forbidden(reason));
        }
        if !caller.is_admin() && caller.id != member.id {
            return Err(ChatError::Forbidden("only admins can remove other members"));
        }

        let orphaned = self.members.delete_cascade(member_id).await?;
        discard_blobs(self.blobs.as_ref(), &orphaned).await;
        tracing::info!(
            member_id = %member_id,
            workspace_id = %member.workspace_id,
            "Member removed"
        );
        Ok(member)
    }

    async fn load(&self, id: MemberId) -> Result<Member, ChatError> {
        self.members
            .get(id)
            .await?
            .ok_or_else(|| ChatError::not_found("Member", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockBlobStore, MockMemberRepo, MockUserRepo};
    use crate::use_cases::chat::test_support::{member, now};
    use grupa_domain::UserProfile;
    use mockall::predicate::*;

    fn ops(members: MockMemberRepo, access: MockMemberRepo, users: MockUserRepo) -> MemberOps {
        let mut blobs = MockBlobStore::new();
        blobs.expect_delete().returning(|_| Ok(()));
        MemberOps::new(
            Arc::new(members),
            Arc::new(users),
            Access::new(Arc::new(access)),
            Arc::new(blobs),
        )
    }

    fn user(id: UserId) -> User {
        let mut user = User::from_profile(UserProfile::default(), now());
        user.id = id;
        user
    }

    #[tokio::test]
    async fn list_is_empty_for_non_members() {
        let mut access = MockMemberRepo::new();
        access.expect_find().returning(|_, _| Ok(None));
        let mut members = MockMemberRepo::new();
        members.expect_list_in_workspace().never();

        let listed = ops(members, access, MockUserRepo::new())
            .list(UserId::new(), WorkspaceId::new())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_skips_members_without_user() {
        let ws = WorkspaceId::new();
        let present = UserId::new();
        let missing = UserId::new();
        let mut access = MockMemberRepo::new();
        access
            .expect_find()
            .returning(|ws, user| Ok(Some(member(ws, user, MemberRole::Member))));
        let mut members = MockMemberRepo::new();
        members.expect_list_in_workspace().returning(move |ws| {
            Ok(vec![
                member(ws, present, MemberRole::Admin),
                member(ws, missing, MemberRole::Member),
            ])
        });
        let mut users = MockUserRepo::new();
        users
            .expect_get()
            .with(eq(present))
            .returning(|id| Ok(Some(user(id))));
        users.expect_get().with(eq(missing)).returning(|_| Ok(None));

        let listed = ops(members, access, users).list(present, ws).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user.id, present);
    }

    #[tokio::test]
    async fn update_role_requires_admin_of_members_workspace() {
        let ws = WorkspaceId::new();
        let target = member(ws, UserId::new(), MemberRole::Member);
        let target_id = target.id;
        let caller = UserId::new();

        let mut members = MockMemberRepo::new();
        members
            .expect_get()
            .with(eq(target_id))
            .returning(move |_| Ok(Some(target.clone())));
        members
            .expect_save()
            .withf(|m| m.role == MemberRole::Admin)
            .times(1)
            .returning(|_| Ok(()));
        let mut access = MockMemberRepo::new();
        access
            .expect_find()
            .with(eq(ws), eq(caller))
            .returning(|ws, user| Ok(Some(member(ws, user, MemberRole::Admin))));

        let updated = ops(members, access, MockUserRepo::new())
            .update_role(caller, target_id, MemberRole::Admin)
            .await
            .unwrap();
        assert!(updated.is_admin());
    }

    #[tokio::test]
    async fn admin_members_cannot_be_removed() {
        let ws = WorkspaceId::new();
        let caller = UserId::new();
        let admin = member(ws, caller, MemberRole::Admin);
        let admin_id = admin.id;

        let mut members = MockMemberRepo::new();
        let stored = admin.clone();
        members
            .expect_get()
            .returning(move |_| Ok(Some(stored.clone())));
        members.expect_delete_cascade().never();
        let mut access = MockMemberRepo::new();
        access
            .expect_find()
            .returning(move |_, _| Ok(Some(admin.clone())));

        let err = ops(members, access, MockUserRepo::new())
            .remove(caller, admin_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden("admins cannot remove themselves")));
    }

    #[tokio::test]
    async fn regular_member_can_leave_but_not_remove_others() {
        let ws = WorkspaceId::new();
        let caller = UserId::new();
        let me = member(ws, caller, MemberRole::Member);
        let other = member(ws, UserId::new(), MemberRole::Member);
        let (me_id, other_id) = (me.id, other.id);

        let mut members = MockMemberRepo::new();
        let stored_me = me.clone();
        members
            .expect_get()
            .with(eq(me_id))
            .returning(move |_| Ok(Some(stored_me.clone())));
        members
            .expect_get()
            .with(eq(other_id))
            .returning(move |_| Ok(Some(other.clone())));
        members
            .expect_delete_cascade()
            .with(eq(me_id))
            .times(1)
            .returning(|_| Ok(vec![]));
        let mut access = MockMemberRepo::new();
        access
            .expect_find()
            .returning(move |_, _| Ok(Some(me.clone())));

        let ops = ops(members, access, MockUserRepo::new());
        let err = ops.remove(caller, other_id).await.unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
        let left = ops.remove(caller, me_id).await.unwrap();
        assert_eq!(left.id, me_id);
    }
}
