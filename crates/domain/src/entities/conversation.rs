//! Direct-message pairing between two members of the same workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConversationId, MemberId, WorkspaceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub workspace_id: WorkspaceId,
    pub member_one_id: MemberId,
    pub member_two_id: MemberId,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        workspace_id: WorkspaceId,
        member_one_id: MemberId,
        member_two_id: MemberId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ConversationId::new(),
            workspace_id,
            member_one_id,
            member_two_id,
            created_at: now,
        }
    }

    pub fn involves(&self, member_id: MemberId) -> bool {
        self.member_one_id == member_id || self.member_two_id == member_id
    }
}
