use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberBody {
    /// `"admin"` or `"member"`.
    pub role: String,
}

/// Open (or reuse) a direct conversation with another member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationBody {
    pub member_id: Uuid,
}
