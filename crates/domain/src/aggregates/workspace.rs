//! Workspace aggregate - the top-level tenant that owns members and channels.
//!
//! # Invariants
//!
//! - `name` is always 3-80 characters (enforced by `WorkspaceName`)
//! - `join_code` is always six uppercase alphanumerics (enforced by `JoinCode`)

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::value_objects::{JoinCode, WorkspaceName};
use crate::{UserId, WorkspaceId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    id: WorkspaceId,
    name: WorkspaceName,
    /// The user who created the workspace.
    #[serde(rename = "userId")]
    owner_id: UserId,
    join_code: JoinCode,
    created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(
        name: WorkspaceName,
        owner_id: UserId,
        join_code: JoinCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WorkspaceId::new(),
            name,
            owner_id,
            join_code,
            created_at: now,
        }
    }

    /// Reconstitute a workspace from storage.
    pub fn from_parts(
        id: WorkspaceId,
        name: WorkspaceName,
        owner_id: UserId,
        join_code: JoinCode,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            owner_id,
            join_code,
            created_at,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &WorkspaceName {
        &self.name
    }

    #[inline]
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    #[inline]
    pub fn join_code(&self) -> &JoinCode {
        &self.join_code
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn rename(&mut self, name: WorkspaceName) {
        self.name = name;
    }

    /// Replace the join code, invalidating the previous one.
    pub fn rotate_join_code(&mut self, code: JoinCode) {
        self.join_code = code;
    }

    /// Join codes are compared case-insensitively.
    pub fn accepts_join_code(&self, code: &JoinCode) -> bool {
        &self.join_code == code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn workspace() -> Workspace {
        Workspace::new(
            WorkspaceName::new("Parents").unwrap(),
            UserId::new(),
            JoinCode::parse("ABC123").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn accepts_code_regardless_of_input_case() {
        let ws = workspace();
        assert!(ws.accepts_join_code(&JoinCode::parse("abc123").unwrap()));
        assert!(!ws.accepts_join_code(&JoinCode::parse("ABC124").unwrap()));
    }

    #[test]
    fn rotating_invalidates_old_code() {
        let mut ws = workspace();
        ws.rotate_join_code(JoinCode::parse("ZZZ999").unwrap());
        assert!(!ws.accepts_join_code(&JoinCode::parse("ABC123").unwrap()));
        assert_eq!(ws.join_code().as_str(), "ZZZ999");
    }

    #[test]
    fn serializes_creator_as_user_id() {
        let ws = workspace();
        let json = serde_json::to_value(&ws).unwrap();
        assert_eq!(json["userId"], serde_json::json!(ws.owner_id()));
        assert_eq!(json["joinCode"], "ABC123");
        assert_eq!(json["name"], "Parents");
    }
}
