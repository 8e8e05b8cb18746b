//! Channel entity - a named message stream inside a workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ChannelName;
use crate::{ChannelId, WorkspaceId};

/// Name given to the channel every new workspace starts with.
pub const DEFAULT_CHANNEL_NAME: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub workspace_id: WorkspaceId,
    pub name: ChannelName,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(workspace_id: WorkspaceId, name: ChannelName, now: DateTime<Utc>) -> Self {
        Self {
            id: ChannelId::new(),
            workspace_id,
            name,
            created_at: now,
        }
    }
}
