//! WebSocket message types for change notifications
//!
//! Clients subscribe to a workspace (or watch a single order) and receive a
//! `Changed` notice after every successful mutation in that scope. The notice
//! carries no payload beyond identity; clients refetch over REST.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Unknown client message types deserialize to `Unknown`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::responses::ErrorCode;

// =============================================================================
// Client Messages (client → server)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Receive change notices for a workspace the caller belongs to
    SubscribeWorkspace { workspace_id: Uuid },
    UnsubscribeWorkspace { workspace_id: Uuid },
    /// Receive change notices for one pickup order
    WatchOrder { order_id: Uuid },
    UnwatchOrder { order_id: Uuid },
    /// Heartbeat
    Ping,
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server Messages (server → client)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once after the socket is authenticated
    Connected { user_id: Uuid },
    Subscribed { workspace_id: Uuid },
    Unsubscribed { workspace_id: Uuid },
    Watching { order_id: Uuid },
    Changed {
        entity: EntityKind,
        id: Uuid,
        action: ChangeAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace_id: Option<Uuid>,
    },
    Error { code: ErrorCode, message: String },
    Pong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Workspace,
    Member,
    Channel,
    Conversation,
    Message,
    Reaction,
    Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}
