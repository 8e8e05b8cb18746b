//! Connection management for WebSocket clients.
//!
//! Tracks authenticated sockets and the workspaces and orders each one
//! follows, and fans change notices out to them.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use grupa_domain::{OrderId, UserId, WorkspaceId};
use grupa_shared::ServerMessage;

/// Information about a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Unique ID for this connection
    pub connection_id: Uuid,
    /// The signed-in user behind the socket
    pub user_id: UserId,
    pub workspaces: HashSet<WorkspaceId>,
    pub orders: HashSet<OrderId>,
}

impl ConnectionInfo {
    fn new(connection_id: Uuid, user_id: UserId) -> Self {
        Self {
            connection_id,
            user_id,
            workspaces: HashSet::new(),
            orders: HashSet::new(),
        }
    }
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    /// Map of connection_id -> (ConnectionInfo, sender channel)
    connections: DashMap<Uuid, (ConnectionInfo, mpsc::Sender<ServerMessage>)>,
}

pub type SharedConnectionManager = Arc<ConnectionManager>;

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection.
    pub fn register(
        &self,
        connection_id: Uuid,
        user_id: UserId,
        sender: mpsc::Sender<ServerMessage>,
    ) {
        self.connections
            .insert(connection_id, (ConnectionInfo::new(connection_id, user_id), sender));
        tracing::debug!(connection_id = %connection_id, user_id = %user_id, "Connection registered");
    }

    /// Unregister a connection.
    pub fn unregister(&self, connection_id: Uuid) {
        if self.connections.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    pub fn get(&self, connection_id: Uuid) -> Option<ConnectionInfo> {
        self.connections
            .get(&connection_id)
            .map(|entry| entry.0.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn subscribe_workspace(
        &self,
        connection_id: Uuid,
        workspace_id: WorkspaceId,
    ) -> Result<(), ConnectionError> {
        let mut entry = self
            .connections
            .get_mut(&connection_id)
            .ok_or(ConnectionError::NotFound)?;
        entry.0.workspaces.insert(workspace_id);
        tracing::debug!(connection_id = %connection_id, workspace_id = %workspace_id, "Subscribed to workspace");
        Ok(())
    }

    pub fn unsubscribe_workspace(&self, connection_id: Uuid, workspace_id: WorkspaceId) {
        if let Some(mut entry) = self.connections.get_mut(&connection_id) {
            entry.0.workspaces.remove(&workspace_id);
        }
    }

    /// Stop a user's sockets from following a workspace they no longer
    /// belong to.
    pub fn drop_user_from_workspace(&self, user_id: UserId, workspace_id: WorkspaceId) {
        for mut entry in self.connections.iter_mut() {
            if entry.0.user_id == user_id {
                entry.0.workspaces.remove(&workspace_id);
            }
        }
    }

    /// Forget a deleted workspace on every socket.
    pub fn drop_workspace(&self, workspace_id: WorkspaceId) {
        for mut entry in self.connections.iter_mut() {
            entry.0.workspaces.remove(&workspace_id);
        }
    }

    pub fn watch_order(&self, connection_id: Uuid, order_id: OrderId) -> Result<(), ConnectionError> {
        let mut entry = self
            .connections
            .get_mut(&connection_id)
            .ok_or(ConnectionError::NotFound)?;
        entry.0.orders.insert(order_id);
        Ok(())
    }

    pub fn unwatch_order(&self, connection_id: Uuid, order_id: OrderId) {
        if let Some(mut entry) = self.connections.get_mut(&connection_id) {
            entry.0.orders.remove(&order_id);
        }
    }

    /// Broadcast a message to every connection following a workspace.
    pub fn broadcast_to_workspace(&self, workspace_id: WorkspaceId, message: ServerMessage) {
        self.broadcast(
            |info| info.workspaces.contains(&workspace_id),
            message,
            "workspace",
        );
    }

    /// Broadcast a message to every connection watching an order.
    pub fn broadcast_to_order(&self, order_id: OrderId, message: ServerMessage) {
        self.broadcast(|info| info.orders.contains(&order_id), message, "order");
    }

    fn broadcast(
        &self,
        wants: impl Fn(&ConnectionInfo) -> bool,
        message: ServerMessage,
        scope: &'static str,
    ) {
        for entry in self.connections.iter() {
            let (info, sender) = entry.value();
            if !wants(info) {
                continue;
            }
            if let Err(e) = sender.try_send(message.clone()) {
                tracing::warn!(
                    connection_id = %info.connection_id,
                    scope,
                    error = %e,
                    "Failed to broadcast message"
                );
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during connection operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    #[error("Connection not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use grupa_shared::{ChangeAction, EntityKind};

    fn changed(id: Uuid) -> ServerMessage {
        ServerMessage::Changed {
            entity: EntityKind::Message,
            id,
            action: ChangeAction::Created,
            workspace_id: None,
        }
    }

    #[test]
    fn workspace_broadcast_reaches_only_subscribers() {
        let manager = ConnectionManager::new();
        let ws = WorkspaceId::new();
        let (tx_in, mut rx_in) = mpsc::channel(4);
        let (tx_out, mut rx_out) = mpsc::channel(4);
        let subscribed = Uuid::new_v4();
        let other = Uuid::new_v4();
        manager.register(subscribed, UserId::new(), tx_in);
        manager.register(other, UserId::new(), tx_out);
        manager.subscribe_workspace(subscribed, ws).unwrap();

        let id = Uuid::new_v4();
        manager.broadcast_to_workspace(ws, changed(id));

        assert_eq!(rx_in.try_recv().unwrap(), changed(id));
        assert!(rx_out.try_recv().is_err());
    }

    #[test]
    fn dropping_a_user_stops_their_notices() {
        let manager = ConnectionManager::new();
        let ws = WorkspaceId::new();
        let user = UserId::new();
        let (tx, mut rx) = mpsc::channel(4);
        let conn = Uuid::new_v4();
        manager.register(conn, user, tx);
        manager.subscribe_workspace(conn, ws).unwrap();

        manager.drop_user_from_workspace(user, ws);
        manager.broadcast_to_workspace(ws, changed(Uuid::new_v4()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn order_watchers_receive_notices() {
        let manager = ConnectionManager::new();
        let order = OrderId::new();
        let (tx, mut rx) = mpsc::channel(4);
        let conn = Uuid::new_v4();
        manager.register(conn, UserId::new(), tx);
        manager.watch_order(conn, order).unwrap();

        manager.broadcast_to_order(order, changed(order.to_uuid()));
        assert!(rx.try_recv().is_ok());

        manager.unwatch_order(conn, order);
        manager.broadcast_to_order(order, changed(order.to_uuid()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_connection_cannot_subscribe() {
        let manager = ConnectionManager::new();
        assert!(manager
            .subscribe_workspace(Uuid::new_v4(), WorkspaceId::new())
            .is_err());
        manager.unregister(Uuid::new_v4());
        assert!(manager.is_empty());
    }
}
