//! WebSocket change feed.
//!
//! A client connects with `/ws?token=...`, then subscribes to workspaces it
//! belongs to or watches individual orders. Every successful mutation in a
//! followed scope arrives as a `Changed` notice.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use grupa_domain::{OrderId, UserId, WorkspaceId};
use grupa_shared::{ClientMessage, ErrorCode, ServerMessage};

use super::http::ApiError;
use super::ApiState;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
pub struct WsAuth {
    token: Option<String>,
}

/// Authenticate, then upgrade. Browsers cannot set headers on a WebSocket
/// handshake, so the session token travels in the query string.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
    Query(auth): Query<WsAuth>,
) -> Result<Response, ApiError> {
    let token = auth
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ApiError::Unauthorized)?;
    let user_id = state.app.use_cases.auth.authenticate(token.trim()).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>, user_id: UserId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = Uuid::new_v4();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);
    state.connections.register(connection_id, user_id, tx.clone());

    tracing::info!(connection_id = %connection_id, user_id = %user_id, "WebSocket connection established");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    send(
        &tx,
        connection_id,
        ServerMessage::Connected {
            user_id: user_id.into(),
        },
    );

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(msg) => {
                    if let Some(response) =
                        handle_message(msg, &state, connection_id, user_id).await
                    {
                        send(&tx, connection_id, response);
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    send(
                        &tx,
                        connection_id,
                        error(ErrorCode::BadRequest, format!("Invalid message format: {}", e)),
                    );
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    state.connections.unregister(connection_id);
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

fn send(tx: &mpsc::Sender<ServerMessage>, connection_id: Uuid, message: ServerMessage) {
    if tx.try_send(message).is_err() {
        tracing::warn!(
            connection_id = %connection_id,
            "Failed to send response, channel full or closed"
        );
    }
}

fn error(code: ErrorCode, message: impl Into<String>) -> ServerMessage {
    ServerMessage::Error {
        code,
        message: message.into(),
    }
}

/// Dispatch a parsed client message.
async fn handle_message(
    msg: ClientMessage,
    state: &ApiState,
    connection_id: Uuid,
    user_id: UserId,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Ping => Some(ServerMessage::Pong),
        ClientMessage::SubscribeWorkspace { workspace_id } => {
            Some(subscribe_workspace(state, connection_id, user_id, workspace_id.into()).await)
        }
        ClientMessage::UnsubscribeWorkspace { workspace_id } => {
            state
                .connections
                .unsubscribe_workspace(connection_id, workspace_id.into());
            Some(ServerMessage::Unsubscribed { workspace_id })
        }
        ClientMessage::WatchOrder { order_id } => {
            Some(watch_order(state, connection_id, order_id.into()).await)
        }
        ClientMessage::UnwatchOrder { order_id } => {
            state.connections.unwatch_order(connection_id, order_id.into());
            None
        }
        ClientMessage::Unknown => Some(error(ErrorCode::BadRequest, "Unknown message type")),
    }
}

async fn subscribe_workspace(
    state: &ApiState,
    connection_id: Uuid,
    user_id: UserId,
    workspace_id: WorkspaceId,
) -> ServerMessage {
    match state
        .app
        .use_cases
        .chat
        .member
        .current(user_id, workspace_id)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error(ErrorCode::Forbidden, "Not a member of this workspace");
        }
        Err(e) => {
            tracing::error!(workspace_id = %workspace_id, error = %e, "Membership lookup failed");
            return error(ErrorCode::InternalError, "Internal error");
        }
    }

    match state.connections.subscribe_workspace(connection_id, workspace_id) {
        Ok(()) => ServerMessage::Subscribed {
            workspace_id: workspace_id.into(),
        },
        Err(e) => error(ErrorCode::NotFound, e.to_string()),
    }
}

async fn watch_order(state: &ApiState, connection_id: Uuid, order_id: OrderId) -> ServerMessage {
    match state.app.use_cases.order.get_by_id(order_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error(ErrorCode::NotFound, "Order not found"),
        Err(e) => {
            tracing::error!(order_id = %order_id, error = %e, "Order lookup failed");
            return error(ErrorCode::InternalError, "Internal error");
        }
    }

    match state.connections.watch_order(connection_id, order_id) {
        Ok(()) => ServerMessage::Watching {
            order_id: order_id.into(),
        },
        Err(e) => error(ErrorCode::NotFound, e.to_string()),
    }
}
