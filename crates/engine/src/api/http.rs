//! HTTP routes.
//!
//! Handlers stay thin: extract, call one use case, publish a change notice
//! for mutations, serialize the result.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use grupa_domain::{
    Channel, ChannelId, Conversation, Member, MemberId, MemberRole, Message, MessageId, OrderId,
    Page, PageRequest, StorageId, User, UserId, Workspace, WorkspaceId,
};
use grupa_shared::{
    ChangeAction, CreateChannelBody, CreateConversationBody, CreateMessageBody, CreateOrderBody,
    CreateWorkspaceBody, EntityKind, ErrorBody, ErrorCode, JoinWorkspaceBody, ListMessagesQuery,
    RequestCodeBody, ServerMessage, ToggleReactionBody, UpdateChannelBody, UpdateMemberBody,
    UpdateMessageBody, UpdateWorkspaceBody, VerifyCodeBody,
};

use super::ApiState;
use crate::infrastructure::ports::RepoError;
use crate::use_cases::chat::{
    JoinCodeMatch, MemberWithUser, MessageListItem, MessageListScope, MessageView, NewMessage,
    ReactionToggle, WorkspaceInfo,
};
use crate::use_cases::upload::{image_url, is_image_content_type};
use crate::use_cases::{
    AuthError, AuthSession, ChatError, OrderError, OrderView, UploadError,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Create all HTTP routes.
pub fn routes(max_upload_bytes: usize) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        // Auth
        .route("/api/auth/code", post(request_code))
        .route("/api/auth/verify", post(verify_code))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/users/me", get(current_user))
        // Workspaces
        .route("/api/workspaces", get(list_workspaces).post(create_workspace))
        .route(
            "/api/workspaces/{id}",
            get(get_workspace)
                .patch(update_workspace)
                .delete(remove_workspace),
        )
        .route("/api/workspaces/{id}/info", get(workspace_info))
        .route("/api/workspaces/{id}/join-code", post(new_join_code))
        .route("/api/workspaces/{id}/join", post(join_workspace))
        .route("/api/join-codes/{code}", get(verify_join_code))
        // Members
        .route("/api/workspaces/{id}/members", get(list_members))
        .route("/api/workspaces/{id}/members/current", get(current_member))
        .route(
            "/api/members/{id}",
            get(get_member).patch(update_member).delete(remove_member),
        )
        // Channels and conversations
        .route(
            "/api/workspaces/{id}/channels",
            get(list_channels).post(create_channel),
        )
        .route(
            "/api/channels/{id}",
            get(get_channel).patch(update_channel).delete(remove_channel),
        )
        .route("/api/workspaces/{id}/conversations", post(create_conversation))
        // Messages and reactions
        .route("/api/messages", get(list_messages).post(create_message))
        .route(
            "/api/messages/{id}",
            get(get_message).patch(update_message).delete(remove_message),
        )
        .route("/api/messages/{id}/reactions", post(toggle_reaction))
        // Uploads
        .route(
            "/api/uploads",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/uploads/{id}", get(download))
        // Orders
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/by-code/{code}", get(get_order_by_code))
        .route("/api/orders/{id}/close", post(close_order))
        .route("/api/orders/{id}/ready", post(mark_order_ready))
        .route("/api/orders/{id}/delivered", post(mark_order_delivered))
        .route("/api/orders/{id}/sound-off", post(turn_off_order_sound))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Authentication extractors
// =============================================================================

/// Raw bearer token from the `Authorization` header.
pub struct BearerToken(pub String);

/// Signed-in caller. Rejects with 401 when the token is missing or invalid.
pub struct AuthUser(pub UserId);

/// Signed-in caller if there is one.
pub struct MaybeAuthUser(pub Option<UserId>);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequestParts<Arc<ApiState>> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        bearer_token(parts).map(Self).ok_or(ApiError::Unauthorized)
    }
}

impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let user_id = state.app.use_cases.auth.authenticate(&token).await?;
        Ok(Self(user_id))
    }
}

impl FromRequestParts<Arc<ApiState>> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.app.use_cases.auth.authenticate(&token).await {
            Ok(user_id) => Ok(Self(Some(user_id))),
            Err(AuthError::Unauthenticated) => Ok(Self(None)),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Change notices
// =============================================================================

fn publish(
    state: &ApiState,
    workspace_id: WorkspaceId,
    entity: EntityKind,
    id: impl Into<Uuid>,
    action: ChangeAction,
) {
    state.connections.broadcast_to_workspace(
        workspace_id,
        ServerMessage::Changed {
            entity,
            id: id.into(),
            action,
            workspace_id: Some(workspace_id.into()),
        },
    );
}

fn publish_order(state: &ApiState, order_id: OrderId) {
    state.connections.broadcast_to_order(
        order_id,
        ServerMessage::Changed {
            entity: EntityKind::Order,
            id: order_id.into(),
            action: ChangeAction::Updated,
            workspace_id: None,
        },
    );
}

// =============================================================================
// Auth
// =============================================================================

async fn request_code(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<RequestCodeBody>,
) -> Result<StatusCode, ApiError> {
    state.app.use_cases.auth.request_code(&body.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_code(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<VerifyCodeBody>,
) -> ApiResult<AuthSession> {
    let session = state
        .app
        .use_cases
        .auth
        .verify_code(&body.email, &body.code, body.name)
        .await?;
    Ok(Json(session))
}

async fn sign_out(
    State(state): State<Arc<ApiState>>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, ApiError> {
    state.app.use_cases.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_user(
    State(state): State<Arc<ApiState>>,
    MaybeAuthUser(user_id): MaybeAuthUser,
) -> ApiResult<Option<User>> {
    Ok(Json(state.app.use_cases.auth.current_user(user_id).await?))
}

// =============================================================================
// Workspaces
// =============================================================================

async fn list_workspaces(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<Workspace>> {
    Ok(Json(state.app.use_cases.chat.workspace.list(user_id).await?))
}

async fn create_workspace(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateWorkspaceBody>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let workspace = state
        .app
        .use_cases
        .chat
        .workspace
        .create(user_id, body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

async fn get_workspace(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<Workspace>> {
    let workspace = state
        .app
        .use_cases
        .chat
        .workspace
        .get_by_id(user_id, id.into())
        .await?;
    Ok(Json(workspace))
}

async fn update_workspace(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateWorkspaceBody>,
) -> ApiResult<Workspace> {
    let workspace = state
        .app
        .use_cases
        .chat
        .workspace
        .update(user_id, id.into(), body.name)
        .await?;
    publish(&state, workspace.id(), EntityKind::Workspace, workspace.id(), ChangeAction::Updated);
    Ok(Json(workspace))
}

async fn remove_workspace(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let workspace_id = WorkspaceId::from(id);
    state
        .app
        .use_cases
        .chat
        .workspace
        .remove(user_id, workspace_id)
        .await?;
    publish(&state, workspace_id, EntityKind::Workspace, workspace_id, ChangeAction::Deleted);
    state.connections.drop_workspace(workspace_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn workspace_info(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<WorkspaceInfo>> {
    let info = state
        .app
        .use_cases
        .chat
        .workspace
        .get_info(user_id, id.into())
        .await?;
    Ok(Json(info))
}

async fn new_join_code(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Workspace> {
    let workspace = state
        .app
        .use_cases
        .chat
        .workspace
        .new_join_code(user_id, id.into())
        .await?;
    publish(&state, workspace.id(), EntityKind::Workspace, workspace.id(), ChangeAction::Updated);
    Ok(Json(workspace))
}

async fn join_workspace(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<JoinWorkspaceBody>,
) -> ApiResult<Member> {
    let member = state
        .app
        .use_cases
        .chat
        .workspace
        .join(user_id, id.into(), &body.join_code)
        .await?;
    publish(&state, member.workspace_id, EntityKind::Member, member.id, ChangeAction::Created);
    Ok(Json(member))
}

async fn verify_join_code(
    State(state): State<Arc<ApiState>>,
    Path(code): Path<String>,
) -> ApiResult<Option<JoinCodeMatch>> {
    let found = state
        .app
        .use_cases
        .chat
        .workspace
        .verify_join_code(&code)
        .await?;
    Ok(Json(found))
}

// =============================================================================
// Members
// =============================================================================

async fn list_members(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<MemberWithUser>> {
    let members = state
        .app
        .use_cases
        .chat
        .member
        .list(user_id, id.into())
        .await?;
    Ok(Json(members))
}

async fn current_member(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<Member>> {
    let member = state
        .app
        .use_cases
        .chat
        .member
        .current(user_id, id.into())
        .await?;
    Ok(Json(member))
}

async fn get_member(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<MemberWithUser>> {
    let member = state
        .app
        .use_cases
        .chat
        .member
        .get_by_id(user_id, MemberId::from(id))
        .await?;
    Ok(Json(member))
}

async fn update_member(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMemberBody>,
) -> ApiResult<Member> {
    let role: MemberRole = body
        .role
        .parse()
        .map_err(|e: grupa_domain::DomainError| ApiError::Validation(e.to_string()))?;
    let member = state
        .app
        .use_cases
        .chat
        .member
        .update_role(user_id, id.into(), role)
        .await?;
    publish(&state, member.workspace_id, EntityKind::Member, member.id, ChangeAction::Updated);
    Ok(Json(member))
}

async fn remove_member(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let member = state
        .app
        .use_cases
        .chat
        .member
        .remove(user_id, id.into())
        .await?;
    publish(&state, member.workspace_id, EntityKind::Member, member.id, ChangeAction::Deleted);
    state
        .connections
        .drop_user_from_workspace(member.user_id, member.workspace_id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Channels and conversations
// =============================================================================

async fn list_channels(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Channel>> {
    let channels = state
        .app
        .use_cases
        .chat
        .channel
        .list(user_id, id.into())
        .await?;
    Ok(Json(channels))
}

async fn create_channel(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateChannelBody>,
) -> Result<(StatusCode, Json<Channel>), ApiError> {
    let channel = state
        .app
        .use_cases
        .chat
        .channel
        .create(user_id, id.into(), body.name)
        .await?;
    publish(&state, channel.workspace_id, EntityKind::Channel, channel.id, ChangeAction::Created);
    Ok((StatusCode::CREATED, Json(channel)))
}

async fn get_channel(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<Channel>> {
    let channel = state
        .app
        .use_cases
        .chat
        .channel
        .get_by_id(user_id, ChannelId::from(id))
        .await?;
    Ok(Json(channel))
}

async fn update_channel(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateChannelBody>,
) -> ApiResult<Channel> {
    let channel = state
        .app
        .use_cases
        .chat
        .channel
        .update_name(user_id, id.into(), body.name)
        .await?;
    publish(&state, channel.workspace_id, EntityKind::Channel, channel.id, ChangeAction::Updated);
    Ok(Json(channel))
}

async fn remove_channel(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let channel = state
        .app
        .use_cases
        .chat
        .channel
        .remove(user_id, id.into())
        .await?;
    publish(&state, channel.workspace_id, EntityKind::Channel, channel.id, ChangeAction::Deleted);
    Ok(StatusCode::NO_CONTENT)
}

async fn create_conversation(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateConversationBody>,
) -> Result<(StatusCode, Json<Conversation>), ApiError> {
    let (conversation, created) = state
        .app
        .use_cases
        .chat
        .conversation
        .create_or_get(user_id, id.into(), body.member_id.into())
        .await?;
    if !created {
        return Ok((StatusCode::OK, Json(conversation)));
    }
    publish(
        &state,
        conversation.workspace_id,
        EntityKind::Conversation,
        conversation.id,
        ChangeAction::Created,
    );
    Ok((StatusCode::CREATED, Json(conversation)))
}

// =============================================================================
// Messages and reactions
// =============================================================================

async fn list_messages(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Page<MessageListItem>> {
    let scope = MessageListScope {
        channel_id: query.channel_id.map(Into::into),
        conversation_id: query.conversation_id.map(Into::into),
        parent_message_id: query.parent_message_id.map(Into::into),
    };
    let page = PageRequest {
        cursor: query.cursor,
        num_items: query.num_items,
    };
    let messages = state
        .app
        .use_cases
        .chat
        .message
        .list(user_id, scope, &page)
        .await?;
    Ok(Json(messages))
}

async fn create_message(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateMessageBody>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let input = NewMessage {
        workspace_id: body.workspace_id.into(),
        body: body.body,
        image: body.image.map(StorageId::from),
        channel_id: body.channel_id.map(Into::into),
        conversation_id: body.conversation_id.map(Into::into),
        parent_message_id: body.parent_message_id.map(Into::into),
    };
    let message = state
        .app
        .use_cases
        .chat
        .message
        .create(user_id, input)
        .await?;
    publish(&state, message.workspace_id(), EntityKind::Message, message.id(), ChangeAction::Created);
    Ok((StatusCode::CREATED, Json(message)))
}

async fn get_message(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<MessageView>> {
    let message = state
        .app
        .use_cases
        .chat
        .message
        .get_by_id(user_id, MessageId::from(id))
        .await?;
    Ok(Json(message))
}

async fn update_message(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMessageBody>,
) -> ApiResult<Message> {
    let message = state
        .app
        .use_cases
        .chat
        .message
        .update(user_id, id.into(), body.body)
        .await?;
    publish(&state, message.workspace_id(), EntityKind::Message, message.id(), ChangeAction::Updated);
    Ok(Json(message))
}

async fn remove_message(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let message = state
        .app
        .use_cases
        .chat
        .message
        .remove(user_id, id.into())
        .await?;
    publish(&state, message.workspace_id(), EntityKind::Message, message.id(), ChangeAction::Deleted);
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_reaction(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ToggleReactionBody>,
) -> ApiResult<ReactionToggle> {
    let toggled = state
        .app
        .use_cases
        .chat
        .reaction
        .toggle(user_id, id.into(), body.value)
        .await?;
    let action = if toggled.added {
        ChangeAction::Created
    } else {
        ChangeAction::Deleted
    };
    publish(&state, toggled.workspace_id, EntityKind::Reaction, toggled.id, action);
    Ok(Json(toggled))
}

// =============================================================================
// Uploads
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    storage_id: StorageId,
    url: String,
}

async fn upload(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let storage_id = state
        .app
        .use_cases
        .upload
        .upload(user_id, content_type, &body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            storage_id,
            url: image_url(storage_id),
        }),
    ))
}

async fn download(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let blob = state
        .app
        .use_cases
        .upload
        .download(StorageId::from(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

    // Anything that is not a known image is served as an opaque download.
    let (content_type, disposition) = if is_image_content_type(&blob.content_type) {
        (blob.content_type.as_str(), "inline")
    } else {
        ("application/octet-stream", "attachment")
    };
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static(disposition),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            ),
        ],
        blob.bytes,
    )
        .into_response())
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<OrderView>> {
    Ok(Json(state.app.use_cases.order.list(user_id).await?))
}

async fn create_order(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let order = state
        .app
        .use_cases
        .order
        .create(user_id, body.time_in_minutes, body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Option<OrderView>> {
    Ok(Json(state.app.use_cases.order.get_by_id(id.into()).await?))
}

async fn get_order_by_code(
    State(state): State<Arc<ApiState>>,
    Path(code): Path<String>,
) -> ApiResult<Option<OrderView>> {
    Ok(Json(state.app.use_cases.order.get_by_code(&code).await?))
}

async fn close_order(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderView> {
    let order = state.app.use_cases.order.close(user_id, id.into()).await?;
    publish_order(&state, order.order.id());
    Ok(Json(order))
}

async fn mark_order_ready(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderView> {
    let order = state
        .app
        .use_cases
        .order
        .mark_ready(user_id, id.into())
        .await?;
    publish_order(&state, order.order.id());
    Ok(Json(order))
}

async fn mark_order_delivered(
    State(state): State<Arc<ApiState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderView> {
    let order = state
        .app
        .use_cases
        .order
        .mark_delivered(user_id, id.into())
        .await?;
    publish_order(&state, order.order.id());
    Ok(Json(order))
}

async fn turn_off_order_sound(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderView> {
    let order = state
        .app
        .use_cases
        .order
        .turn_off_sound(OrderId::from(id))
        .await?;
    publish_order(&state, order.order.id());
    Ok(Json(order))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(String),
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(ErrorCode::BadRequest, msg))
            }
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(ErrorCode::ValidationError, msg),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new(ErrorCode::Unauthorized, "Not authenticated"),
            ),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, ErrorBody::new(ErrorCode::Forbidden, msg))
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorBody::new(ErrorCode::NotFound, msg))
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorBody::new(ErrorCode::Conflict, msg))
            }
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody::new(ErrorCode::PayloadTooLarge, msg),
            ),
            ApiError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Upstream service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody::new(ErrorCode::ServiceUnavailable, "Service unavailable"),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(ErrorCode::InternalError, "Internal error"),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{} not found", entity_type))
            }
            ChatError::Forbidden(reason) => ApiError::Forbidden(reason.to_string()),
            ChatError::InvalidInput(msg) => ApiError::Validation(msg),
            ChatError::Conflict(msg) => ApiError::Conflict(msg),
            ChatError::Repo(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidInput(msg) => ApiError::Validation(msg),
            AuthError::InvalidCode => ApiError::BadRequest(e.to_string()),
            AuthError::Unauthenticated => ApiError::Unauthorized,
            AuthError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
            AuthError::Mail(e) => ApiError::Unavailable(e.to_string()),
            AuthError::Repo(e) => e.into(),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => ApiError::NotFound("Order not found".to_string()),
            OrderError::Forbidden => ApiError::Forbidden(e.to_string()),
            OrderError::InvalidInput(msg) => ApiError::Validation(msg),
            OrderError::Conflict(msg) => ApiError::Conflict(msg),
            OrderError::Repo(e) => e.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Empty | UploadError::InvalidInput(_) => {
                ApiError::Validation(e.to_string())
            }
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
            UploadError::Blob(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn chat_errors_map_to_statuses() {
        let cases = [
            (ChatError::not_found("Channel", "x"), StatusCode::NOT_FOUND),
            (ChatError::Forbidden("nope"), StatusCode::FORBIDDEN),
            (ChatError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (ChatError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                ChatError::Repo(RepoError::database("q", "boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).parts().0, status);
        }
    }

    #[test]
    fn internal_details_are_not_returned() {
        let (_, body) = ApiError::Internal("db password leaked".into()).parts();
        assert_eq!(body.code, ErrorCode::InternalError);
        assert_eq!(body.message, "Internal error");
    }

    #[test]
    fn bearer_token_is_read_from_authorization_header() {
        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).as_deref(), Some("abc123"));

        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert!(bearer_token(&parts).is_none());
    }
}
