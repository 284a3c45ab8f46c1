// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Every `/v1` handler receives the caller's [`Identity`] from the auth
//! middleware and delegates to the inbox service.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use shopdesk_core::{
    ConversationId, ConversationSummary, HealthStatus, Identity, Message, MessageId,
    MessageQuery, Notification, NotificationId, PluginAdapter,
};
use shopdesk_inbox::{CustomerHistory, DispatchRequest, ReadUpdate, SendMessage, SentMessage};

use crate::error::ApiError;
use crate::extract::{empty_as_none, ApiJson, ApiPath, ApiQuery};
use crate::server::GatewayState;

/// Query string of the message history endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub after_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub before_id: Option<i64>,
    /// Blank or zero means unset.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u32>,
}

impl From<HistoryParams> for MessageQuery {
    fn from(params: HistoryParams) -> Self {
        MessageQuery {
            after_id: params.after_id.map(MessageId),
            before_id: params.before_id.map(MessageId),
            limit: params.limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
    pub ws_connections: usize,
}

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub conversation_id: ConversationId,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub created: u64,
}

/// GET /health
///
/// 503 when storage reports unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> impl IntoResponse {
    let (status, storage) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => ("ok", "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => ("degraded", format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => ("unhealthy", format!("unhealthy: {reason}")),
        Err(e) => ("unhealthy", format!("unhealthy: {e}")),
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        storage,
        ws_connections: state.connections.len(),
    };
    (code, Json(body))
}

/// POST /v1/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<SendMessage>,
) -> Result<(StatusCode, Json<SentMessage>), ApiError> {
    let sent = state.service.send_message(&identity, body).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}

/// GET /v1/messages
pub async fn get_own_messages(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> Result<Json<CustomerHistory>, ApiError> {
    let history = state.service.own_history(&identity, params.into()).await?;
    Ok(Json(history))
}

/// GET /v1/conversations
pub async fn get_conversations(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ConversationListResponse>, ApiError> {
    let conversations = state
        .service
        .inbox(&identity, params.limit, params.offset)
        .await?;
    Ok(Json(ConversationListResponse { conversations }))
}

/// GET /v1/conversations/{id}/messages
pub async fn get_conversation_messages(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let conversation_id = ConversationId(id);
    let messages = state
        .service
        .conversation_messages(&identity, conversation_id, params.into())
        .await?;
    Ok(Json(MessageListResponse {
        conversation_id,
        messages,
    }))
}

/// POST /v1/conversations/{id}/typing/start
pub async fn post_typing_start(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .typing(&identity, ConversationId(id), true)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/conversations/{id}/typing/stop
pub async fn post_typing_stop(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .typing(&identity, ConversationId(id), false)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/conversations/{id}/read
pub async fn post_conversation_read(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ReadUpdate>, ApiError> {
    let update = state
        .service
        .mark_conversation_read(&identity, ConversationId(id))
        .await?;
    Ok(Json(update))
}

/// GET /v1/notifications
pub async fn get_notifications(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(params): ApiQuery<NotificationParams>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let notifications = state
        .service
        .list_notifications(&identity, params.limit, params.unread_only)
        .await?;
    Ok(Json(NotificationListResponse { notifications }))
}

/// GET /v1/notifications/unread-count
pub async fn get_unread_count(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let count = state.service.unread_count(&identity).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// POST /v1/notifications/{id}/read
pub async fn post_notification_read(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ReadUpdate>, ApiError> {
    let update = state
        .service
        .mark_notification_read(&identity, NotificationId(id))
        .await?;
    Ok(Json(update))
}

/// POST /v1/notifications/read-all
pub async fn post_notifications_read_all(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ReadUpdate>, ApiError> {
    let update = state.service.mark_all_notifications_read(&identity).await?;
    Ok(Json(update))
}

/// POST /v1/notifications/dispatch
pub async fn post_dispatch(
    State(state): State<GatewayState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<DispatchRequest>,
) -> Result<(StatusCode, Json<DispatchResponse>), ApiError> {
    let created = state.service.dispatch(&identity, body).await?;
    Ok((StatusCode::CREATED, Json(DispatchResponse { created })))
}
