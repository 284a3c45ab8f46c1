// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shopdesk_bus::ChannelHub;
use shopdesk_core::{Identity, ShopdeskError, StorageAdapter};
use shopdesk_inbox::InboxService;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws;

/// State behind the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<InboxService>,
    /// Hub that WebSocket subscriptions attach to.
    pub hub: Arc<ChannelHub>,
    /// Storage, for health reporting only.
    pub storage: Arc<dyn StorageAdapter>,
    pub auth: AuthConfig,
    pub health: HealthState,
    /// Map of ws_id -> identity of every open WebSocket.
    pub connections: Arc<DashMap<String, Identity>>,
}

impl GatewayState {
    pub fn new(
        service: Arc<InboxService>,
        hub: Arc<ChannelHub>,
        storage: Arc<dyn StorageAdapter>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            service,
            hub,
            storage,
            auth,
            health: HealthState::default(),
            connections: Arc::new(DashMap::new()),
        }
    }
}

/// Listener address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Assemble every route:
/// - GET /health (public)
/// - /v1/* (identity middleware)
/// - GET /ws (identity from query params during the handshake)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/messages",
            post(handlers::post_message).get(handlers::get_own_messages),
        )
        .route("/v1/conversations", get(handlers::get_conversations))
        .route(
            "/v1/conversations/{id}/messages",
            get(handlers::get_conversation_messages),
        )
        .route(
            "/v1/conversations/{id}/typing/start",
            post(handlers::post_typing_start),
        )
        .route(
            "/v1/conversations/{id}/typing/stop",
            post(handlers::post_typing_stop),
        )
        .route(
            "/v1/conversations/{id}/read",
            post(handlers::post_conversation_read),
        )
        .route("/v1/notifications", get(handlers::get_notifications))
        .route(
            "/v1/notifications/unread-count",
            get(handlers::get_unread_count),
        )
        .route(
            "/v1/notifications/read-all",
            post(handlers::post_notifications_read_all),
        )
        .route(
            "/v1/notifications/dispatch",
            post(handlers::post_dispatch),
        )
        .route(
            "/v1/notifications/{id}/read",
            post(handlers::post_notification_read),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the gateway until `cancel` fires, then drain in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ShopdeskError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ShopdeskError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ShopdeskError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
