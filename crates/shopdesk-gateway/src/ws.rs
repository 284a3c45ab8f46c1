// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket handler for channel subscriptions.
//!
//! Identity comes from the `token`, `user_id` and `role` query parameters,
//! checked once during the handshake. Every subscribe is checked again by
//! the channel gate.
//!
//! Client -> Server (JSON):
//! ```json
//! {"action": "subscribe", "channel": "conversation:42"}
//! {"action": "unsubscribe", "channel": "conversation:42"}
//! {"action": "ping"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"type": "subscribed", "channel": "conversation:42"}
//! {"type": "denied", "channel": "conversation:42", "reason": "..."}
//! {"type": "event", "channel": "conversation:42", "event": "message.sent", "payload": {...}}
//! {"type": "pong"}
//! ```

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shopdesk_bus::Subscription;
use shopdesk_core::{BroadcastEvent, Channel, Identity};

use crate::server::GatewayState;

/// Handshake credentials.
#[derive(Debug, Default, Deserialize)]
pub struct WsAuthParams {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// WebSocket message from client.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Ping,
}

/// Control frames from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Subscribed { channel: Channel },
    Unsubscribed { channel: Channel },
    Denied { channel: String, reason: String },
    Pong,
    Error { message: String },
}

/// A published event as relayed to one subscriber.
#[derive(Serialize)]
struct EventFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    channel: Channel,
    #[serde(flatten)]
    event: &'a BroadcastEvent,
}

pub fn event_frame(channel: Channel, event: &BroadcastEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EventFrame {
        kind: "event",
        channel,
        event,
    })
}

/// WebSocket upgrade handler.
///
/// Rejects the handshake with 401 when the credentials do not resolve.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    State(state): State<GatewayState>,
) -> Response {
    let identity = state.auth.authenticate(
        params.token.as_deref(),
        params.user_id.as_deref(),
        params.role.as_deref(),
    );
    match identity {
        Some(identity) => ws.on_upgrade(move |socket| handle_socket(socket, state, identity)),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Handle an individual WebSocket connection.
///
/// A sender task drains an mpsc queue into the socket; each subscription
/// runs its own task feeding that queue from the hub.
async fn handle_socket(socket: WebSocket, state: GatewayState, identity: Identity) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let ws_id = uuid::Uuid::new_v4().to_string();
    state.connections.insert(ws_id.clone(), identity);
    tracing::debug!(%ws_id, user_id = %identity.user_id, "websocket connected");

    let (tx, mut rx) = mpsc::channel::<String>(64);
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = WsSession::new(identity, state.clone(), tx);
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let text_str: &str = &text;
                session.handle_text(text_str).await;
            }
            Message::Close(_) => break,
            _ => {} // Ignore binary, ping (handled by tungstenite layer)
        }
    }

    // Cleanup.
    session.close().await;
    state.connections.remove(&ws_id);
    sender_task.abort();
    tracing::debug!(%ws_id, "websocket closed");
}

/// Subscription state of one connection.
pub struct WsSession {
    identity: Identity,
    state: GatewayState,
    out: mpsc::Sender<String>,
    subscriptions: HashMap<Channel, JoinHandle<()>>,
}

impl WsSession {
    pub fn new(identity: Identity, state: GatewayState, out: mpsc::Sender<String>) -> Self {
        Self {
            identity,
            state,
            out,
            subscriptions: HashMap::new(),
        }
    }

    pub fn is_subscribed(&self, channel: &Channel) -> bool {
        self.subscriptions.contains_key(channel)
    }

    pub async fn handle_text(&mut self, text: &str) {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("invalid WebSocket message: {e}");
                self.reply(ServerFrame::Error {
                    message: format!("invalid message: {e}"),
                })
                .await;
                return;
            }
        };
        match frame {
            ClientFrame::Subscribe { channel } => self.subscribe(channel).await,
            ClientFrame::Unsubscribe { channel } => self.unsubscribe(channel).await,
            ClientFrame::Ping => self.reply(ServerFrame::Pong).await,
        }
    }

    async fn subscribe(&mut self, raw: String) {
        let channel = match raw.parse::<Channel>() {
            Ok(channel) => channel,
            Err(e) => {
                self.reply(ServerFrame::Denied {
                    channel: raw,
                    reason: e.to_string(),
                })
                .await;
                return;
            }
        };

        match self.state.service.can_subscribe(&self.identity, &channel).await {
            Ok(true) => {
                if !self.is_subscribed(&channel) {
                    let rx = self.state.hub.subscribe(channel);
                    self.subscriptions
                        .insert(channel, forward(channel, rx, self.out.clone()));
                }
                tracing::debug!(%channel, user_id = %self.identity.user_id, "subscribed");
                self.reply(ServerFrame::Subscribed { channel }).await;
            }
            Ok(false) => {
                tracing::info!(%channel, user_id = %self.identity.user_id, "subscription denied");
                self.reply(ServerFrame::Denied {
                    channel: raw,
                    reason: "not permitted".to_string(),
                })
                .await;
            }
            Err(e) => {
                tracing::warn!(%channel, error = %e, "subscription check failed");
                self.reply(ServerFrame::Error {
                    message: format!("could not check {channel}"),
                })
                .await;
            }
        }
    }

    async fn unsubscribe(&mut self, raw: String) {
        let Ok(channel) = raw.parse::<Channel>() else {
            self.reply(ServerFrame::Error {
                message: format!("invalid channel name `{raw}`"),
            })
            .await;
            return;
        };
        if let Some(task) = self.subscriptions.remove(&channel) {
            self.release(channel, task).await;
        }
        self.reply(ServerFrame::Unsubscribed { channel }).await;
    }

    async fn reply(&self, frame: ServerFrame) {
        match serde_json::to_string(&frame) {
            Ok(text) => {
                let _ = self.out.send(text).await;
            }
            Err(e) => tracing::warn!("failed to encode WebSocket frame: {e}"),
        }
    }

    /// Drop every subscription.
    pub async fn close(mut self) {
        let subscriptions: Vec<_> = self.subscriptions.drain().collect();
        for (channel, task) in subscriptions {
            self.release(channel, task).await;
        }
    }

    /// Stops the forwarder and prunes the hub once its receiver is gone.
    async fn release(&self, channel: Channel, task: JoinHandle<()>) {
        task.abort();
        // Resolves only after the task, and with it the receiver, is dropped.
        let _ = task.await;
        self.state.hub.prune(channel);
    }
}

fn forward(channel: Channel, mut rx: Subscription, out: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event_frame(channel, &event) {
                    Ok(text) => {
                        if out.send(text).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(%channel, "failed to encode event: {e}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%channel, skipped, "subscriber lagged");
                    let frame = ServerFrame::Error {
                        message: format!("{skipped} events dropped on {channel}"),
                    };
                    if let Ok(text) = serde_json::to_string(&frame) {
                        if out.send(text).await.is_err() {
                            break;
                        }
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
