// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time events published on pub/sub channels.

use serde::{Deserialize, Serialize};

use crate::notification::Notification;
use crate::types::{ConversationId, MessageEnvelope, UserId, UserSummary};

/// Transient typing indicator. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    pub user: Option<UserSummary>,
    /// Clients should drop a `typing.started` older than this.
    pub stale_after_ms: u64,
}

/// An event as delivered to channel subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum BroadcastEvent {
    #[serde(rename = "message.sent")]
    MessageSent(MessageEnvelope),
    #[serde(rename = "typing.started")]
    TypingStarted(TypingPayload),
    #[serde(rename = "typing.stopped")]
    TypingStopped(TypingPayload),
    #[serde(rename = "notification.created")]
    NotificationCreated(Notification),
    #[serde(rename = "notification.unread_count")]
    UnreadCount { count: u64 },
}

impl BroadcastEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageSent(_) => "message.sent",
            Self::TypingStarted(_) => "typing.started",
            Self::TypingStopped(_) => "typing.stopped",
            Self::NotificationCreated(_) => "notification.created",
            Self::UnreadCount { .. } => "notification.unread_count",
        }
    }
}
