// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of persisted messages and transient events to pub/sub channels.
//!
//! Every call here runs after the durable write. Publishing is bounded by a
//! per-channel timeout and never fails the caller: failures are logged and
//! reported back as [`DeliveryStatus::Degraded`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use shopdesk_config::model::BroadcastConfig;
use shopdesk_core::{
    BroadcastEvent, Channel, ConversationId, Message, MessageEnvelope, ShopdeskError,
    TransportAdapter, TypingPayload, UserId,
};

/// Outcome of a best-effort publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Every channel accepted the event.
    Delivered,
    /// The record is saved but these channels did not get the event.
    Degraded { failed_channels: Vec<Channel> },
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered)
    }
}

/// Channels a new message is published on, without duplicates.
///
/// The conversation channel comes first, then the receiver's personal
/// channel, then the sender's when it differs from the receiver.
pub fn message_channels(
    conversation_id: Option<ConversationId>,
    sender_id: UserId,
    receiver_id: UserId,
) -> Vec<Channel> {
    let mut channels = Vec::with_capacity(3);
    if let Some(id) = conversation_id {
        channels.push(Channel::Conversation(id));
    }
    channels.push(Channel::User(receiver_id));
    if sender_id != receiver_id {
        channels.push(Channel::User(sender_id));
    }
    channels
}

/// Publishes events through a [`TransportAdapter`] with bounded waiting.
#[derive(Clone)]
pub struct BroadcastRouter {
    transport: Arc<dyn TransportAdapter>,
    publish_timeout: Duration,
}

impl BroadcastRouter {
    pub fn new(transport: Arc<dyn TransportAdapter>, config: &BroadcastConfig) -> Self {
        Self {
            transport,
            publish_timeout: Duration::from_millis(config.publish_timeout_ms),
        }
    }

    /// Publish one event on one channel, giving up after the configured timeout.
    pub async fn publish(
        &self,
        channel: Channel,
        event: &BroadcastEvent,
    ) -> Result<(), ShopdeskError> {
        match tokio::time::timeout(self.publish_timeout, self.transport.publish(&channel, event))
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ShopdeskError::Broadcast {
                channel: channel.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(ShopdeskError::Broadcast {
                channel: channel.to_string(),
                message: format!("timed out after {:?}", self.publish_timeout),
            }),
        }
    }

    /// Publish `event` once on each channel, concurrently.
    pub async fn publish_all(&self, channels: &[Channel], event: &BroadcastEvent) -> DeliveryStatus {
        let events: Vec<(Channel, BroadcastEvent)> =
            channels.iter().map(|&channel| (channel, event.clone())).collect();
        self.publish_events(&events).await
    }

    /// Publish every `(channel, event)` pair concurrently.
    ///
    /// The whole batch waits at most one publish timeout, however many
    /// pairs it holds.
    pub async fn publish_events(&self, events: &[(Channel, BroadcastEvent)]) -> DeliveryStatus {
        let results = join_all(events.iter().map(|(channel, event)| async move {
            (*channel, event, self.publish(*channel, event).await)
        }))
        .await;

        let mut failed_channels = Vec::new();
        for (channel, event, result) in results {
            if let Err(e) = result {
                warn!(%channel, event = event.name(), error = %e, "broadcast failed");
                if !failed_channels.contains(&channel) {
                    failed_channels.push(channel);
                }
            }
        }

        if failed_channels.is_empty() {
            debug!(events = events.len(), "broadcast delivered");
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Degraded { failed_channels }
        }
    }

    /// Fan a freshly persisted message out to its channel set.
    pub async fn publish_message(&self, envelope: &MessageEnvelope) -> DeliveryStatus {
        let Message {
            conversation_id,
            sender_id,
            receiver_id,
            ..
        } = envelope.message;
        let channels = message_channels(Some(conversation_id), sender_id, receiver_id);
        self.publish_all(&channels, &BroadcastEvent::MessageSent(envelope.clone()))
            .await
    }

    /// Typing indicators go to the conversation channel only.
    pub async fn publish_typing(&self, payload: TypingPayload, started: bool) -> DeliveryStatus {
        let channel = Channel::Conversation(payload.conversation_id);
        let event = if started {
            BroadcastEvent::TypingStarted(payload)
        } else {
            BroadcastEvent::TypingStopped(payload)
        };
        self.publish_all(&[channel], &event).await
    }
}
