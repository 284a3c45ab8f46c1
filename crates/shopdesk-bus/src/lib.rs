// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process pub/sub hub for the Shopdesk real-time channels.
//!
//! Each named [`Channel`] is backed by a `tokio::sync::broadcast` sender that
//! is created on first subscribe and dropped once its last receiver goes away.
//! Publishing to a channel nobody listens on is a successful no-op.
//!
//! The hub does no authorization. Callers attach subscribers only after the
//! channel gate has approved them.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use shopdesk_core::{
    AdapterType, BroadcastEvent, Channel, HealthStatus, PluginAdapter, ShopdeskError,
    TransportAdapter,
};

/// Buffer used when a hub is built with `Default`.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Receiving half handed to a subscriber.
pub type Subscription = broadcast::Receiver<BroadcastEvent>;

/// Registry of live channels.
pub struct ChannelHub {
    capacity: usize,
    channels: DashMap<Channel, broadcast::Sender<BroadcastEvent>>,
}

impl ChannelHub {
    /// A hub whose channels each buffer up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: DashMap::new(),
        }
    }

    /// Attach a new subscriber to `channel`, creating it if needed.
    pub fn subscribe(&self, channel: Channel) -> Subscription {
        self.channels
            .entry(channel)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Deliver `event` to every current subscriber of `channel`.
    ///
    /// Returns the number of subscribers that received it.
    pub fn send(&self, channel: Channel, event: BroadcastEvent) -> usize {
        let Some(sender) = self.channels.get(&channel).map(|s| s.clone()) else {
            trace!(%channel, "publish with no subscribers");
            return 0;
        };
        match sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                self.prune(channel);
                0
            }
        }
    }

    /// Drop `channel` if no receivers remain.
    pub fn prune(&self, channel: Channel) {
        if self
            .channels
            .remove_if(&channel, |_, sender| sender.receiver_count() == 0)
            .is_some()
        {
            debug!(%channel, "channel dropped");
        }
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.channels
            .get(&channel)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    /// Number of channels currently tracked.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl PluginAdapter for ChannelHub {
    fn name(&self) -> &str {
        "in-process"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, ShopdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ShopdeskError> {
        // Dropping the senders ends every subscriber stream.
        self.channels.clear();
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for ChannelHub {
    async fn publish(
        &self,
        channel: &Channel,
        event: &BroadcastEvent,
    ) -> Result<(), ShopdeskError> {
        self.send(*channel, event.clone());
        Ok(())
    }
}
