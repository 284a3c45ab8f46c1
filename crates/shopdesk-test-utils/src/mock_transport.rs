// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport adapter for deterministic testing.
//!
//! `MockTransport` implements `TransportAdapter`, captures every successful
//! publish for assertion, and can be told to fail or hang on chosen
//! channels. Successful publishes are optionally forwarded to a real
//! [`ChannelHub`] so subscribers still see them.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use shopdesk_bus::ChannelHub;
use shopdesk_core::{
    AdapterType, BroadcastEvent, Channel, HealthStatus, PluginAdapter, ShopdeskError,
    TransportAdapter,
};

#[derive(Default)]
pub struct MockTransport {
    hub: Option<Arc<ChannelHub>>,
    published: Mutex<Vec<(Channel, BroadcastEvent)>>,
    failing: Mutex<HashSet<Channel>>,
    hanging: Mutex<HashSet<Channel>>,
}

impl MockTransport {
    /// A transport that only records.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that records and then delivers through `hub`.
    pub fn forwarding_to(hub: Arc<ChannelHub>) -> Self {
        Self {
            hub: Some(hub),
            ..Self::default()
        }
    }

    /// Every later publish to `channel` returns an error.
    pub async fn fail_channel(&self, channel: Channel) {
        self.failing.lock().await.insert(channel);
    }

    /// Every later publish to `channel` never completes.
    pub async fn hang_channel(&self, channel: Channel) {
        self.hanging.lock().await.insert(channel);
    }

    /// Clear injected failures and hangs.
    pub async fn heal(&self) {
        self.failing.lock().await.clear();
        self.hanging.lock().await.clear();
    }

    /// All successful publishes, in order.
    pub async fn published(&self) -> Vec<(Channel, BroadcastEvent)> {
        self.published.lock().await.clone()
    }

    /// Successful publishes on one channel, in order.
    pub async fn published_on(&self, channel: Channel) -> Vec<BroadcastEvent> {
        self.published
            .lock()
            .await
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.published.lock().await.clear();
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
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
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for MockTransport {
    async fn publish(
        &self,
        channel: &Channel,
        event: &BroadcastEvent,
    ) -> Result<(), ShopdeskError> {
        if self.hanging.lock().await.contains(channel) {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().await.contains(channel) {
            return Err(ShopdeskError::Broadcast {
                channel: channel.to_string(),
                message: "injected failure".into(),
            });
        }
        self.published.lock().await.push((*channel, event.clone()));
        if let Some(hub) = &self.hub {
            hub.send(*channel, event.clone());
        }
        Ok(())
    }
}
