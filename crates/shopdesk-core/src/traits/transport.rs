// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for publishing to named pub/sub channels.

use async_trait::async_trait;

use crate::channel::Channel;
use crate::error::ShopdeskError;
use crate::event::BroadcastEvent;
use crate::traits::adapter::PluginAdapter;

/// Publish-to-named-channel primitive supplied by the surrounding system.
///
/// Subscriber authorization is not the transport's concern; the gateway
/// consults the channel gate before attaching a subscriber.
#[async_trait]
pub trait TransportAdapter: PluginAdapter {
    /// Publishes one event on one channel. Having no subscribers is not an error.
    async fn publish(&self, channel: &Channel, event: &BroadcastEvent)
    -> Result<(), ShopdeskError>;
}
