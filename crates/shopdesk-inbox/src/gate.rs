// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription authorization for pub/sub channels.
//!
//! Any staff identity may follow any conversation or personal channel.
//! Customers may follow only their own. Notification feeds are private to
//! their owner with no staff override.

use std::sync::Arc;

use tracing::debug;

use shopdesk_core::{Channel, Identity, ShopdeskError, StorageAdapter, UserId};

/// Whether `identity` may subscribe to `channel`.
///
/// `conversation_owner` is the `customer_id` of the conversation behind a
/// `conversation:{id}` channel, or `None` when it does not exist. It is
/// ignored for the other channel kinds.
pub fn can_subscribe(
    identity: &Identity,
    channel: &Channel,
    conversation_owner: Option<UserId>,
) -> bool {
    match channel {
        Channel::Conversation(_) => {
            identity.is_staff() || conversation_owner == Some(identity.user_id)
        }
        Channel::User(id) => identity.is_staff() || *id == identity.user_id,
        Channel::Notifications(id) => *id == identity.user_id,
    }
}

/// Evaluates [`can_subscribe`] against current storage state.
///
/// Nothing is cached: roles and ownership are looked up on every attempt.
#[derive(Clone)]
pub struct ChannelGate {
    storage: Arc<dyn StorageAdapter>,
}

impl ChannelGate {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    pub async fn authorize(
        &self,
        identity: &Identity,
        channel: &Channel,
    ) -> Result<bool, ShopdeskError> {
        let owner = match channel {
            Channel::Conversation(id) if !identity.is_staff() => self
                .storage
                .get_conversation(*id)
                .await?
                .map(|c| c.customer_id),
            _ => None,
        };
        let allowed = can_subscribe(identity, channel, owner);
        debug!(
            user_id = %identity.user_id,
            role = %identity.role,
            %channel,
            allowed,
            "subscription check"
        );
        Ok(allowed)
    }
}
