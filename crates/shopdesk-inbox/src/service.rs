// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `InboxService`: the identity-aware entry point composing the registry,
//! message store, fan-out router, channel gate and notification dispatcher.
//!
//! Every operation takes the caller's [`Identity`] as resolved by the
//! upstream authentication layer and performs no credential checks itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use shopdesk_config::model::ShopdeskConfig;
use shopdesk_core::{
    Channel, Conversation, ConversationId, ConversationSummary, DirectoryAdapter, Identity,
    Message, MessageEnvelope, MessageQuery, Notification, NotificationDraft, NotificationId, Role,
    ShopdeskError, StorageAdapter, TransportAdapter, TypingPayload, UserId,
};

use crate::fanout::{BroadcastRouter, DeliveryStatus};
use crate::gate::ChannelGate;
use crate::messages::{MessageLimits, MessageStore, SendMessage};
use crate::notify::{NotificationDispatcher, ReadUpdate};
use crate::registry::ConversationRegistry;

/// A persisted message plus what happened after the write.
#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub message: MessageEnvelope,
    pub delivery: DeliveryStatus,
    /// Staff notifications created for a customer message.
    pub notified_staff: u64,
}

/// A customer's own thread.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerHistory {
    /// `None` until the customer sends a first message.
    pub conversation: Option<Conversation>,
    pub messages: Vec<Message>,
}

/// Admin request to notify one user or every holder of a role.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub role: Option<Role>,
    pub notification: NotificationDraft,
}

#[derive(Debug, Clone, Copy)]
struct Paging {
    staff_page_size: u32,
    max_page_size: u32,
}

impl Paging {
    /// A missing or zero limit falls back to `default`, where `None` means
    /// "no limit". Other limits are clamped to `1..=max_page_size`.
    fn clamp(&self, requested: Option<u32>, default: Option<u32>) -> Option<u32> {
        requested
            .filter(|limit| *limit > 0)
            .or(default)
            .map(|limit| limit.clamp(1, self.max_page_size.max(1)))
    }
}

pub struct InboxService {
    registry: ConversationRegistry,
    messages: MessageStore,
    router: BroadcastRouter,
    gate: ChannelGate,
    notifications: NotificationDispatcher,
    directory: Arc<dyn DirectoryAdapter>,
    paging: Paging,
    typing_stale_after_ms: u64,
}

impl InboxService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        directory: Arc<dyn DirectoryAdapter>,
        transport: Arc<dyn TransportAdapter>,
        config: &ShopdeskConfig,
    ) -> Self {
        let router = BroadcastRouter::new(transport, &config.broadcast);
        Self {
            registry: ConversationRegistry::new(storage.clone(), directory.clone()),
            messages: MessageStore::new(
                storage.clone(),
                directory.clone(),
                MessageLimits::from(&config.inbox),
            ),
            gate: ChannelGate::new(storage.clone()),
            notifications: NotificationDispatcher::new(
                storage,
                directory.clone(),
                router.clone(),
                config.notifications.clone(),
            ),
            router,
            directory,
            paging: Paging {
                staff_page_size: config.inbox.staff_page_size,
                max_page_size: config.inbox.max_page_size,
            },
            typing_stale_after_ms: config.inbox.typing_stale_after_ms,
        }
    }

    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    pub fn notifications(&self) -> &NotificationDispatcher {
        &self.notifications
    }

    // --- Messages ---

    /// Persist a message, fan it out, and alert the staff pool when a
    /// customer wrote it.
    ///
    /// Only the conversation lookup and the insert can fail the call.
    /// Publishing and notification problems are reported in the result.
    pub async fn send_message(
        &self,
        sender: &Identity,
        request: SendMessage,
    ) -> Result<SentMessage, ShopdeskError> {
        self.messages.limits().check(&request)?;

        let conversation = self.conversation_for_send(sender, &request).await?;
        let receiver_id = self
            .messages
            .resolve_receiver(sender, &conversation, request.receiver_id)
            .await?;

        let message = self
            .messages
            .append(sender, conversation.id, receiver_id, &request)
            .await
            .inspect_err(|e| {
                if matches!(e, ShopdeskError::Storage { .. }) {
                    error!(conversation_id = %conversation.id, error = %e, "message insert failed");
                }
            })?;
        info!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            sender_id = %message.sender_id,
            receiver_id = %message.receiver_id,
            "message stored"
        );

        let envelope = self.messages.envelope(message).await;
        let delivery = self.router.publish_message(&envelope).await;

        let notified_staff = if sender.is_staff() {
            0
        } else {
            self.notifications
                .customer_message(&envelope.message, envelope.sender.as_ref())
                .await
                .unwrap_or_else(|e| {
                    warn!(message_id = %envelope.message.id, error = %e, "staff notification failed");
                    0
                })
        };

        Ok(SentMessage {
            message: envelope,
            delivery,
            notified_staff,
        })
    }

    async fn conversation_for_send(
        &self,
        sender: &Identity,
        request: &SendMessage,
    ) -> Result<Conversation, ShopdeskError> {
        if !sender.is_staff() {
            return match request.conversation_id {
                Some(id) => {
                    let conversation = self.registry.get(id).await?;
                    if conversation.customer_id != sender.user_id {
                        return Err(ShopdeskError::unauthorized(format!(
                            "conversation {id} belongs to another customer"
                        )));
                    }
                    Ok(conversation)
                }
                None => {
                    if let Some(existing) = self.registry.conversation_for(sender.user_id).await? {
                        return Ok(existing);
                    }
                    // Do not open an empty thread nobody can answer.
                    match request.receiver_id {
                        Some(id) => {
                            self.messages.staff_receiver(id).await?;
                        }
                        None => {
                            if self.directory.first_available_staff().await?.is_none() {
                                return Err(ShopdeskError::validation(
                                    "receiver_id",
                                    "no staff member available",
                                ));
                            }
                        }
                    }
                    self.registry.get_or_create(sender.user_id).await
                }
            };
        }

        match (request.conversation_id, request.receiver_id) {
            (Some(id), _) => self.registry.get(id).await,
            (None, Some(customer_id)) => match self.directory.find_user(customer_id).await? {
                Some(user) if user.role == Role::Customer => {
                    self.registry.get_or_create(customer_id).await
                }
                _ => Err(ShopdeskError::validation(
                    "receiver_id",
                    format!("user {customer_id} is not a known customer"),
                )),
            },
            (None, None) => Err(ShopdeskError::validation(
                "conversation_id",
                "staff must name a conversation or a receiving customer",
            )),
        }
    }

    /// The caller's own thread. Without a limit the whole history is returned.
    pub async fn own_history(
        &self,
        identity: &Identity,
        query: MessageQuery,
    ) -> Result<CustomerHistory, ShopdeskError> {
        if identity.is_staff() {
            return Err(ShopdeskError::unauthorized(
                "staff read threads through the conversation endpoints",
            ));
        }
        let Some(conversation) = self.registry.conversation_for(identity.user_id).await? else {
            return Ok(CustomerHistory {
                conversation: None,
                messages: Vec::new(),
            });
        };
        let query = MessageQuery {
            limit: self.paging.clamp(query.limit, None),
            ..query
        };
        let messages = self.messages.list_since(conversation.id, &query).await?;
        Ok(CustomerHistory {
            conversation: Some(conversation),
            messages,
        })
    }

    /// Paged history of one conversation, `staff_page_size` by default.
    pub async fn conversation_messages(
        &self,
        identity: &Identity,
        conversation_id: ConversationId,
        query: MessageQuery,
    ) -> Result<Vec<Message>, ShopdeskError> {
        self.participant_conversation(identity, conversation_id).await?;
        let query = MessageQuery {
            limit: self
                .paging
                .clamp(query.limit, Some(self.paging.staff_page_size)),
            ..query
        };
        self.messages.list_since(conversation_id, &query).await
    }

    /// Staff or the owning customer; anyone else is unauthorized.
    async fn participant_conversation(
        &self,
        identity: &Identity,
        conversation_id: ConversationId,
    ) -> Result<Conversation, ShopdeskError> {
        let conversation = self.registry.get(conversation_id).await?;
        if identity.is_staff() || conversation.customer_id == identity.user_id {
            Ok(conversation)
        } else {
            Err(ShopdeskError::unauthorized(format!(
                "conversation {conversation_id} belongs to another customer"
            )))
        }
    }

    // --- Typing ---

    /// Fire-and-forget typing indicator on the conversation channel.
    pub async fn typing(
        &self,
        identity: &Identity,
        conversation_id: ConversationId,
        started: bool,
    ) -> Result<(), ShopdeskError> {
        self.participant_conversation(identity, conversation_id)
            .await?;
        let payload = TypingPayload {
            user_id: identity.user_id,
            conversation_id,
            user: self.messages.summary(identity.user_id).await,
            stale_after_ms: self.typing_stale_after_ms,
        };
        let status = self.router.publish_typing(payload, started).await;
        debug!(
            conversation_id = %conversation_id,
            user_id = %identity.user_id,
            started,
            delivered = status.is_delivered(),
            "typing published"
        );
        Ok(())
    }

    // --- Staff inbox ---

    pub async fn inbox(
        &self,
        identity: &Identity,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, ShopdeskError> {
        require_staff(identity)?;
        let limit = self
            .paging
            .clamp(limit, Some(self.paging.staff_page_size))
            .unwrap_or(self.paging.staff_page_size);
        self.registry.list(limit, offset).await
    }

    /// Clear the caller's notifications caused by the conversation's customer.
    pub async fn mark_conversation_read(
        &self,
        identity: &Identity,
        conversation_id: ConversationId,
    ) -> Result<ReadUpdate, ShopdeskError> {
        require_staff(identity)?;
        let conversation = self.registry.get(conversation_id).await?;
        self.notifications
            .mark_all_from_sender_read(identity.user_id, conversation.customer_id)
            .await
    }

    // --- Notifications ---

    pub async fn list_notifications(
        &self,
        identity: &Identity,
        limit: Option<u32>,
        unread_only: bool,
    ) -> Result<Vec<Notification>, ShopdeskError> {
        self.notifications
            .list(identity.user_id, limit, unread_only, self.paging.max_page_size)
            .await
    }

    pub async fn unread_count(&self, identity: &Identity) -> Result<u64, ShopdeskError> {
        self.notifications.unread_count(identity.user_id).await
    }

    pub async fn mark_notification_read(
        &self,
        identity: &Identity,
        id: NotificationId,
    ) -> Result<ReadUpdate, ShopdeskError> {
        self.notifications.mark_read(identity.user_id, id).await
    }

    pub async fn mark_all_notifications_read(
        &self,
        identity: &Identity,
    ) -> Result<ReadUpdate, ShopdeskError> {
        self.notifications.mark_all_read(identity.user_id).await
    }

    /// Admin-only hook for events raised outside the inbox (orders,
    /// proposals, vouchers, ...). Returns the number of notifications created.
    pub async fn dispatch(
        &self,
        identity: &Identity,
        request: DispatchRequest,
    ) -> Result<u64, ShopdeskError> {
        if identity.role != Role::Admin {
            return Err(ShopdeskError::unauthorized("dispatch requires the admin role"));
        }
        if request.notification.title.trim().is_empty() {
            return Err(ShopdeskError::validation("title", "title must not be empty"));
        }
        match (request.user_id, request.role) {
            (Some(user_id), None) => {
                self.notifications
                    .notify(user_id, &request.notification)
                    .await?;
                Ok(1)
            }
            (None, Some(role)) => {
                self.notifications
                    .broadcast_to_role(role, &request.notification)
                    .await
            }
            _ => Err(ShopdeskError::validation(
                "user_id",
                "exactly one of user_id or role is required",
            )),
        }
    }

    // --- Subscriptions ---

    pub async fn can_subscribe(
        &self,
        identity: &Identity,
        channel: &Channel,
    ) -> Result<bool, ShopdeskError> {
        self.gate.authorize(identity, channel).await
    }
}

fn require_staff(identity: &Identity) -> Result<(), ShopdeskError> {
    if identity.is_staff() {
        Ok(())
    } else {
        Err(ShopdeskError::unauthorized("staff role required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_clamps_explicit_limits() {
        let paging = Paging {
            staff_page_size: 20,
            max_page_size: 100,
        };
        assert_eq!(paging.clamp(None, None), None);
        assert_eq!(paging.clamp(None, Some(20)), Some(20));
        assert_eq!(paging.clamp(Some(0), None), None);
        assert_eq!(paging.clamp(Some(0), Some(20)), Some(20));
        assert_eq!(paging.clamp(Some(500), Some(20)), Some(100));
        assert_eq!(paging.clamp(Some(5), Some(20)), Some(5));
    }

    #[test]
    fn dispatch_request_shape() {
        let request: DispatchRequest = serde_json::from_str(
            r#"{
                "role": "clerk",
                "notification": {
                    "title": "Voucher expired",
                    "body": "SUMMER10 is no longer valid",
                    "type": "voucher",
                    "data": {"voucher_id": 9, "state": "expired"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(request.role, Some(Role::Clerk));
        assert!(request.user_id.is_none());
        assert_eq!(
            request.notification.payload.kind(),
            shopdesk_core::NotificationType::Voucher
        );
    }
}
