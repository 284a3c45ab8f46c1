// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatcher.
//!
//! Each notification is inserted first and then published on the
//! recipient's private `notifications:{id}` feed. A failed publish never
//! undoes the insert. Recipients of role broadcasts are resolved from the
//! directory on every call.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use shopdesk_config::model::NotificationsConfig;
use shopdesk_core::notification::MessageNotice;
use shopdesk_core::{
    BroadcastEvent, Channel, DirectoryAdapter, Message, Notification, NotificationDraft,
    NotificationId, NotificationPayload, NotificationQuery, Role, ShopdeskError, StorageAdapter,
    UserId, UserSummary,
};

use crate::fanout::BroadcastRouter;

/// Result of a read-state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadUpdate {
    /// Notifications flipped from unread to read.
    pub changed: u64,
    /// Recipient's unread count afterwards.
    pub unread: u64,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    storage: Arc<dyn StorageAdapter>,
    directory: Arc<dyn DirectoryAdapter>,
    router: BroadcastRouter,
    config: NotificationsConfig,
}

impl NotificationDispatcher {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        directory: Arc<dyn DirectoryAdapter>,
        router: BroadcastRouter,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            storage,
            directory,
            router,
            config,
        }
    }

    /// Insert one notification and push it to the recipient's feed.
    pub async fn notify(
        &self,
        receiver_id: UserId,
        draft: &NotificationDraft,
    ) -> Result<Notification, ShopdeskError> {
        let notification = self.insert(receiver_id, draft).await?;
        self.publish_created(std::slice::from_ref(&notification)).await;
        Ok(notification)
    }

    /// Notify each recipient. Returns how many inserts succeeded.
    ///
    /// Every insert completes before anything is published, and all feeds
    /// are then published in one concurrent batch.
    pub async fn notify_many(&self, recipients: &[UserId], draft: &NotificationDraft) -> u64 {
        let mut created = Vec::with_capacity(recipients.len());
        for &receiver_id in recipients {
            match self.insert(receiver_id, draft).await {
                Ok(notification) => created.push(notification),
                Err(e) => {
                    warn!(recipient_id = %receiver_id, error = %e, "notification insert failed");
                }
            }
        }
        self.publish_created(&created).await;
        created.len() as u64
    }

    async fn insert(
        &self,
        receiver_id: UserId,
        draft: &NotificationDraft,
    ) -> Result<Notification, ShopdeskError> {
        let notification = self.storage.insert_notification(receiver_id, draft).await?;
        debug!(
            recipient_id = %receiver_id,
            notification_id = %notification.id,
            kind = %notification.kind(),
            "notification stored"
        );
        Ok(notification)
    }

    /// Pushes each notification and its recipient's fresh unread count.
    async fn publish_created(&self, created: &[Notification]) {
        if created.is_empty() {
            return;
        }
        let mut events = Vec::with_capacity(created.len() * 2);
        for notification in created {
            let channel = Channel::Notifications(notification.receiver_id);
            events.push((channel, BroadcastEvent::NotificationCreated(notification.clone())));
            match self.storage.unread_count(notification.receiver_id).await {
                Ok(count) => events.push((channel, BroadcastEvent::UnreadCount { count })),
                Err(e) => {
                    warn!(
                        recipient_id = %notification.receiver_id,
                        error = %e,
                        "unread count unavailable"
                    );
                }
            }
        }
        let _ = self.router.publish_events(&events).await;
    }

    /// Notify every user currently holding `role`.
    pub async fn broadcast_to_role(
        &self,
        role: Role,
        draft: &NotificationDraft,
    ) -> Result<u64, ShopdeskError> {
        self.broadcast_to_roles(&[role], draft).await
    }

    /// Notify every user currently holding any of `roles`.
    pub async fn broadcast_to_roles(
        &self,
        roles: &[Role],
        draft: &NotificationDraft,
    ) -> Result<u64, ShopdeskError> {
        let recipients: Vec<UserId> = self
            .directory
            .users_with_roles(roles)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        let created = self.notify_many(&recipients, draft).await;
        info!(
            roles = ?roles,
            recipients = recipients.len(),
            created,
            "role broadcast dispatched"
        );
        Ok(created)
    }

    /// Tell the whole staff pool about a customer message.
    pub async fn customer_message(
        &self,
        message: &Message,
        customer: Option<&UserSummary>,
    ) -> Result<u64, ShopdeskError> {
        let draft = self.message_draft(message, customer);
        self.broadcast_to_roles(&Role::STAFF, &draft).await
    }

    /// Draft for a staff notification about `message`.
    pub fn message_draft(
        &self,
        message: &Message,
        customer: Option<&UserSummary>,
    ) -> NotificationDraft {
        let title = match customer {
            Some(c) => format!("New message from {}", c.name),
            None => format!("New message from customer #{}", message.sender_id),
        };
        let body = match (&message.body, &message.product) {
            (Some(body), _) => preview(body, self.config.preview_chars),
            (None, Some(product)) => format!("Shared a product: {}", product.name),
            (None, None) => "Sent an image".to_string(),
        };
        NotificationDraft {
            sender_id: Some(message.sender_id),
            title,
            body,
            payload: NotificationPayload::Message(MessageNotice {
                conversation_id: message.conversation_id,
                message_id: message.id,
                customer_id: message.sender_id,
            }),
        }
    }

    /// Newest first. A missing or zero limit uses the configured default.
    pub async fn list(
        &self,
        receiver_id: UserId,
        limit: Option<u32>,
        unread_only: bool,
        max_limit: u32,
    ) -> Result<Vec<Notification>, ShopdeskError> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.config.default_list_limit)
            .min(max_limit.max(1));
        self.storage
            .list_notifications(receiver_id, &NotificationQuery { limit, unread_only })
            .await
    }

    pub async fn unread_count(&self, receiver_id: UserId) -> Result<u64, ShopdeskError> {
        self.storage.unread_count(receiver_id).await
    }

    /// Idempotent: marking an already read notification succeeds with `changed == 0`.
    pub async fn mark_read(
        &self,
        receiver_id: UserId,
        id: NotificationId,
    ) -> Result<ReadUpdate, ShopdeskError> {
        let changed = self.storage.mark_notification_read(receiver_id, id).await?;
        self.after_mutation(receiver_id, u64::from(changed)).await
    }

    pub async fn mark_all_read(&self, receiver_id: UserId) -> Result<ReadUpdate, ShopdeskError> {
        let changed = self.storage.mark_all_notifications_read(receiver_id).await?;
        self.after_mutation(receiver_id, changed).await
    }

    /// Clear every pending notification `sender_id` caused for `receiver_id`.
    pub async fn mark_all_from_sender_read(
        &self,
        receiver_id: UserId,
        sender_id: UserId,
    ) -> Result<ReadUpdate, ShopdeskError> {
        let changed = self
            .storage
            .mark_notifications_from_sender_read(receiver_id, sender_id)
            .await?;
        self.after_mutation(receiver_id, changed).await
    }

    /// The unread count is republished only when something changed.
    async fn after_mutation(
        &self,
        receiver_id: UserId,
        changed: u64,
    ) -> Result<ReadUpdate, ShopdeskError> {
        let unread = if changed > 0 {
            self.publish_unread_count(receiver_id).await
        } else {
            self.storage.unread_count(receiver_id).await?
        };
        Ok(ReadUpdate { changed, unread })
    }

    /// Best effort; a failed count read is logged and reported as zero.
    async fn publish_unread_count(&self, receiver_id: UserId) -> u64 {
        let count = match self.storage.unread_count(receiver_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(recipient_id = %receiver_id, error = %e, "unread count unavailable");
                return 0;
            }
        };
        let _ = self
            .router
            .publish_all(
                &[Channel::Notifications(receiver_id)],
                &BroadcastEvent::UnreadCount { count },
            )
            .await;
        count
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}
