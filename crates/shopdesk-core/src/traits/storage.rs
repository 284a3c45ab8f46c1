// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the durable inbox records.

use async_trait::async_trait;

use crate::error::ShopdeskError;
use crate::notification::{Notification, NotificationDraft, NotificationQuery};
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Conversation, ConversationId, ConversationTouch, Message, MessageQuery, NewMessage,
    NotificationId, UserId,
};

/// Adapter for the structured-record store holding conversations, messages
/// and notifications.
///
/// Writes that return a record only return once the record is durable.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ShopdeskError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ShopdeskError>;

    // --- Conversations ---

    /// Atomic find-or-insert keyed on `customer_id`.
    async fn find_or_create_conversation(
        &self,
        customer_id: UserId,
    ) -> Result<Conversation, ShopdeskError>;

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, ShopdeskError>;

    async fn conversation_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Option<Conversation>, ShopdeskError>;

    /// Applies a touch. Returns `false` when the conversation does not exist.
    async fn touch_conversation(
        &self,
        id: ConversationId,
        touch: &ConversationTouch,
    ) -> Result<bool, ShopdeskError>;

    /// Conversations ordered by most recent activity first.
    async fn list_conversations(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Conversation>, ShopdeskError>;

    // --- Messages ---

    /// Inserts the message and applies `touch` to its conversation in one
    /// transaction. Fails with `NotFound` if the conversation is missing.
    async fn append_message(
        &self,
        message: &NewMessage,
        touch: &ConversationTouch,
    ) -> Result<Message, ShopdeskError>;

    /// Returns a window of messages in ascending id order.
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        query: &MessageQuery,
    ) -> Result<Vec<Message>, ShopdeskError>;

    // --- Notifications ---

    async fn insert_notification(
        &self,
        receiver_id: UserId,
        draft: &NotificationDraft,
    ) -> Result<Notification, ShopdeskError>;

    /// Newest first.
    async fn list_notifications(
        &self,
        receiver_id: UserId,
        query: &NotificationQuery,
    ) -> Result<Vec<Notification>, ShopdeskError>;

    /// Returns whether the row changed. `NotFound` if the notification does
    /// not exist or belongs to someone else.
    async fn mark_notification_read(
        &self,
        receiver_id: UserId,
        id: NotificationId,
    ) -> Result<bool, ShopdeskError>;

    /// Returns the number of rows flipped to read.
    async fn mark_all_notifications_read(&self, receiver_id: UserId)
    -> Result<u64, ShopdeskError>;

    /// Returns the number of rows flipped to read.
    async fn mark_notifications_from_sender_read(
        &self,
        receiver_id: UserId,
        sender_id: UserId,
    ) -> Result<u64, ShopdeskError>;

    async fn unread_count(&self, receiver_id: UserId) -> Result<u64, ShopdeskError>;
}
