// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store: validation, receiver resolution, append and history windows.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use shopdesk_config::model::InboxConfig;
use shopdesk_core::{
    Conversation, ConversationId, DirectoryAdapter, Identity, Message, MessageEnvelope,
    MessageQuery, NewMessage, ProductReference, ShopdeskError, StorageAdapter, UserId,
    UserSummary,
};

use crate::registry::touch_for;

/// A send request as accepted from a client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendMessage {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub product: Option<ProductReference>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub is_quick_option: bool,
}

impl SendMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    /// Body with surrounding whitespace removed; blank bodies become `None`.
    fn normalized_body(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
    }
}

/// Content limits enforced before anything is written.
#[derive(Debug, Clone, Copy)]
pub struct MessageLimits {
    pub max_body_length: usize,
    pub max_images: usize,
}

impl From<&InboxConfig> for MessageLimits {
    fn from(config: &InboxConfig) -> Self {
        Self {
            max_body_length: config.max_body_length,
            max_images: config.max_images,
        }
    }
}

impl MessageLimits {
    pub fn check(&self, request: &SendMessage) -> Result<(), ShopdeskError> {
        let body = request.normalized_body();
        if body.is_none() && request.product.is_none() && request.image_urls.is_empty() {
            return Err(ShopdeskError::validation(
                "body",
                "a message needs a body, a product or at least one image",
            ));
        }
        if let Some(body) = &body
            && body.chars().count() > self.max_body_length
        {
            return Err(ShopdeskError::validation(
                "body",
                format!("body exceeds {} characters", self.max_body_length),
            ));
        }
        if request.image_urls.len() > self.max_images {
            return Err(ShopdeskError::validation(
                "image_urls",
                format!("at most {} images per message", self.max_images),
            ));
        }
        if request.image_urls.iter().any(|u| u.trim().is_empty()) {
            return Err(ShopdeskError::validation("image_urls", "image url must not be blank"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MessageStore {
    storage: Arc<dyn StorageAdapter>,
    directory: Arc<dyn DirectoryAdapter>,
    limits: MessageLimits,
}

impl MessageStore {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        directory: Arc<dyn DirectoryAdapter>,
        limits: MessageLimits,
    ) -> Self {
        Self {
            storage,
            directory,
            limits,
        }
    }

    pub fn limits(&self) -> MessageLimits {
        self.limits
    }

    /// Pick the receiver of a message `sender` posts into `conversation`.
    ///
    /// Customers reach an explicitly named staff member, else the active
    /// clerk, else the first available staff member. Staff always reach the
    /// conversation's customer.
    pub async fn resolve_receiver(
        &self,
        sender: &Identity,
        conversation: &Conversation,
        explicit: Option<UserId>,
    ) -> Result<UserId, ShopdeskError> {
        if sender.is_staff() {
            return match explicit {
                Some(id) if id != conversation.customer_id => Err(ShopdeskError::validation(
                    "receiver_id",
                    "staff replies are addressed to the conversation's customer",
                )),
                _ => Ok(conversation.customer_id),
            };
        }

        if let Some(id) = explicit {
            return self.staff_receiver(id).await;
        }

        if let Some(clerk) = conversation.active_clerk_id {
            return Ok(clerk);
        }

        self.directory
            .first_available_staff()
            .await?
            .map(|staff| staff.id)
            .ok_or_else(|| ShopdeskError::validation("receiver_id", "no staff member available"))
    }

    /// `id` if it names a staff member a customer may address.
    pub async fn staff_receiver(&self, id: UserId) -> Result<UserId, ShopdeskError> {
        match self.directory.find_user(id).await? {
            Some(user) if user.role.is_staff() => Ok(id),
            _ => Err(ShopdeskError::validation(
                "receiver_id",
                format!("user {id} is not a staff member"),
            )),
        }
    }

    /// Persist a message from `sender` and touch its conversation.
    pub async fn append(
        &self,
        sender: &Identity,
        conversation_id: ConversationId,
        receiver_id: UserId,
        request: &SendMessage,
    ) -> Result<Message, ShopdeskError> {
        self.limits.check(request)?;
        let message = NewMessage {
            conversation_id,
            sender_id: sender.user_id,
            receiver_id,
            body: request.normalized_body(),
            product: request.product.clone(),
            image_urls: request.image_urls.clone(),
            is_quick_option: request.is_quick_option,
        };
        self.storage
            .append_message(&message, &touch_for(Some(sender)))
            .await
    }

    /// Ascending window of a conversation's history.
    pub async fn list_since(
        &self,
        conversation_id: ConversationId,
        query: &MessageQuery,
    ) -> Result<Vec<Message>, ShopdeskError> {
        self.storage.list_messages(conversation_id, query).await
    }

    /// Attach sender and receiver display data.
    ///
    /// Runs after the write has succeeded, so directory errors degrade to a
    /// missing summary instead of failing the send.
    pub async fn envelope(&self, message: Message) -> MessageEnvelope {
        let sender = self.summary(message.sender_id).await;
        let receiver = self.summary(message.receiver_id).await;
        MessageEnvelope {
            message,
            sender,
            receiver,
        }
    }

    pub async fn summary(&self, id: UserId) -> Option<UserSummary> {
        match self.directory.find_user(id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(user_id = %id, error = %e, "directory lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> MessageLimits {
        MessageLimits {
            max_body_length: 10,
            max_images: 2,
        }
    }

    fn field_of(err: ShopdeskError) -> &'static str {
        match err {
            ShopdeskError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_message_rejected() {
        assert_eq!(field_of(limits().check(&SendMessage::default()).unwrap_err()), "body");
        assert_eq!(field_of(limits().check(&SendMessage::text("   ")).unwrap_err()), "body");
    }

    #[test]
    fn image_only_message_accepted() {
        let request = SendMessage {
            image_urls: vec!["https://cdn.example/a.jpg".into()],
            ..Default::default()
        };
        assert!(limits().check(&request).is_ok());
    }

    #[test]
    fn body_length_counts_characters() {
        assert!(limits().check(&SendMessage::text("éééééééééé")).is_ok());
        assert_eq!(
            field_of(limits().check(&SendMessage::text("01234567890")).unwrap_err()),
            "body"
        );
    }

    #[test]
    fn too_many_images_rejected() {
        let request = SendMessage {
            image_urls: vec!["a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        assert_eq!(field_of(limits().check(&request).unwrap_err()), "image_urls");
    }

    #[test]
    fn body_is_trimmed() {
        assert_eq!(
            SendMessage::text("  hi  ").normalized_body().as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn send_request_deserializes_with_defaults() {
        let request: SendMessage = serde_json::from_str(r#"{"body":"Hello"}"#).unwrap();
        assert_eq!(request, SendMessage::text("Hello"));
    }
}
