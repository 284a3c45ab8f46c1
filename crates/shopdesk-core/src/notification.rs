// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification records and their typed payloads.
//!
//! The payload is a tagged union keyed by notification type, so each known
//! subtype has a checked shape. `Walkin`, `Vip` and `System` carry free-form
//! JSON.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{ConversationId, MessageId, NotificationId, UserId};

/// Notification category, persisted in the `type` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    Order,
    Proposal,
    Message,
    Customization,
    Voucher,
    Review,
    Walkin,
    Vip,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotice {
    pub order_id: i64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalNotice {
    pub proposal_id: i64,
    #[serde(default)]
    pub customization_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageNotice {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub customer_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationNotice {
    pub customization_id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherNotice {
    pub voucher_id: i64,
    #[serde(default)]
    pub code: Option<String>,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewNotice {
    pub review_id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub rating: Option<u8>,
}

/// Type-specific notification data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    Order(OrderNotice),
    Proposal(ProposalNotice),
    Message(MessageNotice),
    Customization(CustomizationNotice),
    Voucher(VoucherNotice),
    Review(ReviewNotice),
    Walkin(Option<serde_json::Value>),
    Vip(Option<serde_json::Value>),
    System(Option<serde_json::Value>),
}

impl NotificationPayload {
    pub fn kind(&self) -> NotificationType {
        match self {
            Self::Order(_) => NotificationType::Order,
            Self::Proposal(_) => NotificationType::Proposal,
            Self::Message(_) => NotificationType::Message,
            Self::Customization(_) => NotificationType::Customization,
            Self::Voucher(_) => NotificationType::Voucher,
            Self::Review(_) => NotificationType::Review,
            Self::Walkin(_) => NotificationType::Walkin,
            Self::Vip(_) => NotificationType::Vip,
            Self::System(_) => NotificationType::System,
        }
    }
}

/// A notification addressed to exactly one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    /// `None` for system-generated notifications.
    pub sender_id: Option<UserId>,
    pub receiver_id: UserId,
    pub title: String,
    pub body: String,
    #[serde(flatten)]
    pub payload: NotificationPayload,
    pub is_read: bool,
    pub created_at: String,
}

impl Notification {
    pub fn kind(&self) -> NotificationType {
        self.payload.kind()
    }
}

/// Recipient-independent notification content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDraft {
    #[serde(default)]
    pub sender_id: Option<UserId>,
    pub title: String,
    pub body: String,
    #[serde(flatten)]
    pub payload: NotificationPayload,
}

/// Filter for listing a recipient's notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationQuery {
    pub limit: u32,
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_type_tag() {
        let payload = NotificationPayload::Message(MessageNotice {
            conversation_id: ConversationId(42),
            message_id: MessageId(7),
            customer_id: UserId(1001),
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["data"]["conversation_id"], 42);
        assert_eq!(payload.kind(), NotificationType::Message);
    }

    #[test]
    fn system_payload_accepts_missing_data() {
        let payload: NotificationPayload = serde_json::from_str(r#"{"type":"system"}"#).unwrap();
        assert_eq!(payload, NotificationPayload::System(None));
    }

    #[test]
    fn notification_flattens_payload() {
        let n = Notification {
            id: NotificationId(1),
            sender_id: None,
            receiver_id: UserId(3),
            title: "Voucher expired".into(),
            body: "SUMMER10 is no longer valid".into(),
            payload: NotificationPayload::Voucher(VoucherNotice {
                voucher_id: 9,
                code: Some("SUMMER10".into()),
                state: "expired".into(),
            }),
            is_read: false,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "voucher");
        assert_eq!(json["data"]["state"], "expired");
        assert!(json["sender_id"].is_null());
    }

    #[test]
    fn notification_type_string_forms() {
        use std::str::FromStr;
        assert_eq!(NotificationType::Walkin.to_string(), "walkin");
        assert_eq!(
            NotificationType::from_str("customization").unwrap(),
            NotificationType::Customization
        );
    }
}
