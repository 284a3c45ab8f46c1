// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the inbox services.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a participant (customer or staff) as issued by the auth layer.
    UserId
);
id_type!(
    /// Auto-increment conversation identifier.
    ConversationId
);
id_type!(
    /// Auto-increment message identifier; strictly increasing in creation order.
    MessageId
);
id_type!(
    /// Auto-increment notification identifier.
    NotificationId
);

/// Role attached to a resolved identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Customer,
    Clerk,
    Admin,
}

impl Role {
    /// Every role that belongs to the shared staff pool.
    pub const STAFF: [Role; 2] = [Role::Clerk, Role::Admin];

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Clerk | Role::Admin)
    }
}

/// A `(user_id, role)` pair resolved by the external authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

/// Displayable subset of a user record. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Structured product card attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReference {
    pub id: i64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    /// Index of the image the sender was looking at.
    #[serde(default)]
    pub current_image_index: usize,
}

/// The single persistent thread between one customer and the staff pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub customer_id: UserId,
    /// Most recent staff responder. Advisory only, never an access filter.
    pub active_clerk_id: Option<UserId>,
    pub last_message_at: Option<String>,
    pub created_at: String,
}

/// Conversation plus the display subsets a staff inbox renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub customer: Option<UserSummary>,
    pub active_clerk: Option<UserSummary>,
}

/// Mutation applied to a conversation whenever a message lands in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTouch {
    pub at: String,
    /// When `Some`, replaces `active_clerk_id`.
    pub active_clerk_id: Option<UserId>,
}

/// A message ready to be appended; ids and timestamps are assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: Option<String>,
    pub product: Option<ProductReference>,
    pub image_urls: Vec<String>,
    pub is_quick_option: bool,
}

/// An immutable, persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: Option<String>,
    pub product: Option<ProductReference>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub is_quick_option: bool,
    pub created_at: String,
}

/// Message with resolved sender/receiver display subsets, as broadcast and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(flatten)]
    pub message: Message,
    pub sender: Option<UserSummary>,
    pub receiver: Option<UserSummary>,
}

/// Cursor-based window over a conversation's messages.
///
/// `after_id` takes precedence over `before_id` when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageQuery {
    pub after_id: Option<MessageId>,
    pub before_id: Option<MessageId>,
    /// `None` means no limit.
    pub limit: Option<u32>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Directory,
    Transport,
}

/// Timestamp format used for every persisted record (UTC, millisecond precision).
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
