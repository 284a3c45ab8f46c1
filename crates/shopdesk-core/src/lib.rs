// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Shopdesk customer-service inbox.
//!
//! This crate provides the error type, the domain records (conversations,
//! messages, notifications), the pub/sub channel naming scheme, and the
//! adapter traits through which the inbox reaches its collaborators.

pub mod channel;
pub mod error;
pub mod event;
pub mod notification;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use channel::Channel;
pub use error::{ErrorCategory, ShopdeskError};
pub use event::{BroadcastEvent, TypingPayload};
pub use notification::{
    Notification, NotificationDraft, NotificationPayload, NotificationQuery, NotificationType,
};
pub use types::{
    AdapterType, Conversation, ConversationId, ConversationSummary, ConversationTouch,
    HealthStatus, Identity, Message, MessageEnvelope, MessageId, MessageQuery, NewMessage,
    NotificationId, ProductReference, Role, UserId, UserSummary,
};

pub use traits::{DirectoryAdapter, PluginAdapter, StorageAdapter, TransportAdapter};
