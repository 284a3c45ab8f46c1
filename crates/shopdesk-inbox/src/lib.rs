// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Shopdesk inbox core.
//!
//! - [`registry`]: one conversation per customer, advisory active clerk.
//! - [`messages`]: validation, receiver resolution, append, history windows.
//! - [`fanout`]: channel set computation and bounded best-effort publishing.
//! - [`gate`]: who may subscribe to which channel.
//! - [`notify`]: durable notifications with live unread counts.
//! - [`service`]: identity-aware operations composing all of the above.

pub mod fanout;
pub mod gate;
pub mod messages;
pub mod notify;
pub mod registry;
pub mod service;

pub use fanout::{message_channels, BroadcastRouter, DeliveryStatus};
pub use gate::{can_subscribe, ChannelGate};
pub use messages::{MessageLimits, MessageStore, SendMessage};
pub use notify::{NotificationDispatcher, ReadUpdate};
pub use registry::ConversationRegistry;
pub use service::{CustomerHistory, DispatchRequest, InboxService, SentMessage};
