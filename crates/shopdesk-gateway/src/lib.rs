// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Shopdesk inbox.
//!
//! REST endpoints call straight into [`shopdesk_inbox::InboxService`]. The
//! `/ws` endpoint lets clients subscribe to pub/sub channels, each subscribe
//! checked by the channel gate before the hub attaches a receiver.
//!
//! Authentication is owned by an upstream layer. The gateway only verifies
//! the shared service token and reads the identity that layer resolved.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig};
