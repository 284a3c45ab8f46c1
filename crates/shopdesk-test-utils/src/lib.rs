// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Shopdesk integration tests.
//!
//! Provides a recording transport and a harness that wires the inbox over a
//! temp SQLite database, for fast deterministic tests without a server.
//!
//! # Components
//!
//! - [`MockTransport`] - Records publishes, with injectable failures and hangs
//! - [`TestHarness`] - Seeded storage, hub and `InboxService` in one place

pub mod harness;
pub mod mock_transport;

pub use harness::{TestHarness, ADMIN_ID, CLERK_ID, CUSTOMER_ID, OTHER_CUSTOMER_ID};
pub use mock_transport::MockTransport;
