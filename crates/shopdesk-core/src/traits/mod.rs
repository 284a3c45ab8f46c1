// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod directory;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use directory::DirectoryAdapter;
pub use storage::StorageAdapter;
pub use transport::TransportAdapter;
