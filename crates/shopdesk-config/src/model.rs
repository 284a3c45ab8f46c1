// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Shopdesk inbox.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Shopdesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShopdeskConfig {
    /// HTTP/WebSocket listener and upstream auth settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Real-time publish settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Message listing and validation limits.
    #[serde(default)]
    pub inbox: InboxConfig,

    /// Notification listing settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret presented by the upstream authentication layer.
    /// `None` rejects every authenticated request.
    #[serde(default)]
    pub service_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            service_token: None,
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8790
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("shopdesk").join("shopdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("shopdesk.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Real-time publish configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Upper bound on a single channel publish before it is abandoned.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Per-channel buffer of undelivered events before slow subscribers lag.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            publish_timeout_ms: default_publish_timeout_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_publish_timeout_ms() -> u64 {
    2000
}

fn default_channel_capacity() -> usize {
    256
}

/// Message listing and validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InboxConfig {
    /// Default page size of the staff conversation listing.
    #[serde(default = "default_staff_page_size")]
    pub staff_page_size: u32,

    /// Largest page a caller may request explicitly.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum message body length in characters.
    #[serde(default = "default_max_body_length")]
    pub max_body_length: usize,

    /// Maximum number of image attachments per message.
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Window after which clients should treat a typing indicator as stale.
    #[serde(default = "default_typing_stale_after_ms")]
    pub typing_stale_after_ms: u64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            staff_page_size: default_staff_page_size(),
            max_page_size: default_max_page_size(),
            max_body_length: default_max_body_length(),
            max_images: default_max_images(),
            typing_stale_after_ms: default_typing_stale_after_ms(),
        }
    }
}

fn default_staff_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_max_body_length() -> usize {
    5000
}

fn default_max_images() -> usize {
    10
}

fn default_typing_stale_after_ms() -> u64 {
    6000
}

/// Notification listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Page size when a listing request carries no limit.
    #[serde(default = "default_list_limit")]
    pub default_list_limit: u32,

    /// Characters of a message body copied into its notification.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            default_list_limit: default_list_limit(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_list_limit() -> u32 {
    50
}

fn default_preview_chars() -> usize {
    80
}
