// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! All failures are collected; validation does not stop at the first one.

use crate::diagnostic::ConfigError;
use crate::model::ShopdeskConfig;

/// Longest publish timeout accepted, in milliseconds.
const MAX_PUBLISH_TIMEOUT_MS: u64 = 30_000;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &ShopdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if let Some(token) = &config.server.service_token
        && token.trim().is_empty()
    {
        fail("server.service_token must not be blank when set".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let timeout = config.broadcast.publish_timeout_ms;
    if timeout == 0 || timeout > MAX_PUBLISH_TIMEOUT_MS {
        fail(format!(
            "broadcast.publish_timeout_ms must be between 1 and {MAX_PUBLISH_TIMEOUT_MS}, got {timeout}"
        ));
    }

    if config.broadcast.channel_capacity == 0 {
        fail("broadcast.channel_capacity must be at least 1".to_string());
    }

    let inbox = &config.inbox;
    if inbox.staff_page_size == 0 || inbox.staff_page_size > inbox.max_page_size {
        fail(format!(
            "inbox.staff_page_size must be between 1 and inbox.max_page_size ({}), got {}",
            inbox.max_page_size, inbox.staff_page_size
        ));
    }

    if inbox.max_body_length == 0 {
        fail("inbox.max_body_length must be at least 1".to_string());
    }

    if config.notifications.default_list_limit == 0 {
        fail("notifications.default_list_limit must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
