// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./shopdesk.toml` > `~/.config/shopdesk/shopdesk.toml` >
//! `/etc/shopdesk/shopdesk.toml`, with environment variable overrides via the
//! `SHOPDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ShopdeskConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/shopdesk/shopdesk.toml";

/// Config sections addressable through `SHOPDESK_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &["server", "storage", "broadcast", "inbox", "notifications"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/shopdesk/shopdesk.toml`
/// 3. `~/.config/shopdesk/shopdesk.toml`
/// 4. `./shopdesk.toml`
/// 5. `SHOPDESK_*` environment variables
pub fn load_config() -> Result<ShopdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ShopdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ShopdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ShopdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ShopdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ShopdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("shopdesk/shopdesk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("shopdesk.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `SHOPDESK_SERVER_SERVICE_TOKEN` to
/// `server.service_token`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("SHOPDESK_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("server_service_token"), "server.service_token");
        assert_eq!(
            map_env_key("broadcast_publish_timeout_ms"),
            "broadcast.publish_timeout_ms"
        );
        assert_eq!(
            map_env_key("notifications_default_list_limit"),
            "notifications.default_list_limit"
        );
    }

    #[test]
    fn unknown_env_section_passes_through() {
        assert_eq!(map_env_key("telemetry_endpoint"), "telemetry_endpoint");
    }
}
