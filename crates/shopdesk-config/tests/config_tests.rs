// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Shopdesk configuration system.

use shopdesk_config::diagnostic::ConfigError;
use shopdesk_config::model::ShopdeskConfig;
use serial_test::serial;
use shopdesk_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
service_token = "s3cret"
log_level = "debug"

[storage]
database_path = "/tmp/shopdesk-test.db"
wal_mode = false

[broadcast]
publish_timeout_ms = 500
channel_capacity = 16

[inbox]
staff_page_size = 10
max_page_size = 50
max_body_length = 200
max_images = 4
typing_stale_after_ms = 3000

[notifications]
default_list_limit = 25
preview_chars = 40
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.service_token.as_deref(), Some("s3cret"));
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/shopdesk-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.broadcast.publish_timeout_ms, 500);
    assert_eq!(config.broadcast.channel_capacity, 16);
    assert_eq!(config.inbox.staff_page_size, 10);
    assert_eq!(config.inbox.max_page_size, 50);
    assert_eq!(config.inbox.max_body_length, 200);
    assert_eq!(config.inbox.max_images, 4);
    assert_eq!(config.inbox.typing_stale_after_ms, 3000);
    assert_eq!(config.notifications.default_list_limit, 25);
    assert_eq!(config.notifications.preview_chars, 40);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config should use defaults");
    let defaults = ShopdeskConfig::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8790);
    assert!(config.server.service_token.is_none());
    assert_eq!(config.storage.database_path, defaults.storage.database_path);
    assert!(config.storage.wal_mode);
    assert_eq!(config.broadcast.publish_timeout_ms, 2000);
    assert_eq!(config.inbox.staff_page_size, 20);
    assert_eq!(config.notifications.default_list_limit, 50);
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = load_config_from_str("[inbox]\nmax_images = 2\n").unwrap();
    assert_eq!(config.inbox.max_images, 2);
    assert_eq!(config.inbox.max_body_length, 5000);
}

#[test]
fn unknown_key_gets_suggestion() {
    let errors = load_and_validate_str("[server]\nservice_tokn = \"x\"\n")
        .expect_err("unknown key should be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "service_tokn");
            assert_eq!(suggestion.as_deref(), Some("service_token"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_rejected() {
    let errors = load_and_validate_str("[metrics]\nenabled = true\n")
        .expect_err("unknown section should be rejected");
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_reports_key() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n")
        .expect_err("string port should be rejected");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str("[broadcast]\npublish_timeout_ms = 0\n")
        .expect_err("zero timeout should fail validation");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
#[serial]
fn load_from_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shopdesk.toml");
    std::fs::write(&path, "[server]\nport = 9100\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should load");
    assert_eq!(config.server.port, 9100);
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shopdesk.toml");
    std::fs::write(&path, "[server]\nport = 9100\n[inbox]\nstaff_page_size = 10\n").unwrap();

    // SAFETY: serialized with every other env-reading test.
    unsafe {
        std::env::set_var("SHOPDESK_SERVER_PORT", "9200");
        std::env::set_var("SHOPDESK_BROADCAST_PUBLISH_TIMEOUT_MS", "750");
    }
    let loaded = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("SHOPDESK_SERVER_PORT");
        std::env::remove_var("SHOPDESK_BROADCAST_PUBLISH_TIMEOUT_MS");
    }

    let config = loaded.expect("env overrides should load");
    assert_eq!(config.server.port, 9200);
    assert_eq!(config.broadcast.publish_timeout_ms, 750);
    assert_eq!(config.inbox.staff_page_size, 10);
}
