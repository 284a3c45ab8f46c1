// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete inbox stack: temp SQLite database,
//! seeded user directory, in-process hub behind a [`MockTransport`], and an
//! [`InboxService`] wired over all of them.

use std::sync::Arc;
use std::time::Duration;

use shopdesk_bus::ChannelHub;
use shopdesk_config::model::{ShopdeskConfig, StorageConfig};
use shopdesk_core::{
    DirectoryAdapter, Identity, Role, ShopdeskError, StorageAdapter, UserId, UserSummary,
};
use shopdesk_inbox::InboxService;
use shopdesk_storage::SqliteStorage;

use crate::mock_transport::MockTransport;

pub const ADMIN_ID: UserId = UserId(1);
pub const CLERK_ID: UserId = UserId(7);
pub const CUSTOMER_ID: UserId = UserId(1001);
pub const OTHER_CUSTOMER_ID: UserId = UserId(1002);

fn user(id: UserId, name: &str, role: Role) -> UserSummary {
    UserSummary {
        id,
        name: name.to_string(),
        role,
        avatar: None,
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    users: Vec<UserSummary>,
    config: ShopdeskConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            users: vec![
                user(ADMIN_ID, "Root", Role::Admin),
                user(CLERK_ID, "Carla", Role::Clerk),
                user(CUSTOMER_ID, "Ana", Role::Customer),
                user(OTHER_CUSTOMER_ID, "Ben", Role::Customer),
            ],
            config: ShopdeskConfig::default(),
        }
    }

    /// Replace the default roster.
    pub fn with_users(mut self, users: Vec<UserSummary>) -> Self {
        self.users = users;
        self
    }

    /// Add one user to the roster.
    pub fn with_user(mut self, id: UserId, name: &str, role: Role) -> Self {
        self.users.push(user(id, name, role));
        self
    }

    /// Shorten the per-channel publish bound, e.g. for hang tests.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.config.broadcast.publish_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_service_token(mut self, token: &str) -> Self {
        self.config.server.service_token = Some(token.to_string());
        self
    }

    /// Arbitrary config tweaks. The storage section is always overwritten.
    pub fn with_config(mut self, f: impl FnOnce(&mut ShopdeskConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ShopdeskError> {
        let temp_dir = tempfile::TempDir::new().map_err(ShopdeskError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        for user in &self.users {
            storage.upsert_user(user).await?;
        }

        let hub = Arc::new(ChannelHub::new(config.broadcast.channel_capacity));
        let transport = Arc::new(MockTransport::forwarding_to(hub.clone()));
        let service = Arc::new(InboxService::new(
            storage.clone(),
            storage.clone(),
            transport.clone(),
            &config,
        ));

        Ok(TestHarness {
            service,
            storage,
            hub,
            transport,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over temp storage.
pub struct TestHarness {
    pub service: Arc<InboxService>,
    /// SQLite storage and directory (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Hub that successful publishes are forwarded to.
    pub hub: Arc<ChannelHub>,
    /// Recording transport in front of `hub`.
    pub transport: Arc<MockTransport>,
    pub config: ShopdeskConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn admin(&self) -> Identity {
        Identity::new(ADMIN_ID, Role::Admin)
    }

    pub fn clerk(&self) -> Identity {
        Identity::new(CLERK_ID, Role::Clerk)
    }

    pub fn customer(&self) -> Identity {
        Identity::new(CUSTOMER_ID, Role::Customer)
    }

    pub fn other_customer(&self) -> Identity {
        Identity::new(OTHER_CUSTOMER_ID, Role::Customer)
    }
}
