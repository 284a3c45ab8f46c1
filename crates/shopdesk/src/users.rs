// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `shopdesk users` subcommands.

use shopdesk_config::ShopdeskConfig;
use shopdesk_core::{DirectoryAdapter, Role, ShopdeskError, StorageAdapter, UserId, UserSummary};
use shopdesk_storage::SqliteStorage;

/// Write one user into the directory read model.
pub async fn upsert(
    config: &ShopdeskConfig,
    id: UserId,
    name: String,
    role: Role,
    avatar: Option<String>,
) -> Result<(), ShopdeskError> {
    if name.trim().is_empty() {
        return Err(ShopdeskError::validation("name", "name must not be empty"));
    }
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let user = UserSummary {
        id,
        name,
        role,
        avatar,
    };
    storage.upsert_user(&user).await?;
    storage.close().await?;
    println!("shopdesk: user {} ({}) is now {}", user.id, user.name, user.role);
    Ok(())
}
