// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory adapter trait for user display data and staff rosters.

use async_trait::async_trait;

use crate::error::ShopdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Role, UserId, UserSummary};

/// Read model over the identities owned by the authentication layer.
///
/// Roster queries are answered from the current state on every call;
/// implementations must not cache them.
#[async_trait]
pub trait DirectoryAdapter: PluginAdapter {
    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>, ShopdeskError>;

    /// Every user holding one of `roles`, ordered by id.
    async fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<UserSummary>, ShopdeskError>;

    /// Deterministic fallback receiver for customer messages with no active clerk.
    async fn first_available_staff(&self) -> Result<Option<UserSummary>, ShopdeskError>;

    /// Inserts or replaces a user record.
    async fn upsert_user(&self, user: &UserSummary) -> Result<(), ShopdeskError>;
}
