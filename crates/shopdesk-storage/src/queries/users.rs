// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory read model: user display data and staff rosters.

use std::str::FromStr;

use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use shopdesk_core::types::now_timestamp;
use shopdesk_core::{Role, ShopdeskError, UserId, UserSummary};

use crate::database::{map_tr_err, Database};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserSummary> {
    let raw_role: String = row.get(2)?;
    let role = Role::from_str(&raw_role).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(UserSummary {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        role,
        avatar: row.get(3)?,
    })
}

/// Insert or replace a user record.
pub async fn upsert_user(db: &Database, user: &UserSummary) -> Result<(), ShopdeskError> {
    let user = user.clone();
    let updated_at = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, role, avatar, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     role = excluded.role,
                     avatar = excluded.avatar,
                     updated_at = excluded.updated_at",
                params![
                    user.id.0,
                    user.name,
                    user.role.to_string(),
                    user.avatar,
                    updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_user(db: &Database, id: UserId) -> Result<Option<UserSummary>, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, role, avatar FROM users WHERE id = ?1",
                params![id.0],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Every user holding one of `roles`, ordered by id.
pub async fn users_with_roles(
    db: &Database,
    roles: &[Role],
) -> Result<Vec<UserSummary>, ShopdeskError> {
    if roles.is_empty() {
        return Ok(Vec::new());
    }
    let roles: Vec<String> = roles.iter().map(Role::to_string).collect();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; roles.len()].join(", ");
            let sql = format!(
                "SELECT id, name, role, avatar FROM users
                 WHERE role IN ({placeholders}) ORDER BY id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(roles.iter()), user_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Lowest-id clerk, falling back to the lowest-id admin.
pub async fn first_available_staff(db: &Database) -> Result<Option<UserSummary>, ShopdeskError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT id, name, role, avatar FROM users
                 WHERE role IN ('clerk', 'admin')
                 ORDER BY CASE role WHEN 'clerk' THEN 0 ELSE 1 END, id ASC
                 LIMIT 1",
                [],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
