// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation queries.

use rusqlite::{params, OptionalExtension, Row};
use shopdesk_core::types::now_timestamp;
use shopdesk_core::{Conversation, ConversationId, ConversationTouch, ShopdeskError, UserId};

use crate::database::{map_tr_err, Database};

const COLUMNS: &str = "id, customer_id, active_clerk_id, last_message_at, created_at";

pub(crate) fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: ConversationId(row.get(0)?),
        customer_id: UserId(row.get(1)?),
        active_clerk_id: row.get::<_, Option<i64>>(2)?.map(UserId),
        last_message_at: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Return the customer's conversation, creating it if absent.
///
/// The insert and the read back run in one transaction on the writer
/// thread; `UNIQUE(customer_id)` turns a racing insert into a no-op, so
/// every caller observes the same row.
pub async fn find_or_create(
    db: &Database,
    customer_id: UserId,
) -> Result<Conversation, ShopdeskError> {
    let created_at = now_timestamp();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO conversations (customer_id, created_at) VALUES (?1, ?2)
                 ON CONFLICT(customer_id) DO NOTHING",
                params![customer_id.0, created_at],
            )?;
            let conversation = tx.query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE customer_id = ?1"),
                params![customer_id.0],
                conversation_from_row,
            )?;
            tx.commit()?;
            Ok(conversation)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, id: ConversationId) -> Result<Option<Conversation>, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1"),
                params![id.0],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn for_customer(
    db: &Database,
    customer_id: UserId,
) -> Result<Option<Conversation>, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE customer_id = ?1"),
                params![customer_id.0],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a touch inside an open connection or transaction.
pub(crate) fn apply_touch(
    conn: &rusqlite::Connection,
    id: ConversationId,
    touch: &ConversationTouch,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE conversations
         SET last_message_at = ?2,
             active_clerk_id = COALESCE(?3, active_clerk_id)
         WHERE id = ?1",
        params![id.0, touch.at, touch.active_clerk_id.map(|u| u.0)],
    )?;
    Ok(changed > 0)
}

/// Returns `false` when the conversation does not exist.
pub async fn touch(
    db: &Database,
    id: ConversationId,
    touch: &ConversationTouch,
) -> Result<bool, ShopdeskError> {
    let touch = touch.clone();
    db.connection()
        .call(move |conn| apply_touch(conn, id, &touch))
        .await
        .map_err(map_tr_err)
}

/// Most recently active first; conversations without messages sort by creation time.
pub async fn list(db: &Database, limit: u32, offset: u32) -> Result<Vec<Conversation>, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM conversations
                 ORDER BY COALESCE(last_message_at, created_at) DESC, id DESC
                 LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt.query_map(params![limit, offset], conversation_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::open_temp_db;

    #[tokio::test]
    async fn find_or_create_is_idempotent() {
        let (db, _dir) = open_temp_db().await;
        let first = find_or_create(&db, UserId(1001)).await.unwrap();
        let second = find_or_create(&db, UserId(1001)).await.unwrap();
        assert_eq!(first, second);
        assert!(first.active_clerk_id.is_none());
        assert!(first.last_message_at.is_none());

        let other = find_or_create(&db, UserId(1002)).await.unwrap();
        assert_ne!(other.id, first.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_creates_yield_one_row() {
        let (db, _dir) = open_temp_db().await;
        let db = std::sync::Arc::new(db);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                find_or_create(&db, UserId(77)).await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(list(&db, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn touch_sets_activity_and_keeps_clerk_when_absent() {
        let (db, _dir) = open_temp_db().await;
        let conv = find_or_create(&db, UserId(5)).await.unwrap();

        let staff_touch = ConversationTouch {
            at: "2026-01-01T00:00:01.000Z".into(),
            active_clerk_id: Some(UserId(9)),
        };
        assert!(touch(&db, conv.id, &staff_touch).await.unwrap());

        let customer_touch = ConversationTouch {
            at: "2026-01-01T00:00:02.000Z".into(),
            active_clerk_id: None,
        };
        assert!(touch(&db, conv.id, &customer_touch).await.unwrap());

        let reloaded = get(&db, conv.id).await.unwrap().unwrap();
        assert_eq!(reloaded.active_clerk_id, Some(UserId(9)));
        assert_eq!(
            reloaded.last_message_at.as_deref(),
            Some("2026-01-01T00:00:02.000Z")
        );

        assert!(!touch(&db, ConversationId(999), &customer_touch).await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_orders_by_recent_activity() {
        let (db, _dir) = open_temp_db().await;
        let a = find_or_create(&db, UserId(1)).await.unwrap();
        let b = find_or_create(&db, UserId(2)).await.unwrap();
        touch(
            &db,
            a.id,
            &ConversationTouch {
                at: "2999-01-01T00:00:00.000Z".into(),
                active_clerk_id: None,
            },
        )
        .await
        .unwrap();

        let listed = list(&db, 10, 0).await.unwrap();
        assert_eq!(listed[0].id, a.id);
        assert_eq!(listed[1].id, b.id);
        assert_eq!(list(&db, 1, 1).await.unwrap()[0].id, b.id);
        assert_eq!(for_customer(&db, UserId(2)).await.unwrap().unwrap().id, b.id);
        assert!(for_customer(&db, UserId(3)).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
