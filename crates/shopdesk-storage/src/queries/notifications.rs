// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification persistence and read-state queries.
//!
//! The payload is split across the `type` column and a JSON `data` column.
//! Rows whose `data` no longer matches the typed shape for their `type`
//! are surfaced as `system` notifications carrying the raw JSON.

use rusqlite::{params, OptionalExtension, Row};
use serde_json::{json, Value};
use shopdesk_core::types::now_timestamp;
use shopdesk_core::{
    Notification, NotificationDraft, NotificationId, NotificationPayload, NotificationQuery,
    ShopdeskError, UserId,
};
use tracing::warn;

use crate::database::{map_tr_err, Database};

const COLUMNS: &str = "id, sender_id, receiver_id, title, body, type, data, is_read, created_at";

fn decode_payload(id: i64, kind: String, data: Option<String>) -> NotificationPayload {
    let data: Option<Value> = data.and_then(|raw| serde_json::from_str(&raw).ok());
    let tagged = json!({ "type": kind, "data": data });
    serde_json::from_value(tagged).unwrap_or_else(|e| {
        warn!(notification_id = id, kind = %kind, error = %e, "undecodable notification payload");
        NotificationPayload::System(data)
    })
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let id: i64 = row.get(0)?;
    Ok(Notification {
        id: NotificationId(id),
        sender_id: row.get::<_, Option<i64>>(1)?.map(UserId),
        receiver_id: UserId(row.get(2)?),
        title: row.get(3)?,
        body: row.get(4)?,
        payload: decode_payload(id, row.get(5)?, row.get(6)?),
        is_read: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn encode_payload(payload: &NotificationPayload) -> Result<(String, Option<String>), ShopdeskError> {
    let value = serde_json::to_value(payload).map_err(ShopdeskError::storage)?;
    let data = match value.get("data") {
        None | Some(Value::Null) => None,
        Some(data) => Some(data.to_string()),
    };
    Ok((payload.kind().to_string(), data))
}

pub async fn insert(
    db: &Database,
    receiver_id: UserId,
    draft: &NotificationDraft,
) -> Result<Notification, ShopdeskError> {
    let (kind, data) = encode_payload(&draft.payload)?;
    let sender_id = draft.sender_id.map(|u| u.0);
    let title = draft.title.clone();
    let body = draft.body.clone();
    let created_at = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notifications (sender_id, receiver_id, title, body, type, data,
                                            is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                params![sender_id, receiver_id.0, title, body, kind, data, created_at],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1"),
                params![id],
                notification_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// The recipient's notifications, newest first.
pub async fn list(
    db: &Database,
    receiver_id: UserId,
    query: &NotificationQuery,
) -> Result<Vec<Notification>, ShopdeskError> {
    let query = *query;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM notifications
                 WHERE receiver_id = ?1 AND (?2 = 0 OR is_read = 0)
                 ORDER BY id DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(
                params![receiver_id.0, query.unread_only, query.limit],
                notification_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Mark one notification read. `NotFound` unless it belongs to `receiver_id`.
///
/// Returns whether the row changed; marking an already read notification is `Ok(false)`.
pub async fn mark_read(
    db: &Database,
    receiver_id: UserId,
    id: NotificationId,
) -> Result<bool, ShopdeskError> {
    let outcome = db
        .connection()
        .call(move |conn| {
            let owned = conn
                .query_row(
                    "SELECT is_read FROM notifications WHERE id = ?1 AND receiver_id = ?2",
                    params![id.0, receiver_id.0],
                    |row| row.get::<_, bool>(0),
                )
                .optional()?;
            match owned {
                None => Ok(None),
                Some(true) => Ok(Some(false)),
                Some(false) => {
                    conn.execute(
                        "UPDATE notifications SET is_read = 1 WHERE id = ?1",
                        params![id.0],
                    )?;
                    Ok(Some(true))
                }
            }
        })
        .await
        .map_err(map_tr_err)?;

    outcome.ok_or_else(|| ShopdeskError::not_found("notification", id))
}

pub async fn mark_all_read(db: &Database, receiver_id: UserId) -> Result<u64, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE receiver_id = ?1 AND is_read = 0",
                params![receiver_id.0],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark every unread notification `sender_id` caused for `receiver_id` as read.
pub async fn mark_from_sender_read(
    db: &Database,
    receiver_id: UserId,
    sender_id: UserId,
) -> Result<u64, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                params![receiver_id.0, sender_id.0],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn unread_count(db: &Database, receiver_id: UserId) -> Result<u64, ShopdeskError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE receiver_id = ?1 AND is_read = 0",
                params![receiver_id.0],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|count| count.max(0) as u64)
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::open_temp_db;
    use shopdesk_core::notification::{MessageNotice, OrderNotice};
    use shopdesk_core::{ConversationId, MessageId, NotificationType};

    fn order_draft(order_id: i64) -> NotificationDraft {
        NotificationDraft {
            sender_id: None,
            title: "Order shipped".into(),
            body: format!("Order #{order_id} is on its way"),
            payload: NotificationPayload::Order(OrderNotice {
                order_id,
                order_number: Some(format!("SO-{order_id}")),
                status: Some("shipped".into()),
            }),
        }
    }

    fn message_draft(sender: i64) -> NotificationDraft {
        NotificationDraft {
            sender_id: Some(UserId(sender)),
            title: "New message".into(),
            body: "Do you have this in blue?".into(),
            payload: NotificationPayload::Message(MessageNotice {
                conversation_id: ConversationId(1),
                message_id: MessageId(1),
                customer_id: UserId(sender),
            }),
        }
    }

    #[tokio::test]
    async fn insert_round_trips_typed_payload() {
        let (db, _dir) = open_temp_db().await;
        let stored = insert(&db, UserId(3), &order_draft(12)).await.unwrap();
        assert_eq!(stored.receiver_id, UserId(3));
        assert!(!stored.is_read);
        assert_eq!(stored.kind(), NotificationType::Order);
        assert_eq!(stored.payload, order_draft(12).payload);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn system_payload_without_data() {
        let (db, _dir) = open_temp_db().await;
        let draft = NotificationDraft {
            sender_id: None,
            title: "Maintenance".into(),
            body: "Back at 02:00".into(),
            payload: NotificationPayload::System(None),
        };
        let stored = insert(&db, UserId(3), &draft).await.unwrap();
        assert_eq!(stored.payload, NotificationPayload::System(None));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_data_degrades_to_system() {
        let (db, _dir) = open_temp_db().await;
        let stored = insert(&db, UserId(3), &order_draft(1)).await.unwrap();
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE notifications SET data = '{\"unexpected\":true}' WHERE id = ?1",
                    params![stored.id.0],
                )
            })
            .await
            .map_err(map_tr_err)
            .unwrap();

        let listed = list(&db, UserId(3), &NotificationQuery { limit: 10, unread_only: false })
            .await
            .unwrap();
        assert_eq!(
            listed[0].payload,
            NotificationPayload::System(Some(json!({ "unexpected": true })))
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filters_unread() {
        let (db, _dir) = open_temp_db().await;
        let first = insert(&db, UserId(3), &order_draft(1)).await.unwrap();
        let second = insert(&db, UserId(3), &order_draft(2)).await.unwrap();
        insert(&db, UserId(4), &order_draft(3)).await.unwrap();
        mark_read(&db, UserId(3), first.id).await.unwrap();

        let all = list(&db, UserId(3), &NotificationQuery { limit: 10, unread_only: false })
            .await
            .unwrap();
        assert_eq!(all.iter().map(|n| n.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let unread = list(&db, UserId(3), &NotificationQuery { limit: 10, unread_only: true })
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, second.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_read_requires_ownership() {
        let (db, _dir) = open_temp_db().await;
        let n = insert(&db, UserId(3), &order_draft(1)).await.unwrap();

        let err = mark_read(&db, UserId(4), n.id).await.unwrap_err();
        assert!(matches!(err, ShopdeskError::NotFound { .. }));
        assert_eq!(unread_count(&db, UserId(3)).await.unwrap(), 1);

        assert!(mark_read(&db, UserId(3), n.id).await.unwrap());
        assert!(!mark_read(&db, UserId(3), n.id).await.unwrap());
        assert_eq!(unread_count(&db, UserId(3)).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn bulk_mark_read_is_scoped() {
        let (db, _dir) = open_temp_db().await;
        insert(&db, UserId(9), &message_draft(5)).await.unwrap();
        insert(&db, UserId(9), &message_draft(5)).await.unwrap();
        insert(&db, UserId(9), &message_draft(6)).await.unwrap();
        insert(&db, UserId(10), &message_draft(5)).await.unwrap();

        assert_eq!(mark_from_sender_read(&db, UserId(9), UserId(5)).await.unwrap(), 2);
        assert_eq!(unread_count(&db, UserId(9)).await.unwrap(), 1);
        assert_eq!(unread_count(&db, UserId(10)).await.unwrap(), 1);

        assert_eq!(mark_all_read(&db, UserId(9)).await.unwrap(), 1);
        assert_eq!(mark_all_read(&db, UserId(9)).await.unwrap(), 0);
        db.close().await.unwrap();
    }
}
