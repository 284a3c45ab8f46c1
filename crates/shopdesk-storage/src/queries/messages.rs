// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence and windowed history reads.

use rusqlite::{params, Row};
use shopdesk_core::types::now_timestamp;
use shopdesk_core::{
    ConversationId, ConversationTouch, Message, MessageId, MessageQuery, NewMessage,
    ProductReference, ShopdeskError, UserId,
};

use crate::database::{json_column, map_tr_err, to_json, Database};
use crate::queries::conversations::apply_touch;

const COLUMNS: &str = "id, conversation_id, sender_id, receiver_id, body, product, image_urls, \
                       is_quick_option, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let product: Option<String> = row.get(5)?;
    let image_urls: String = row.get(6)?;
    Ok(Message {
        id: MessageId(row.get(0)?),
        conversation_id: ConversationId(row.get(1)?),
        sender_id: UserId(row.get(2)?),
        receiver_id: UserId(row.get(3)?),
        body: row.get(4)?,
        product: product
            .map(|raw| json_column::<ProductReference>(5, &raw))
            .transpose()?,
        image_urls: json_column(6, &image_urls)?,
        is_quick_option: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Insert a message and apply `touch` to its conversation atomically.
///
/// Returns `NotFound` without writing anything when the conversation is missing.
pub async fn append(
    db: &Database,
    message: &NewMessage,
    touch: &ConversationTouch,
) -> Result<Message, ShopdeskError> {
    let product = message.product.as_ref().map(to_json).transpose()?;
    let image_urls = to_json(&message.image_urls)?;
    let created_at = now_timestamp();
    let message = message.clone();
    let touch = touch.clone();
    let conversation_id = message.conversation_id;

    let stored = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if !apply_touch(&tx, message.conversation_id, &touch)? {
                return Ok(None);
            }
            tx.execute(
                "INSERT INTO messages (conversation_id, sender_id, receiver_id, body, product,
                                       image_urls, is_quick_option, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    message.conversation_id.0,
                    message.sender_id.0,
                    message.receiver_id.0,
                    message.body,
                    product,
                    image_urls,
                    message.is_quick_option,
                    created_at,
                ],
            )?;
            let id = tx.last_insert_rowid();
            let stored = tx.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )?;
            tx.commit()?;
            Ok(Some(stored))
        })
        .await
        .map_err(map_tr_err)?;

    stored.ok_or_else(|| ShopdeskError::not_found("conversation", conversation_id))
}

/// A window of a conversation's history in ascending id order.
///
/// `after_id` wins over `before_id`. Without a cursor the newest `limit`
/// messages are returned; with no limit the whole history is.
pub async fn list(
    db: &Database,
    conversation_id: ConversationId,
    query: &MessageQuery,
) -> Result<Vec<Message>, ShopdeskError> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = query.limit.map(i64::from).unwrap_or(-1);
    let query = *query;
    db.connection()
        .call(move |conn| {
            let (sql, cursor, descending) = match (query.after_id, query.before_id) {
                (Some(after), _) => ("AND id > ?2 ORDER BY id ASC", Some(after.0), false),
                (None, Some(before)) => ("AND id < ?2 ORDER BY id DESC", Some(before.0), true),
                (None, None) => ("AND ?2 IS NULL ORDER BY id DESC", None, true),
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE conversation_id = ?1 {sql} LIMIT ?3"
            ))?;
            let mut messages = stmt
                .query_map(params![conversation_id.0, cursor, limit], message_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            if descending {
                messages.reverse();
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::conversations;
    use crate::queries::test_support::open_temp_db;

    fn new_message(conversation_id: ConversationId, body: &str) -> NewMessage {
        NewMessage {
            conversation_id,
            sender_id: UserId(5),
            receiver_id: UserId(9),
            body: Some(body.to_string()),
            product: None,
            image_urls: vec![],
            is_quick_option: false,
        }
    }

    fn customer_touch() -> ConversationTouch {
        ConversationTouch {
            at: now_timestamp(),
            active_clerk_id: None,
        }
    }

    async fn seed(db: &Database, n: usize) -> (ConversationId, Vec<MessageId>) {
        let conv = conversations::find_or_create(db, UserId(5)).await.unwrap();
        let mut ids = Vec::new();
        for i in 0..n {
            let m = append(db, &new_message(conv.id, &format!("msg {i}")), &customer_touch())
                .await
                .unwrap();
            ids.push(m.id);
        }
        (conv.id, ids)
    }

    #[tokio::test]
    async fn append_round_trips_attachments() {
        let (db, _dir) = open_temp_db().await;
        let conv = conversations::find_or_create(&db, UserId(5)).await.unwrap();

        let mut msg = new_message(conv.id, "look at this");
        msg.product = Some(ProductReference {
            id: 3,
            name: "Linen shirt".into(),
            price: 49.5,
            images: vec!["a.jpg".into(), "b.jpg".into()],
            current_image_index: 1,
        });
        msg.image_urls = vec!["https://cdn.example/1.jpg".into()];
        msg.is_quick_option = true;

        let stored = append(&db, &msg, &customer_touch()).await.unwrap();
        assert_eq!(stored.product, msg.product);
        assert_eq!(stored.image_urls, msg.image_urls);
        assert!(stored.is_quick_option);

        let reloaded = conversations::get(&db, conv.id).await.unwrap().unwrap();
        assert_eq!(reloaded.last_message_at.as_deref(), Some(stored.created_at.as_str()));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_to_missing_conversation_writes_nothing() {
        let (db, _dir) = open_temp_db().await;
        let err = append(&db, &new_message(ConversationId(404), "hi"), &customer_touch())
            .await
            .unwrap_err();
        assert!(matches!(err, ShopdeskError::NotFound { entity: "conversation", .. }));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ids_increase_in_creation_order() {
        let (db, _dir) = open_temp_db().await;
        let (_, ids) = seed(&db, 4).await;
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn full_history_without_limit() {
        let (db, _dir) = open_temp_db().await;
        let (conv, ids) = seed(&db, 5).await;
        let all = list(&db, conv, &MessageQuery::default()).await.unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), ids);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn limit_without_cursor_returns_newest_ascending() {
        let (db, _dir) = open_temp_db().await;
        let (conv, ids) = seed(&db, 5).await;
        let query = MessageQuery {
            limit: Some(2),
            ..Default::default()
        };
        let page = list(&db, conv, &query).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), ids[3..]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn before_cursor_pages_backwards() {
        let (db, _dir) = open_temp_db().await;
        let (conv, ids) = seed(&db, 5).await;
        let query = MessageQuery {
            before_id: Some(ids[3]),
            limit: Some(2),
            ..Default::default()
        };
        let page = list(&db, conv, &query).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), ids[1..3]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn after_cursor_takes_precedence() {
        let (db, _dir) = open_temp_db().await;
        let (conv, ids) = seed(&db, 5).await;
        let query = MessageQuery {
            after_id: Some(ids[1]),
            before_id: Some(ids[0]),
            limit: Some(2),
        };
        let page = list(&db, conv, &query).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), ids[2..4]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_is_scoped_to_conversation() {
        let (db, _dir) = open_temp_db().await;
        let (conv, _) = seed(&db, 2).await;
        let other = conversations::find_or_create(&db, UserId(6)).await.unwrap();
        append(&db, &new_message(other.id, "elsewhere"), &customer_touch())
            .await
            .unwrap();
        assert_eq!(list(&db, conv, &MessageQuery::default()).await.unwrap().len(), 2);
        db.close().await.unwrap();
    }
}
