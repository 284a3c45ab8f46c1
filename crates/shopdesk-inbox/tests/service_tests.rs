// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! InboxService against real SQLite storage and the in-process hub.

use std::sync::Arc;

use shopdesk_bus::ChannelHub;
use shopdesk_config::model::{ShopdeskConfig, StorageConfig};
use shopdesk_core::{
    BroadcastEvent, Channel, ConversationId, DirectoryAdapter, Identity, MessageQuery,
    NotificationDraft, NotificationPayload, Role, ShopdeskError, StorageAdapter, UserId,
    UserSummary,
};
use shopdesk_inbox::{DispatchRequest, InboxService, SendMessage};
use shopdesk_storage::SqliteStorage;

const ADMIN: UserId = UserId(1);
const CLERK: UserId = UserId(7);
const ANA: UserId = UserId(1001);
const BEN: UserId = UserId(1002);

struct Fixture {
    service: InboxService,
    hub: Arc<ChannelHub>,
    _dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ShopdeskConfig::default();
    config.storage = StorageConfig {
        database_path: dir.path().join("inbox.db").display().to_string(),
        wal_mode: true,
    };
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await.unwrap();
    for (id, name, role) in [
        (ADMIN, "Root", Role::Admin),
        (CLERK, "Carla", Role::Clerk),
        (ANA, "Ana", Role::Customer),
        (BEN, "Ben", Role::Customer),
    ] {
        storage
            .upsert_user(&UserSummary {
                id,
                name: name.into(),
                role,
                avatar: None,
            })
            .await
            .unwrap();
    }
    let hub = Arc::new(ChannelHub::default());
    let service = InboxService::new(storage.clone(), storage, hub.clone(), &config);
    Fixture {
        service,
        hub,
        _dir: dir,
    }
}

fn customer(id: UserId) -> Identity {
    Identity::new(id, Role::Customer)
}

fn clerk() -> Identity {
    Identity::new(CLERK, Role::Clerk)
}

fn admin() -> Identity {
    Identity::new(ADMIN, Role::Admin)
}

#[tokio::test]
async fn first_customer_message_reaches_staff() {
    let fx = fixture().await;
    let mut conversation_rx = fx.hub.subscribe(Channel::Conversation(ConversationId(1)));
    let mut clerk_rx = fx.hub.subscribe(Channel::User(CLERK));
    let mut clerk_feed = fx.hub.subscribe(Channel::Notifications(CLERK));

    let sent = fx
        .service
        .send_message(&customer(ANA), SendMessage::text("Is the oak table in stock?"))
        .await
        .unwrap();

    assert_eq!(sent.message.message.conversation_id, ConversationId(1));
    assert_eq!(sent.message.message.receiver_id, CLERK);
    assert_eq!(sent.message.sender.as_ref().map(|s| s.name.as_str()), Some("Ana"));
    assert!(sent.delivery.is_delivered());
    assert_eq!(sent.notified_staff, 2);

    assert!(matches!(conversation_rx.try_recv().unwrap(), BroadcastEvent::MessageSent(_)));
    assert!(matches!(clerk_rx.try_recv().unwrap(), BroadcastEvent::MessageSent(_)));
    match clerk_feed.try_recv().unwrap() {
        BroadcastEvent::NotificationCreated(n) => {
            assert_eq!(n.title, "New message from Ana");
            assert_eq!(n.sender_id, Some(ANA));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        clerk_feed.try_recv().unwrap(),
        BroadcastEvent::UnreadCount { count: 1 }
    );
}

#[tokio::test]
async fn staff_reply_claims_the_conversation() {
    let fx = fixture().await;
    let first = fx
        .service
        .send_message(&customer(ANA), SendMessage::text("Hello"))
        .await
        .unwrap();
    let conversation_id = first.message.message.conversation_id;

    let reply = fx
        .service
        .send_message(
            &admin(),
            SendMessage {
                conversation_id: Some(conversation_id),
                ..SendMessage::text("Hi Ana, how can I help?")
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.message.message.receiver_id, ANA);
    assert_eq!(reply.notified_staff, 0);

    let conversation = fx.service.registry().get(conversation_id).await.unwrap();
    assert_eq!(conversation.active_clerk_id, Some(ADMIN));

    let follow_up = fx
        .service
        .send_message(&customer(ANA), SendMessage::text("Thanks"))
        .await
        .unwrap();
    assert_eq!(follow_up.message.message.conversation_id, conversation_id);
    assert_eq!(follow_up.message.message.receiver_id, ADMIN);
}

#[tokio::test]
async fn customers_stay_inside_their_own_thread() {
    let fx = fixture().await;
    let ana = fx
        .service
        .send_message(&customer(ANA), SendMessage::text("Hello"))
        .await
        .unwrap();
    let ana_conversation = ana.message.message.conversation_id;

    let err = fx
        .service
        .send_message(
            &customer(BEN),
            SendMessage {
                conversation_id: Some(ana_conversation),
                ..SendMessage::text("let me in")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Unauthorized { .. }));

    let err = fx
        .service
        .conversation_messages(&customer(BEN), ana_conversation, MessageQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Unauthorized { .. }));

    let err = fx
        .service
        .send_message(
            &customer(BEN),
            SendMessage {
                conversation_id: Some(ConversationId(999)),
                ..SendMessage::text("hello?")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::NotFound { .. }));

    assert!(
        !fx.service
            .can_subscribe(&customer(BEN), &Channel::Conversation(ana_conversation))
            .await
            .unwrap()
    );
    assert!(
        fx.service
            .can_subscribe(&clerk(), &Channel::Conversation(ana_conversation))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn staff_must_address_someone() {
    let fx = fixture().await;
    let err = fx
        .service
        .send_message(&clerk(), SendMessage::text("Anyone?"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShopdeskError::Validation { field: "conversation_id", .. }
    ));

    let err = fx
        .service
        .send_message(
            &clerk(),
            SendMessage {
                receiver_id: Some(ADMIN),
                ..SendMessage::text("Hi boss")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Validation { field: "receiver_id", .. }));

    // A customer without a thread gets one opened by staff outreach.
    let sent = fx
        .service
        .send_message(
            &clerk(),
            SendMessage {
                receiver_id: Some(BEN),
                ..SendMessage::text("Your order shipped")
            },
        )
        .await
        .unwrap();
    assert_eq!(sent.message.message.receiver_id, BEN);
    let history = fx
        .service
        .own_history(&customer(BEN), MessageQuery::default())
        .await
        .unwrap();
    assert_eq!(history.messages.len(), 1);
}

#[tokio::test]
async fn history_windows() {
    let fx = fixture().await;
    let mut conversation_id = None;
    for i in 0..5 {
        let sent = fx
            .service
            .send_message(&customer(ANA), SendMessage::text(format!("message {i}")))
            .await
            .unwrap();
        conversation_id = Some(sent.message.message.conversation_id);
    }
    let conversation_id = conversation_id.unwrap();

    let all = fx
        .service
        .own_history(&customer(ANA), MessageQuery::default())
        .await
        .unwrap();
    assert_eq!(all.messages.len(), 5);
    assert!(all.messages.windows(2).all(|w| w[0].id < w[1].id));

    let latest = fx
        .service
        .conversation_messages(
            &clerk(),
            conversation_id,
            MessageQuery {
                limit: Some(2),
                ..MessageQuery::default()
            },
        )
        .await
        .unwrap();
    let bodies: Vec<_> = latest.iter().filter_map(|m| m.body.as_deref()).collect();
    assert_eq!(bodies, ["message 3", "message 4"]);

    let newer = fx
        .service
        .conversation_messages(
            &clerk(),
            conversation_id,
            MessageQuery {
                after_id: Some(all.messages[2].id),
                ..MessageQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(newer.len(), 2);

    let fresh = fx
        .service
        .own_history(&customer(BEN), MessageQuery::default())
        .await
        .unwrap();
    assert!(fresh.conversation.is_none());
    assert!(fresh.messages.is_empty());
}

#[tokio::test]
async fn opening_a_conversation_clears_its_notifications() {
    let fx = fixture().await;
    for body in ["one", "two"] {
        fx.service
            .send_message(&customer(ANA), SendMessage::text(body))
            .await
            .unwrap();
    }
    let bens = fx
        .service
        .send_message(&customer(BEN), SendMessage::text("three"))
        .await
        .unwrap();
    assert_eq!(fx.service.unread_count(&clerk()).await.unwrap(), 3);

    let mut clerk_feed = fx.hub.subscribe(Channel::Notifications(CLERK));
    let ana_conversation = fx
        .service
        .registry()
        .conversation_for(ANA)
        .await
        .unwrap()
        .unwrap();
    let update = fx
        .service
        .mark_conversation_read(&clerk(), ana_conversation.id)
        .await
        .unwrap();
    assert_eq!(update.changed, 2);
    assert_eq!(update.unread, 1);
    assert_eq!(
        clerk_feed.try_recv().unwrap(),
        BroadcastEvent::UnreadCount { count: 1 }
    );

    // Idempotent, and no count republished when nothing changed.
    let again = fx
        .service
        .mark_conversation_read(&clerk(), ana_conversation.id)
        .await
        .unwrap();
    assert_eq!(again.changed, 0);
    assert!(clerk_feed.try_recv().is_err());

    let err = fx
        .service
        .mark_conversation_read(&customer(BEN), bens.message.message.conversation_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Unauthorized { .. }));

    // The admin's own feed is untouched by the clerk's reads.
    assert_eq!(fx.service.unread_count(&admin()).await.unwrap(), 3);
}

#[tokio::test]
async fn notification_reads_are_scoped_to_the_owner() {
    let fx = fixture().await;
    fx.service
        .send_message(&customer(ANA), SendMessage::text("ping"))
        .await
        .unwrap();
    let clerk_notifications = fx
        .service
        .list_notifications(&clerk(), None, true)
        .await
        .unwrap();
    assert_eq!(clerk_notifications.len(), 1);
    let id = clerk_notifications[0].id;

    let err = fx
        .service
        .mark_notification_read(&admin(), id)
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::NotFound { .. }));

    let update = fx.service.mark_notification_read(&clerk(), id).await.unwrap();
    assert_eq!((update.changed, update.unread), (1, 0));
    let update = fx.service.mark_notification_read(&clerk(), id).await.unwrap();
    assert_eq!(update.changed, 0);

    let update = fx.service.mark_all_notifications_read(&admin()).await.unwrap();
    assert_eq!((update.changed, update.unread), (1, 0));
}

#[tokio::test]
async fn staff_inbox_lists_recent_activity_first() {
    let fx = fixture().await;
    fx.service
        .send_message(&customer(ANA), SendMessage::text("first"))
        .await
        .unwrap();
    fx.service
        .send_message(&customer(BEN), SendMessage::text("second"))
        .await
        .unwrap();

    let inbox = fx.service.inbox(&clerk(), None, 0).await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].conversation.customer_id, BEN);
    assert_eq!(
        inbox[0].customer.as_ref().map(|c| c.name.as_str()),
        Some("Ben")
    );

    let page = fx.service.inbox(&clerk(), Some(1), 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].conversation.customer_id, ANA);

    assert!(matches!(
        fx.service.inbox(&customer(ANA), None, 0).await.unwrap_err(),
        ShopdeskError::Unauthorized { .. }
    ));
}

#[tokio::test]
async fn typing_is_broadcast_but_not_stored() {
    let fx = fixture().await;
    let sent = fx
        .service
        .send_message(&customer(ANA), SendMessage::text("hi"))
        .await
        .unwrap();
    let conversation_id = sent.message.message.conversation_id;
    let mut rx = fx.hub.subscribe(Channel::Conversation(conversation_id));

    fx.service.typing(&clerk(), conversation_id, true).await.unwrap();
    match rx.try_recv().unwrap() {
        BroadcastEvent::TypingStarted(payload) => {
            assert_eq!(payload.user_id, CLERK);
            assert_eq!(payload.stale_after_ms, 6000);
        }
        other => panic!("unexpected event {other:?}"),
    }
    fx.service.typing(&clerk(), conversation_id, false).await.unwrap();
    assert!(matches!(rx.try_recv().unwrap(), BroadcastEvent::TypingStopped(_)));

    let err = fx
        .service
        .typing(&customer(BEN), conversation_id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Unauthorized { .. }));

    let history = fx
        .service
        .conversation_messages(&clerk(), conversation_id, MessageQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn admin_dispatch_targets_user_or_role() {
    let fx = fixture().await;
    let draft = NotificationDraft {
        sender_id: None,
        title: "Flash sale".into(),
        body: "Everything 20% off today".into(),
        payload: NotificationPayload::System(None),
    };

    let created = fx
        .service
        .dispatch(
            &admin(),
            DispatchRequest {
                user_id: None,
                role: Some(Role::Customer),
                notification: draft.clone(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created, 2);
    assert_eq!(fx.service.unread_count(&customer(BEN)).await.unwrap(), 1);

    let created = fx
        .service
        .dispatch(
            &admin(),
            DispatchRequest {
                user_id: Some(ANA),
                role: None,
                notification: draft.clone(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created, 1);
    assert_eq!(fx.service.unread_count(&customer(ANA)).await.unwrap(), 2);

    let err = fx
        .service
        .dispatch(
            &clerk(),
            DispatchRequest {
                user_id: Some(ANA),
                role: None,
                notification: draft.clone(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Unauthorized { .. }));

    let err = fx
        .service
        .dispatch(
            &admin(),
            DispatchRequest {
                user_id: Some(ANA),
                role: Some(Role::Clerk),
                notification: draft,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Validation { .. }));
}

#[tokio::test]
async fn no_staff_means_no_thread() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ShopdeskConfig::default();
    config.storage.database_path = dir.path().join("empty.db").display().to_string();
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await.unwrap();
    storage
        .upsert_user(&UserSummary {
            id: ANA,
            name: "Ana".into(),
            role: Role::Customer,
            avatar: None,
        })
        .await
        .unwrap();
    let service = InboxService::new(
        storage.clone(),
        storage.clone(),
        Arc::new(ChannelHub::default()),
        &config,
    );

    let err = service
        .send_message(&customer(ANA), SendMessage::text("hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopdeskError::Validation { field: "receiver_id", .. }));
    assert!(storage.conversation_for_customer(ANA).await.unwrap().is_none());
}

#[tokio::test]
async fn bad_receiver_does_not_open_a_thread() {
    let fx = fixture().await;

    for receiver in [ANA, UserId(4242)] {
        let err = fx
            .service
            .send_message(
                &customer(BEN),
                SendMessage {
                    receiver_id: Some(receiver),
                    ..SendMessage::text("psst")
                },
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, ShopdeskError::Validation { field: "receiver_id", .. }),
            "{receiver}"
        );
    }
    assert!(fx.service.registry().conversation_for(BEN).await.unwrap().is_none());

    let sent = fx
        .service
        .send_message(
            &customer(BEN),
            SendMessage {
                receiver_id: Some(ADMIN),
                ..SendMessage::text("for the boss")
            },
        )
        .await
        .unwrap();
    assert_eq!(sent.message.message.receiver_id, ADMIN);
}
