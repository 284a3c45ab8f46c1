// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage and directory adapter traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use shopdesk_config::model::StorageConfig;
use shopdesk_core::{
    AdapterType, Conversation, ConversationId, ConversationTouch, DirectoryAdapter, HealthStatus,
    Message, MessageQuery, NewMessage, Notification, NotificationDraft, NotificationId,
    NotificationQuery, PluginAdapter, Role, ShopdeskError, StorageAdapter, UserId, UserSummary,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other call fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, ShopdeskError> {
        self.db
            .get()
            .ok_or_else(|| ShopdeskError::storage("storage not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ShopdeskError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ShopdeskError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ShopdeskError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| ShopdeskError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ShopdeskError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Conversations ---

    async fn find_or_create_conversation(
        &self,
        customer_id: UserId,
    ) -> Result<Conversation, ShopdeskError> {
        queries::conversations::find_or_create(self.db()?, customer_id).await
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, ShopdeskError> {
        queries::conversations::get(self.db()?, id).await
    }

    async fn conversation_for_customer(
        &self,
        customer_id: UserId,
    ) -> Result<Option<Conversation>, ShopdeskError> {
        queries::conversations::for_customer(self.db()?, customer_id).await
    }

    async fn touch_conversation(
        &self,
        id: ConversationId,
        touch: &ConversationTouch,
    ) -> Result<bool, ShopdeskError> {
        queries::conversations::touch(self.db()?, id, touch).await
    }

    async fn list_conversations(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Conversation>, ShopdeskError> {
        queries::conversations::list(self.db()?, limit, offset).await
    }

    // --- Messages ---

    async fn append_message(
        &self,
        message: &NewMessage,
        touch: &ConversationTouch,
    ) -> Result<Message, ShopdeskError> {
        queries::messages::append(self.db()?, message, touch).await
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        query: &MessageQuery,
    ) -> Result<Vec<Message>, ShopdeskError> {
        queries::messages::list(self.db()?, conversation_id, query).await
    }

    // --- Notifications ---

    async fn insert_notification(
        &self,
        receiver_id: UserId,
        draft: &NotificationDraft,
    ) -> Result<Notification, ShopdeskError> {
        queries::notifications::insert(self.db()?, receiver_id, draft).await
    }

    async fn list_notifications(
        &self,
        receiver_id: UserId,
        query: &NotificationQuery,
    ) -> Result<Vec<Notification>, ShopdeskError> {
        queries::notifications::list(self.db()?, receiver_id, query).await
    }

    async fn mark_notification_read(
        &self,
        receiver_id: UserId,
        id: NotificationId,
    ) -> Result<bool, ShopdeskError> {
        queries::notifications::mark_read(self.db()?, receiver_id, id).await
    }

    async fn mark_all_notifications_read(
        &self,
        receiver_id: UserId,
    ) -> Result<u64, ShopdeskError> {
        queries::notifications::mark_all_read(self.db()?, receiver_id).await
    }

    async fn mark_notifications_from_sender_read(
        &self,
        receiver_id: UserId,
        sender_id: UserId,
    ) -> Result<u64, ShopdeskError> {
        queries::notifications::mark_from_sender_read(self.db()?, receiver_id, sender_id).await
    }

    async fn unread_count(&self, receiver_id: UserId) -> Result<u64, ShopdeskError> {
        queries::notifications::unread_count(self.db()?, receiver_id).await
    }
}

#[async_trait]
impl DirectoryAdapter for SqliteStorage {
    async fn find_user(&self, id: UserId) -> Result<Option<UserSummary>, ShopdeskError> {
        queries::users::find_user(self.db()?, id).await
    }

    async fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<UserSummary>, ShopdeskError> {
        queries::users::users_with_roles(self.db()?, roles).await
    }

    async fn first_available_staff(&self) -> Result<Option<UserSummary>, ShopdeskError> {
        queries::users::first_available_staff(self.db()?).await
    }

    async fn upsert_user(&self, user: &UserSummary) -> Result<(), ShopdeskError> {
        queries::users::upsert_user(self.db()?, user).await
    }
}
