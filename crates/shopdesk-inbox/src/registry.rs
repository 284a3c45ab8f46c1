// SPDX-FileCopyrightText: 2026 Shopdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation registry: one conversation per customer.
//!
//! `active_clerk_id` is an advisory pointer to the latest staff responder.
//! Nothing in this crate filters visibility by it.

use std::sync::Arc;

use tracing::{debug, warn};

use shopdesk_core::types::now_timestamp;
use shopdesk_core::{
    Conversation, ConversationId, ConversationSummary, ConversationTouch, DirectoryAdapter,
    Identity, ShopdeskError, StorageAdapter, UserId,
};

/// Touch applied when `responder` posts into a conversation.
///
/// Activity time always moves; the active clerk moves only for staff, with
/// the latest staff responder winning.
pub fn touch_for(responder: Option<&Identity>) -> ConversationTouch {
    ConversationTouch {
        at: now_timestamp(),
        active_clerk_id: responder.filter(|r| r.is_staff()).map(|r| r.user_id),
    }
}

#[derive(Clone)]
pub struct ConversationRegistry {
    storage: Arc<dyn StorageAdapter>,
    directory: Arc<dyn DirectoryAdapter>,
}

impl ConversationRegistry {
    pub fn new(storage: Arc<dyn StorageAdapter>, directory: Arc<dyn DirectoryAdapter>) -> Self {
        Self { storage, directory }
    }

    /// Find or create the customer's conversation.
    ///
    /// A failed insert is followed by one lookup so that a writer losing a
    /// uniqueness race still gets the row the winner created.
    pub async fn get_or_create(&self, customer_id: UserId) -> Result<Conversation, ShopdeskError> {
        match self.storage.find_or_create_conversation(customer_id).await {
            Ok(conversation) => Ok(conversation),
            Err(e) => {
                warn!(customer_id = %customer_id, error = %e, "conversation insert failed, re-reading");
                self.storage
                    .conversation_for_customer(customer_id)
                    .await?
                    .ok_or(e)
            }
        }
    }

    /// `NotFound` when the conversation does not exist.
    pub async fn get(&self, id: ConversationId) -> Result<Conversation, ShopdeskError> {
        self.storage
            .get_conversation(id)
            .await?
            .ok_or_else(|| ShopdeskError::not_found("conversation", id))
    }

    /// The customer's conversation, without creating one.
    pub async fn conversation_for(
        &self,
        customer_id: UserId,
    ) -> Result<Option<Conversation>, ShopdeskError> {
        self.storage.conversation_for_customer(customer_id).await
    }

    /// Record activity outside of a message append.
    pub async fn touch(
        &self,
        id: ConversationId,
        responder: Option<&Identity>,
    ) -> Result<(), ShopdeskError> {
        if self.storage.touch_conversation(id, &touch_for(responder)).await? {
            debug!(conversation_id = %id, "conversation touched");
            Ok(())
        } else {
            Err(ShopdeskError::not_found("conversation", id))
        }
    }

    /// Staff inbox page, most recently active first, with participant summaries.
    pub async fn list(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ConversationSummary>, ShopdeskError> {
        let conversations = self.storage.list_conversations(limit, offset).await?;
        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let customer = self.directory.find_user(conversation.customer_id).await?;
            let active_clerk = match conversation.active_clerk_id {
                Some(id) => self.directory.find_user(id).await?,
                None => None,
            };
            summaries.push(ConversationSummary {
                conversation,
                customer,
                active_clerk,
            });
        }
        Ok(summaries)
    }
}
