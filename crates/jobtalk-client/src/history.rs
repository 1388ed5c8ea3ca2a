// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot history fetch feeding the message store at session start.

use std::sync::Arc;

use tracing::{debug, warn};

use jobtalk_core::{ChatApi, JobtalkError, Message};

use crate::store::MessageStore;

/// Loads past messages for a conversation and seeds the store.
pub struct HistoryLoader {
    api: Arc<dyn ChatApi>,
    store: Arc<MessageStore>,
}

impl HistoryLoader {
    pub fn new(api: Arc<dyn ChatApi>, store: Arc<MessageStore>) -> Self {
        Self { api, store }
    }

    /// Fetch the conversation's history, oldest first, and seed the store.
    ///
    /// Returns the number of messages fetched. On failure nothing already
    /// in the store is touched, but buffered realtime arrivals are let
    /// through so live traffic keeps rendering; the caller surfaces a
    /// retry affordance and may call this again.
    pub async fn load(&self, conversation_id: &str) -> Result<usize, JobtalkError> {
        match self.api.fetch_messages(conversation_id).await {
            Ok(wire) => {
                let messages: Vec<Message> = wire.into_iter().map(Message::from_wire).collect();
                let count = messages.len();
                self.store.seed_history(messages).await;
                debug!(conversation_id, count, "history loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "history fetch failed");
                self.store.flush_buffered().await;
                Err(e)
            }
        }
    }
}
