// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic send pipeline.
//!
//! Every send is appended to the store immediately as PENDING, then
//! delivered realtime-first with a REST fallback. Failures never reach the
//! caller; they resolve into the entry's delivery state.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use jobtalk_core::{ChatApi, DeliveryState, Message};

use crate::channel::ChannelManager;
use crate::store::MessageStore;

/// Orchestrates optimistic send, realtime attempt, REST fallback and
/// confirmation for one session.
pub struct SendPipeline {
    store: Arc<MessageStore>,
    channel: Arc<ChannelManager>,
    api: Arc<dyn ChatApi>,
    conversation_id: String,
    sender_id: String,
}

impl SendPipeline {
    pub fn new(
        store: Arc<MessageStore>,
        channel: Arc<ChannelManager>,
        api: Arc<dyn ChatApi>,
        conversation_id: String,
        sender_id: String,
    ) -> Self {
        Self {
            store,
            channel,
            api,
            conversation_id,
            sender_id,
        }
    }

    /// Send a message. Never fails from the caller's point of view; the
    /// outcome lands in the store as SENT or FAILED. Returns the entry's
    /// `local_id`.
    pub async fn send(&self, body: &str) -> String {
        let local_id = Uuid::new_v4().to_string();
        let message = Message {
            id: None,
            local_id: Some(local_id.clone()),
            conversation_id: self.conversation_id.clone(),
            sender_id: self.sender_id.clone(),
            body: body.to_string(),
            sent_at: Utc::now(),
            delivery_state: DeliveryState::Pending,
        };
        self.store.append_local(message).await;
        self.deliver(&local_id, body).await;
        local_id
    }

    /// Retry a failed message, reusing its `local_id` and body.
    pub async fn retry_failed(&self, local_id: &str) {
        match self.store.reset_for_retry(local_id).await {
            Some(body) => self.deliver(local_id, &body).await,
            None => debug!(local_id, "no failed message to retry"),
        }
    }

    async fn deliver(&self, local_id: &str, body: &str) {
        match self.channel.send_realtime(&self.sender_id, body).await {
            Ok(true) => {
                // The hub echoes the message back; the store's merge rule
                // confirms the pending entry when it arrives.
                debug!(local_id, "realtime send accepted, awaiting echo");
            }
            Ok(false) => {
                self.store.mark_sent(local_id).await;
                self.persist_best_effort(local_id.to_string(), body.to_string());
            }
            Err(e) => {
                debug!(local_id, error = %e, "realtime path unavailable, falling back to REST");
                self.rest_send(local_id, body).await;
            }
        }
    }

    /// Durability for transports that acknowledge without echoing: persist
    /// via REST in the background. A failure here is logged but does not
    /// revert the SENT state.
    fn persist_best_effort(&self, local_id: String, body: String) {
        let store = Arc::clone(&self.store);
        let api = Arc::clone(&self.api);
        let conversation_id = self.conversation_id.clone();
        let sender_id = self.sender_id.clone();
        tokio::spawn(async move {
            match api.send_message(&conversation_id, &sender_id, &body).await {
                Ok(receipt) => store.resolve_confirmed(&local_id, &receipt).await,
                Err(e) => warn!(local_id, error = %e, "background persistence failed"),
            }
        });
    }

    async fn rest_send(&self, local_id: &str, body: &str) {
        match self
            .api
            .send_message(&self.conversation_id, &self.sender_id, body)
            .await
        {
            Ok(receipt) => self.store.resolve_confirmed(local_id, &receipt).await,
            Err(e) => {
                warn!(local_id, error = %e, "REST send failed, marking message failed");
                self.store.mark_failed(local_id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use jobtalk_config::ChatConfig;
    use jobtalk_core::HubEvent;
    use jobtalk_test_utils::{MockChatApi, MockTransport};

    struct Fixture {
        store: Arc<MessageStore>,
        channel: Arc<ChannelManager>,
        api: Arc<MockChatApi>,
        transport: Arc<MockTransport>,
        pipeline: SendPipeline,
        cancel: CancellationToken,
    }

    fn fixture(transport: MockTransport) -> Fixture {
        let transport = Arc::new(transport);
        let api = Arc::new(MockChatApi::new());
        let store = Arc::new(MessageStore::new(Duration::from_secs(60)));
        let channel = Arc::new(ChannelManager::new(
            Arc::clone(&transport) as _,
            Arc::clone(&api) as _,
            Arc::clone(&store),
            "c1".to_string(),
            &ChatConfig::default(),
        ));
        let pipeline = SendPipeline::new(
            Arc::clone(&store),
            Arc::clone(&channel),
            Arc::clone(&api) as _,
            "c1".to_string(),
            "s1".to_string(),
        );
        Fixture {
            store,
            channel,
            api,
            transport,
            pipeline,
            cancel: CancellationToken::new(),
        }
    }

    async fn connect_and_join(fx: &Fixture) {
        tokio::spawn(Arc::clone(&fx.channel).run(fx.cancel.clone()));
        tokio::time::timeout(Duration::from_secs(5), async {
            while fx.transport.connections().await.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        let connection = fx.transport.latest_connection().await.unwrap();
        connection
            .inject_event(HubEvent::JoinedConversation("c1".into()))
            .await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while !fx.channel.realtime_ready().await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn disconnected_send_falls_back_to_rest() {
        let fx = fixture(MockTransport::new());
        fx.store.seed_history(Vec::new()).await;
        // Channel never run: realtime path unavailable.
        let local_id = fx.pipeline.send("hi").await;

        let snapshot = fx.store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].delivery_state, DeliveryState::Sent);
        assert_eq!(snapshot[0].id.as_deref(), Some("rest-1"));
        assert_eq!(snapshot[0].local_id.as_deref(), Some(local_id.as_str()));
        assert_eq!(fx.api.sent_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn echoing_transport_leaves_entry_pending_until_echo() {
        let fx = fixture(MockTransport::new());
        fx.store.seed_history(Vec::new()).await;
        connect_and_join(&fx).await;

        fx.pipeline.send("see you").await;
        let snapshot = fx.store.snapshot().await;
        assert_eq!(snapshot[0].delivery_state, DeliveryState::Pending);
        // No REST call on the echo path.
        assert!(fx.api.sent_calls().await.is_empty());

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn non_echoing_transport_marks_sent_and_persists() {
        let fx = fixture(MockTransport::without_echo());
        fx.store.seed_history(Vec::new()).await;
        connect_and_join(&fx).await;

        fx.pipeline.send("hello").await;
        assert_eq!(
            fx.store.snapshot().await[0].delivery_state,
            DeliveryState::Sent
        );

        // Background persistence fills in the server id.
        tokio::time::timeout(Duration::from_secs(5), async {
            while fx.store.snapshot().await[0].id.is_none() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("background persistence never confirmed");
        assert_eq!(fx.api.sent_calls().await.len(), 1);

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn background_persistence_failure_keeps_sent_state() {
        let fx = fixture(MockTransport::without_echo());
        fx.store.seed_history(Vec::new()).await;
        connect_and_join(&fx).await;
        fx.api.push_send_error("persist down").await;

        fx.pipeline.send("hello").await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while fx.api.sent_calls().await.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        let snapshot = fx.store.snapshot().await;
        assert_eq!(snapshot[0].delivery_state, DeliveryState::Sent);
        assert!(snapshot[0].id.is_none());

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn realtime_error_falls_back_to_rest() {
        let fx = fixture(MockTransport::new());
        fx.store.seed_history(Vec::new()).await;
        connect_and_join(&fx).await;

        let connection = fx.transport.latest_connection().await.unwrap();
        connection.fail_next_send("room gone").await;

        fx.pipeline.send("hi").await;
        let snapshot = fx.store.snapshot().await;
        assert_eq!(snapshot[0].delivery_state, DeliveryState::Sent);
        assert_eq!(snapshot[0].id.as_deref(), Some("rest-1"));

        fx.cancel.cancel();
    }

    #[tokio::test]
    async fn both_paths_failing_marks_failed_then_retry_succeeds() {
        let fx = fixture(MockTransport::new());
        fx.store.seed_history(Vec::new()).await;
        fx.api.push_send_error("backend down").await;

        let local_id = fx.pipeline.send("hi").await;
        assert_eq!(
            fx.store.snapshot().await[0].delivery_state,
            DeliveryState::Failed
        );

        fx.pipeline.retry_failed(&local_id).await;
        let snapshot = fx.store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].delivery_state, DeliveryState::Sent);
        assert_eq!(snapshot[0].id.as_deref(), Some("rest-1"));
        assert_eq!(fx.api.sent_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn retry_of_unknown_id_is_a_no_op() {
        let fx = fixture(MockTransport::new());
        fx.store.seed_history(Vec::new()).await;
        fx.pipeline.retry_failed("nope").await;
        assert!(fx.store.snapshot().await.is_empty());
        assert!(fx.api.sent_calls().await.is_empty());
    }
}
