// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session facade wiring the store, channel manager, history loader and
//! send pipeline together for one open conversation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use jobtalk_config::ChatConfig;
use jobtalk_core::{ChatApi, ConnectionState, JobtalkError, Message, RealtimeTransport};

use crate::channel::ChannelManager;
use crate::history::HistoryLoader;
use crate::send::SendPipeline;
use crate::store::MessageStore;

/// One chat session, alive while the conversation screen is open.
///
/// [`start`](ChatSession::start) kicks off the realtime connect and the
/// history fetch concurrently; the host renders [`messages`](ChatSession::messages)
/// whenever [`updates`](ChatSession::updates) changes and calls
/// [`close`](ChatSession::close) on teardown.
pub struct ChatSession {
    store: Arc<MessageStore>,
    channel: Arc<ChannelManager>,
    pipeline: SendPipeline,
    history: HistoryLoader,
    conversation_id: String,
    cancel: CancellationToken,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    /// Open a session for one conversation on behalf of `sender_id`.
    pub fn start(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        api: Arc<dyn ChatApi>,
        transport: Arc<dyn RealtimeTransport>,
        config: &ChatConfig,
    ) -> Arc<Self> {
        let conversation_id = conversation_id.into();
        let sender_id = sender_id.into();

        let store = Arc::new(MessageStore::new(Duration::from_secs(
            config.echo_window_secs,
        )));
        let channel = Arc::new(ChannelManager::new(
            transport,
            Arc::clone(&api),
            Arc::clone(&store),
            conversation_id.clone(),
            config,
        ));
        let pipeline = SendPipeline::new(
            Arc::clone(&store),
            Arc::clone(&channel),
            Arc::clone(&api),
            conversation_id.clone(),
            sender_id,
        );
        let history = HistoryLoader::new(api, Arc::clone(&store));

        let cancel = CancellationToken::new();
        let runner = tokio::spawn(Arc::clone(&channel).run(cancel.clone()));

        let session = Arc::new(Self {
            store,
            channel,
            pipeline,
            history,
            conversation_id,
            cancel,
            runner: Mutex::new(Some(runner)),
        });

        // Initial history fetch, concurrent with the realtime connect. The
        // task holds its own handle on the session, so a teardown while it
        // is in flight leaves it to finish against the abandoned store.
        let loading = Arc::clone(&session);
        tokio::spawn(async move {
            if let Err(e) = loading.history.load(&loading.conversation_id).await {
                warn!(conversation_id = %loading.conversation_id, error = %e, "initial history load failed");
            }
        });

        session
    }

    /// Current ordered message list, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.store.snapshot().await
    }

    /// Change notifications for the message list.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Connection status badge feed.
    pub fn connection_status(&self) -> watch::Receiver<ConnectionState> {
        self.channel.status()
    }

    /// Whether sends currently take the realtime path.
    pub async fn realtime_ready(&self) -> bool {
        self.channel.realtime_ready().await
    }

    /// Send a message. Never fails; the outcome lands in the message list.
    /// Returns the new entry's `local_id`.
    pub async fn send(&self, body: &str) -> String {
        self.pipeline.send(body).await
    }

    /// Retry a message whose delivery failed.
    pub async fn retry_failed(&self, local_id: &str) {
        self.pipeline.retry_failed(local_id).await;
    }

    /// Re-fetch history, merging any messages missed while disconnected.
    /// This is also the retry entry point after a failed initial load.
    pub async fn reload_history(&self) -> Result<usize, JobtalkError> {
        self.history.load(&self.conversation_id).await
    }

    /// End the session: leave the room, close the connection and stop the
    /// channel manager. In-flight REST sends are left to complete.
    pub async fn close(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.runner.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "channel manager task panicked");
            }
        }
    }
}
