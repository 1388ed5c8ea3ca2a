// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime channel manager: owns the hub connection for one session.
//!
//! [`ChannelManager::run`] drives the connect / pump / reconnect loop until
//! the session's cancellation token fires. Connection failures never leave
//! this module; they surface only through the [`ConnectionState`] watch and
//! the backoff schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use jobtalk_config::ChatConfig;
use jobtalk_core::{
    ChatApi, ConnectionState, HealthStatus, HubEvent, JobtalkError, Message, RealtimeConnection,
    RealtimeTransport,
};

use crate::store::MessageStore;

struct ActiveConnection {
    connection: Arc<dyn RealtimeConnection>,
    /// Set once the server acknowledges the room join. Realtime sends are
    /// gated on this.
    joined: bool,
}

/// Sole owner of the persistent hub connection for one conversation.
/// All realtime traffic goes through this manager.
pub struct ChannelManager {
    transport: Arc<dyn RealtimeTransport>,
    api: Arc<dyn ChatApi>,
    store: Arc<MessageStore>,
    conversation_id: String,
    /// Reconnect delays, last entry repeating as the cap.
    backoff: Vec<Duration>,
    state: watch::Sender<ConnectionState>,
    active: Mutex<Option<ActiveConnection>>,
}

impl ChannelManager {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        api: Arc<dyn ChatApi>,
        store: Arc<MessageStore>,
        conversation_id: String,
        config: &ChatConfig,
    ) -> Self {
        let mut backoff: Vec<Duration> = config
            .reconnect_backoff_secs
            .iter()
            .map(|s| Duration::from_secs(*s))
            .collect();
        if backoff.is_empty() {
            backoff.push(Duration::ZERO);
        }
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            api,
            store,
            conversation_id,
            backoff,
            state,
            active: Mutex::new(None),
        }
    }

    /// Observe connection state transitions.
    pub fn status(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Whether the channel is connected and the room join was acknowledged.
    pub async fn realtime_ready(&self) -> bool {
        self.active.lock().await.as_ref().is_some_and(|a| a.joined)
    }

    /// Send through the live connection. Fails immediately when the channel
    /// is not connected with an acknowledged join; the caller falls back to
    /// REST. Returns whether the transport echoes the send back as an
    /// inbound event.
    pub async fn send_realtime(&self, sender_id: &str, body: &str) -> Result<bool, JobtalkError> {
        let connection = {
            let active = self.active.lock().await;
            match active.as_ref() {
                Some(a) if a.joined => Arc::clone(&a.connection),
                _ => {
                    return Err(JobtalkError::RealtimeSend {
                        message: "channel not connected with an acknowledged join".to_string(),
                        source: None,
                    });
                }
            }
        };
        connection
            .send_message(&self.conversation_id, sender_id, body)
            .await?;
        Ok(connection.echoes_sends())
    }

    /// Run the connection lifecycle until `cancel` fires.
    ///
    /// Handshake failures and transport drops schedule a reconnect on the
    /// configured backoff; consecutive failures walk the schedule and a
    /// success resets it.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut consecutive_failures = 0usize;

        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.state.send_replace(ConnectionState::Connecting);

            let connected = tokio::select! {
                result = self.transport.connect() => result,
                _ = cancel.cancelled() => break,
            };

            match connected {
                Ok(connection) => {
                    consecutive_failures = 0;
                    if let Err(e) = connection.join_conversation(&self.conversation_id).await {
                        warn!(error = %e, "room join invocation failed");
                    }
                    *self.active.lock().await = Some(ActiveConnection {
                        connection: Arc::clone(&connection),
                        joined: false,
                    });
                    self.state.send_replace(ConnectionState::Connected);
                    info!(conversation_id = %self.conversation_id, "realtime channel connected");

                    let cancelled = self.pump(&connection, &cancel).await;
                    *self.active.lock().await = None;

                    if cancelled {
                        if let Err(e) = connection.leave_conversation(&self.conversation_id).await
                        {
                            debug!(error = %e, "room leave failed during teardown");
                        }
                        if let Err(e) = connection.close().await {
                            debug!(error = %e, "connection close failed during teardown");
                        }
                        break;
                    }
                    self.state.send_replace(ConnectionState::Disconnected);
                }
                Err(e) => {
                    self.state.send_replace(ConnectionState::Error);
                    warn!(error = %e, "realtime connect failed");
                    self.probe_backend().await;
                }
            }

            let delay = self.backoff[consecutive_failures.min(self.backoff.len() - 1)];
            consecutive_failures += 1;
            if !delay.is_zero() {
                debug!(delay_secs = delay.as_secs(), "waiting before reconnect");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => break,
                }
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        debug!("realtime channel manager stopped");
    }

    /// Dispatch inbound events until the connection drops or the session
    /// ends. Returns `true` when the session was cancelled.
    async fn pump(&self, connection: &Arc<dyn RealtimeConnection>, cancel: &CancellationToken) -> bool {
        loop {
            let event = tokio::select! {
                event = connection.next_event() => event,
                _ = cancel.cancelled() => return true,
            };

            match event {
                Ok(HubEvent::MessageReceived(wire)) => {
                    if wire.conversation_uuid != self.conversation_id {
                        debug!(conversation_id = %wire.conversation_uuid, "ignoring message for another room");
                        continue;
                    }
                    self.store.ingest_remote(Message::from_wire(wire)).await;
                }
                Ok(HubEvent::JoinedConversation(id)) => {
                    if id == self.conversation_id {
                        if let Some(active) = self.active.lock().await.as_mut() {
                            active.joined = true;
                        }
                        debug!(conversation_id = %id, "room join acknowledged");
                    }
                }
                Ok(HubEvent::Closed { reason }) => {
                    warn!(reason = reason.as_deref().unwrap_or("none"), "realtime connection closed");
                    return false;
                }
                Err(e) => {
                    warn!(error = %e, "realtime event stream error");
                    return false;
                }
            }
        }
    }

    /// Diagnostic probe distinguishing "server unreachable" from a
    /// transport-only failure. Does not affect the reconnect schedule.
    async fn probe_backend(&self) {
        match self.api.health_check().await {
            Ok(HealthStatus::Healthy) => {
                debug!("backend reachable; connection failure is transport-only");
            }
            Ok(HealthStatus::Unhealthy(reason)) => {
                warn!(reason = reason.as_str(), "backend unreachable");
            }
            Err(e) => warn!(error = %e, "health probe failed"),
        }
    }
}
