// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock realtime transport for deterministic testing.
//!
//! [`MockTransport`] implements `RealtimeTransport` with scripted connect
//! outcomes; each successful connect yields a [`MockConnection`] with
//! injectable inbound events and captured invocations for assertion.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use jobtalk_core::{HubEvent, JobtalkError, RealtimeConnection, RealtimeTransport};

/// A captured invocation against a mock connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Join(String),
    Leave(String),
    Send {
        conversation_id: String,
        sender_id: String,
        body: String,
    },
}

/// A mock hub transport for testing.
pub struct MockTransport {
    /// Scripted connect outcomes, consumed front to back. When exhausted,
    /// connects succeed.
    connect_script: Mutex<VecDeque<Result<(), String>>>,
    connections: Mutex<Vec<Arc<MockConnection>>>,
    connect_attempts: AtomicUsize,
    attempt_times: Mutex<Vec<tokio::time::Instant>>,
    echoes_sends: bool,
}

impl MockTransport {
    /// Create a transport whose connects always succeed, echo-capable.
    pub fn new() -> Self {
        Self {
            connect_script: Mutex::new(VecDeque::new()),
            connections: Mutex::new(Vec::new()),
            connect_attempts: AtomicUsize::new(0),
            attempt_times: Mutex::new(Vec::new()),
            echoes_sends: true,
        }
    }

    /// Create a transport whose connections do not echo sends back.
    pub fn without_echo() -> Self {
        Self {
            echoes_sends: false,
            ..Self::new()
        }
    }

    /// Make the next `n` connect attempts fail with a handshake error.
    pub async fn script_connect_failures(&self, n: usize) {
        let mut script = self.connect_script.lock().await;
        for _ in 0..n {
            script.push_back(Err("handshake refused".to_string()));
        }
    }

    /// Number of connect attempts observed so far.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Instants at which each connect attempt was made. Deterministic under
    /// `tokio::test(start_paused = true)`.
    pub async fn attempt_times(&self) -> Vec<tokio::time::Instant> {
        self.attempt_times.lock().await.clone()
    }

    /// The most recently established connection.
    pub async fn latest_connection(&self) -> Option<Arc<MockConnection>> {
        self.connections.lock().await.last().cloned()
    }

    /// All connections established so far, in order.
    pub async fn connections(&self) -> Vec<Arc<MockConnection>> {
        self.connections.lock().await.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    async fn connect(&self) -> Result<Arc<dyn RealtimeConnection>, JobtalkError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.attempt_times.lock().await.push(tokio::time::Instant::now());

        if let Some(outcome) = self.connect_script.lock().await.pop_front()
            && let Err(message) = outcome
        {
            return Err(JobtalkError::Connection {
                message,
                source: None,
            });
        }

        let connection = Arc::new(MockConnection::new(self.echoes_sends));
        self.connections.lock().await.push(Arc::clone(&connection));
        Ok(connection)
    }
}

/// One mock hub connection.
///
/// Events injected via [`inject_event`](MockConnection::inject_event) are
/// returned by `next_event()` in order; invocations are captured for
/// assertion.
pub struct MockConnection {
    events: Mutex<VecDeque<HubEvent>>,
    notify: Notify,
    invocations: Mutex<Vec<Invocation>>,
    send_errors: Mutex<VecDeque<String>>,
    echoes_sends: bool,
    closed: AtomicBool,
}

impl MockConnection {
    fn new(echoes_sends: bool) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            invocations: Mutex::new(Vec::new()),
            send_errors: Mutex::new(VecDeque::new()),
            echoes_sends,
            closed: AtomicBool::new(false),
        }
    }

    /// Inject an inbound event. The next call to `next_event()` returns it.
    pub async fn inject_event(&self, event: HubEvent) {
        self.events.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Simulate a transport drop: the event stream yields `Closed`.
    pub async fn drop_connection(&self) {
        self.inject_event(HubEvent::Closed {
            reason: Some("transport dropped".to_string()),
        })
        .await;
    }

    /// Make the next realtime send fail with the given message.
    pub async fn fail_next_send(&self, message: &str) {
        self.send_errors.lock().await.push_back(message.to_string());
    }

    /// All invocations captured so far.
    pub async fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().await.clone()
    }

    /// Whether `close()` was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RealtimeConnection for MockConnection {
    async fn join_conversation(&self, conversation_id: &str) -> Result<(), JobtalkError> {
        self.invocations
            .lock()
            .await
            .push(Invocation::Join(conversation_id.to_string()));
        Ok(())
    }

    async fn leave_conversation(&self, conversation_id: &str) -> Result<(), JobtalkError> {
        self.invocations
            .lock()
            .await
            .push(Invocation::Leave(conversation_id.to_string()));
        Ok(())
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<(), JobtalkError> {
        self.invocations.lock().await.push(Invocation::Send {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
        });

        if let Some(message) = self.send_errors.lock().await.pop_front() {
            return Err(JobtalkError::RealtimeSend {
                message,
                source: None,
            });
        }
        Ok(())
    }

    async fn next_event(&self) -> Result<HubEvent, JobtalkError> {
        loop {
            {
                let mut events = self.events.lock().await;
                if let Some(event) = events.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }

    fn echoes_sends(&self) -> bool {
        self.echoes_sends
    }

    async fn close(&self) -> Result<(), JobtalkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
