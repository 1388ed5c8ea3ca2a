// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock REST backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};

use jobtalk_core::{ChatApi, HealthStatus, JobtalkError, SendReceipt, WireMessage};

/// A captured `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
}

/// A mock job-board backend.
///
/// History and send outcomes are scripted per call; unscripted calls succeed
/// (empty history, generated receipt ids `rest-1`, `rest-2`, ...).
pub struct MockChatApi {
    history: Mutex<VecDeque<Result<Vec<WireMessage>, String>>>,
    history_gate: Mutex<Option<std::sync::Arc<Semaphore>>>,
    send_outcomes: Mutex<VecDeque<Result<SendReceipt, String>>>,
    sent_calls: Mutex<Vec<SentCall>>,
    history_fetches: AtomicUsize,
    receipt_counter: AtomicUsize,
    health: Mutex<HealthStatus>,
    health_probes: AtomicUsize,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
            history_gate: Mutex::new(None),
            send_outcomes: Mutex::new(VecDeque::new()),
            sent_calls: Mutex::new(Vec::new()),
            history_fetches: AtomicUsize::new(0),
            receipt_counter: AtomicUsize::new(0),
            health: Mutex::new(HealthStatus::Healthy),
            health_probes: AtomicUsize::new(0),
        }
    }

    /// Queue one history response.
    pub async fn push_history(&self, messages: Vec<WireMessage>) {
        self.history.lock().await.push_back(Ok(messages));
    }

    /// Queue one failing history response.
    pub async fn push_history_error(&self, message: &str) {
        self.history.lock().await.push_back(Err(message.to_string()));
    }

    /// Hold every history fetch until [`release_history`](Self::release_history).
    pub async fn hold_history(&self) {
        *self.history_gate.lock().await = Some(std::sync::Arc::new(Semaphore::new(0)));
    }

    /// Release held history fetches.
    pub async fn release_history(&self) {
        if let Some(gate) = self.history_gate.lock().await.take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    /// Queue one send outcome.
    pub async fn push_send_outcome(&self, outcome: Result<SendReceipt, &str>) {
        self.send_outcomes
            .lock()
            .await
            .push_back(outcome.map_err(String::from));
    }

    /// Queue one failing send outcome.
    pub async fn push_send_error(&self, message: &str) {
        self.push_send_outcome(Err(message)).await;
    }

    /// All captured `send_message` calls, in order.
    pub async fn sent_calls(&self) -> Vec<SentCall> {
        self.sent_calls.lock().await.clone()
    }

    pub async fn set_health(&self, status: HealthStatus) {
        *self.health.lock().await = status;
    }

    /// Number of health probes observed.
    pub fn health_probes(&self) -> usize {
        self.health_probes.load(Ordering::SeqCst)
    }

    /// Number of completed history fetches, successful or not.
    pub fn history_fetches(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockChatApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn fetch_messages(
        &self,
        _conversation_id: &str,
    ) -> Result<Vec<WireMessage>, JobtalkError> {
        let gate = self.history_gate.lock().await.clone();
        if let Some(gate) = gate {
            // Held until the test releases history. The permit is forgotten
            // so the gate stays open for later fetches.
            let permit = gate
                .acquire()
                .await
                .map_err(|_| JobtalkError::Internal("history gate closed".to_string()))?;
            permit.forget();
        }

        let outcome = match self.history.lock().await.pop_front() {
            Some(Ok(messages)) => Ok(messages),
            Some(Err(message)) => Err(JobtalkError::HistoryFetch {
                message,
                source: None,
            }),
            None => Ok(Vec::new()),
        };
        self.history_fetches.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<SendReceipt, JobtalkError> {
        self.sent_calls.lock().await.push(SentCall {
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
        });

        match self.send_outcomes.lock().await.pop_front() {
            Some(Ok(receipt)) => Ok(receipt),
            Some(Err(message)) => Err(JobtalkError::RestSend {
                message,
                source: None,
            }),
            None => {
                let n = self.receipt_counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(SendReceipt {
                    id: format!("rest-{n}"),
                    sent_at: Utc::now(),
                })
            }
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, JobtalkError> {
        self.health_probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.health.lock().await.clone())
    }
}
