// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST collaborator trait for the job-board backend.

use async_trait::async_trait;

use crate::error::JobtalkError;
use crate::types::{HealthStatus, SendReceipt, WireMessage};

/// The REST surface the chat core needs from the backend.
///
/// The core treats history as one ordered batch, oldest first, regardless of
/// how the backend paginates internally.
#[async_trait]
pub trait ChatApi: Send + Sync + 'static {
    /// Fetches the message history of a conversation, oldest first.
    async fn fetch_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<WireMessage>, JobtalkError>;

    /// Persists a message, returning the authoritative id and timestamp.
    async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<SendReceipt, JobtalkError>;

    /// Lightweight reachability probe.
    ///
    /// Used to distinguish "server unreachable" from "transport-only failure"
    /// when the hub connection fails. Diagnostic only: the reconnect state
    /// machine does not act on the result.
    async fn health_check(&self) -> Result<HealthStatus, JobtalkError>;
}
