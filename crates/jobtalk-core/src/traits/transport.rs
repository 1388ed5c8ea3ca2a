// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime hub transport traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::JobtalkError;
use crate::types::HubEvent;

/// Factory for realtime hub connections.
///
/// The channel manager calls [`connect`](RealtimeTransport::connect) once per
/// reconnect attempt; each call performs a fresh handshake and yields a new
/// connection.
#[async_trait]
pub trait RealtimeTransport: Send + Sync + 'static {
    async fn connect(&self) -> Result<Arc<dyn RealtimeConnection>, JobtalkError>;
}

/// One live hub connection.
///
/// Exclusively owned by the channel manager for its lifetime; the send
/// pipeline reaches it only through the manager. All methods take `&self`;
/// implementations serialize internally.
#[async_trait]
pub trait RealtimeConnection: Send + Sync {
    /// Joins the delivery room for a conversation. Fire-and-forget: the
    /// acknowledgment arrives later as [`HubEvent::JoinedConversation`].
    async fn join_conversation(&self, conversation_id: &str) -> Result<(), JobtalkError>;

    /// Leaves the conversation's room.
    async fn leave_conversation(&self, conversation_id: &str) -> Result<(), JobtalkError>;

    /// Sends a message to the conversation's room, waiting for the server's
    /// invocation acknowledgment.
    async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<(), JobtalkError>;

    /// Returns the next inbound event. Resolves to [`HubEvent::Closed`] on an
    /// orderly close and to `Err` on a transport fault; the manager treats
    /// both as a drop.
    async fn next_event(&self) -> Result<HubEvent, JobtalkError>;

    /// Whether a successful send is echoed back as a
    /// [`HubEvent::MessageReceived`] to the sender. Echo-capable transports
    /// let the store reconcile PENDING entries from the echo; the send
    /// pipeline marks SENT directly otherwise.
    fn echoes_sends(&self) -> bool;

    /// Closes the connection.
    async fn close(&self) -> Result<(), JobtalkError>;
}
