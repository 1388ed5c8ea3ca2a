// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Jobtalk workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of a message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Created locally, not yet confirmed by the server.
    Pending,
    /// Confirmed, either via realtime echo or REST response.
    Sent,
    /// Both delivery paths failed. Retriable.
    Failed,
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryState::Pending => write!(f, "pending"),
            DeliveryState::Sent => write!(f, "sent"),
            DeliveryState::Failed => write!(f, "failed"),
        }
    }
}

/// Realtime channel connection state, surfaced to the host as a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error => write!(f, "error"),
        }
    }
}

/// Result of the diagnostic REST health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Server reachable. A connection failure is transport-only.
    Healthy,
    /// Server unreachable or unhealthy, with a reason.
    Unhealthy(String),
}

/// A message within one conversation session.
///
/// Exactly one of `id`/`local_id` acts as the effective key at any time:
/// messages created by the send pipeline start with only `local_id`, and
/// confirmation fills in the server `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Authoritative server identifier. Absent until confirmed.
    pub id: Option<String>,
    /// Client-generated identifier used before `id` exists.
    pub local_id: Option<String>,
    pub conversation_id: String,
    pub sender_id: String,
    /// Raw text content. May contain an embedded job-invite fragment.
    pub body: String,
    /// Client-set optimistically, overwritten by the server timestamp on
    /// confirmation.
    pub sent_at: DateTime<Utc>,
    pub delivery_state: DeliveryState,
}

impl Message {
    /// Stable display key: prefer the server `id`, then `local_id`.
    ///
    /// Historical rows can lack both; those fall back to a composite of
    /// timestamp and sender. Tolerated for legacy data only.
    pub fn display_key(&self) -> String {
        if let Some(ref id) = self.id {
            return id.clone();
        }
        if let Some(ref local_id) = self.local_id {
            return local_id.clone();
        }
        format!("{}-{}", self.sent_at.to_rfc3339(), self.sender_id)
    }

    /// Builds a confirmed message from its wire form.
    pub fn from_wire(wire: WireMessage) -> Self {
        Self {
            id: wire.uuid,
            local_id: None,
            conversation_id: wire.conversation_uuid,
            sender_id: wire.sender_uuid,
            body: wire.content,
            sent_at: wire.send_at,
            delivery_state: DeliveryState::Sent,
        }
    }
}

/// Wire form of a message as the job-board backend serializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Server identifier. Absent on some historical rows.
    #[serde(default)]
    pub uuid: Option<String>,
    pub conversation_uuid: String,
    pub sender_uuid: String,
    pub content: String,
    pub send_at: DateTime<Utc>,
}

/// Server confirmation of a REST send: the authoritative id and timestamp.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub id: String,
    pub sent_at: DateTime<Utc>,
}

/// An inbound event from the realtime hub connection.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// A message was delivered to the joined room.
    MessageReceived(WireMessage),
    /// The server acknowledged a room join. Informational only.
    JoinedConversation(String),
    /// The connection closed, orderly or not.
    Closed { reason: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wire(uuid: Option<&str>) -> WireMessage {
        WireMessage {
            uuid: uuid.map(String::from),
            conversation_uuid: "c1".into(),
            sender_uuid: "s1".into(),
            content: "hello".into(),
            send_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn display_key_prefers_server_id() {
        let mut msg = Message::from_wire(wire(Some("m1")));
        msg.local_id = Some("L1".into());
        assert_eq!(msg.display_key(), "m1");
    }

    #[test]
    fn display_key_falls_back_to_local_id() {
        let mut msg = Message::from_wire(wire(None));
        msg.local_id = Some("L1".into());
        assert_eq!(msg.display_key(), "L1");
    }

    #[test]
    fn display_key_legacy_composite() {
        let msg = Message::from_wire(wire(None));
        assert_eq!(msg.display_key(), format!("{}-s1", msg.sent_at.to_rfc3339()));
    }

    #[test]
    fn from_wire_is_sent() {
        let msg = Message::from_wire(wire(Some("m1")));
        assert_eq!(msg.delivery_state, DeliveryState::Sent);
        assert!(msg.local_id.is_none());
    }

    #[test]
    fn wire_message_camel_case() {
        let json = r#"{
            "uuid": "m1",
            "conversationUuid": "c1",
            "senderUuid": "s1",
            "content": "hi",
            "sendAt": "2026-03-01T12:00:00Z"
        }"#;
        let wire: WireMessage = serde_json::from_str(json).unwrap();
        assert_eq!(wire.uuid.as_deref(), Some("m1"));
        assert_eq!(wire.sender_uuid, "s1");
    }

    #[test]
    fn wire_message_missing_uuid_tolerated() {
        let json = r#"{
            "conversationUuid": "c1",
            "senderUuid": "s1",
            "content": "hi",
            "sendAt": "2026-03-01T12:00:00Z"
        }"#;
        let wire: WireMessage = serde_json::from_str(json).unwrap();
        assert!(wire.uuid.is_none());
    }

    #[test]
    fn state_display() {
        assert_eq!(DeliveryState::Pending.to_string(), "pending");
        assert_eq!(DeliveryState::Sent.to_string(), "sent");
        assert_eq!(DeliveryState::Failed.to_string(), "failed");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::Error.to_string(), "error");
    }
}
