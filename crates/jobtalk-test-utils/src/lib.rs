// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles shared across the workspace: a scriptable realtime
//! transport and a scriptable REST backend.

mod mock_api;
mod mock_transport;

pub use mock_api::{MockChatApi, SentCall};
pub use mock_transport::{Invocation, MockConnection, MockTransport};

use chrono::Utc;
use jobtalk_core::WireMessage;

/// Build a wire message with `sendAt` set to now.
pub fn wire_message(
    uuid: Option<&str>,
    conversation_id: &str,
    sender_id: &str,
    body: &str,
) -> WireMessage {
    WireMessage {
        uuid: uuid.map(String::from),
        conversation_uuid: conversation_id.to_string(),
        sender_uuid: sender_id.to_string(),
        content: body.to_string(),
        send_at: Utc::now(),
    }
}
