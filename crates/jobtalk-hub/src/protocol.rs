// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol for the chat hub.
//!
//! The hub speaks a JSON message protocol: each frame is a JSON object
//! followed by a 0x1e record separator, and a handshake frame selecting the
//! JSON protocol opens every connection. Frame kinds are discriminated by a
//! numeric `type` field: 1 invocation, 3 completion, 6 ping, 7 close.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record separator terminating every frame.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Numeric frame type for invocations.
pub const TYPE_INVOCATION: u8 = 1;
/// Numeric frame type for invocation completions.
pub const TYPE_COMPLETION: u8 = 3;
/// Numeric frame type for keepalive pings.
pub const TYPE_PING: u8 = 6;
/// Numeric frame type for connection close.
pub const TYPE_CLOSE: u8 = 7;

/// The opening handshake frame: `{"protocol":"json","version":1}`.
pub fn handshake_frame() -> String {
    format!(r#"{{"protocol":"json","version":1}}{RECORD_SEPARATOR}"#)
}

/// Server handshake response. Empty object on success.
#[derive(Debug, Clone, Deserialize)]
pub struct HandshakeResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// A decoded hub frame.
#[derive(Debug, Clone, PartialEq)]
pub enum HubFrame {
    /// A method invocation. Inbound invocations carry the hub's events
    /// (`ReceiveMessage`, `JoinedConversation`).
    Invocation {
        invocation_id: Option<String>,
        target: String,
        arguments: Vec<Value>,
    },
    /// Completion of an invocation the client issued with an id.
    Completion {
        invocation_id: String,
        error: Option<String>,
    },
    /// Keepalive. Ignored.
    Ping,
    /// Orderly close, optionally with a reason.
    Close { error: Option<String> },
    /// A frame type this client does not handle.
    Other(u8),
}

/// Raw JSON shape shared by all frame kinds.
#[derive(Debug, Serialize, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(rename = "invocationId", skip_serializing_if = "Option::is_none", default)]
    invocation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    arguments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    error: Option<String>,
}

/// Encodes an invocation frame, terminated by the record separator.
///
/// `invocation_id` of `None` makes the invocation fire-and-forget: the
/// server sends no completion for it.
pub fn encode_invocation(
    invocation_id: Option<String>,
    target: &str,
    arguments: Vec<Value>,
) -> String {
    let raw = RawFrame {
        kind: TYPE_INVOCATION,
        invocation_id,
        target: Some(target.to_string()),
        arguments: Some(arguments),
        error: None,
    };
    // RawFrame serialization cannot fail: it is a closed struct of JSON types.
    let mut frame = serde_json::to_string(&raw).expect("frame serialization");
    frame.push(RECORD_SEPARATOR);
    frame
}

/// Decodes one frame body (without its record separator).
pub fn decode_frame(body: &str) -> Result<HubFrame, serde_json::Error> {
    let raw: RawFrame = serde_json::from_str(body)?;
    Ok(match raw.kind {
        TYPE_INVOCATION => HubFrame::Invocation {
            invocation_id: raw.invocation_id,
            target: raw.target.unwrap_or_default(),
            arguments: raw.arguments.unwrap_or_default(),
        },
        TYPE_COMPLETION => HubFrame::Completion {
            invocation_id: raw.invocation_id.unwrap_or_default(),
            error: raw.error,
        },
        TYPE_PING => HubFrame::Ping,
        TYPE_CLOSE => HubFrame::Close { error: raw.error },
        other => HubFrame::Other(other),
    })
}

/// Incremental frame decoder.
///
/// WebSocket text messages usually carry whole frames, but the protocol does
/// not require it; the decoder buffers partial trailing data across pushes.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends incoming text and returns all complete frame bodies.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find(RECORD_SEPARATOR) {
            let frame: String = self.buffer[..pos].to_string();
            self.buffer.drain(..pos + RECORD_SEPARATOR.len_utf8());
            if !frame.is_empty() {
                frames.push(frame);
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_frame_is_terminated() {
        let frame = handshake_frame();
        assert!(frame.ends_with(RECORD_SEPARATOR));
        let body = frame.trim_end_matches(RECORD_SEPARATOR);
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert_eq!(parsed["protocol"], "json");
        assert_eq!(parsed["version"], 1);
    }

    #[test]
    fn encode_invocation_with_id() {
        let frame = encode_invocation(
            Some("1".into()),
            "SendMessageToConversation",
            vec!["c1".into(), "s1".into(), "hi".into()],
        );
        let body = frame.trim_end_matches(RECORD_SEPARATOR);
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert_eq!(parsed["type"], 1);
        assert_eq!(parsed["invocationId"], "1");
        assert_eq!(parsed["target"], "SendMessageToConversation");
        assert_eq!(parsed["arguments"][2], "hi");
    }

    #[test]
    fn encode_invocation_fire_and_forget_omits_id() {
        let frame = encode_invocation(None, "JoinConversation", vec!["c1".into()]);
        let body = frame.trim_end_matches(RECORD_SEPARATOR);
        let parsed: Value = serde_json::from_str(body).unwrap();
        assert!(parsed.get("invocationId").is_none());
    }

    #[test]
    fn decode_invocation_frame() {
        let frame = decode_frame(
            r#"{"type":1,"target":"ReceiveMessage","arguments":[{"content":"hi"}]}"#,
        )
        .unwrap();
        match frame {
            HubFrame::Invocation {
                target, arguments, ..
            } => {
                assert_eq!(target, "ReceiveMessage");
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn decode_completion_with_error() {
        let frame =
            decode_frame(r#"{"type":3,"invocationId":"4","error":"room is closed"}"#).unwrap();
        assert_eq!(
            frame,
            HubFrame::Completion {
                invocation_id: "4".into(),
                error: Some("room is closed".into()),
            }
        );
    }

    #[test]
    fn decode_ping_and_close() {
        assert_eq!(decode_frame(r#"{"type":6}"#).unwrap(), HubFrame::Ping);
        assert_eq!(
            decode_frame(r#"{"type":7,"error":"shutting down"}"#).unwrap(),
            HubFrame::Close {
                error: Some("shutting down".into())
            }
        );
    }

    #[test]
    fn decode_unknown_type() {
        assert_eq!(decode_frame(r#"{"type":42}"#).unwrap(), HubFrame::Other(42));
    }

    #[test]
    fn decoder_splits_multiple_frames_in_one_message() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push("{\"type\":6}\u{1e}{\"type\":6}\u{1e}");
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn decoder_buffers_partial_frames() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push("{\"type\"").is_empty());
        let frames = decoder.push(":6}\u{1e}");
        assert_eq!(frames, vec!["{\"type\":6}".to_string()]);
    }

    #[test]
    fn decoder_ignores_empty_frames() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push("\u{1e}\u{1e}").is_empty());
    }
}
