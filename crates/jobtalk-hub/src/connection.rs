// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket hub connection implementing the realtime transport traits.
//!
//! [`HubTransport`] dials the hub and performs the protocol handshake;
//! [`HubConnection`] multiplexes one socket between outbound invocations and
//! the inbound event stream. Completions are routed back to the invocation
//! that is waiting on them; everything else surfaces through
//! [`next_event`](jobtalk_core::RealtimeConnection::next_event).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use jobtalk_config::HubConfig;
use jobtalk_core::{HubEvent, JobtalkError, RealtimeConnection, RealtimeTransport, WireMessage};

use crate::protocol::{self, FrameDecoder, HandshakeResponse, HubFrame};

/// Inbound hub event targets.
const TARGET_RECEIVE_MESSAGE: &str = "ReceiveMessage";
const TARGET_JOINED_CONVERSATION: &str = "JoinedConversation";

/// Outbound hub methods.
const METHOD_JOIN: &str = "JoinConversation";
const METHOD_LEAVE: &str = "LeaveConversation";
const METHOD_SEND: &str = "SendMessageToConversation";

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Connection factory for the chat hub.
pub struct HubTransport {
    url: String,
    handshake_timeout: Duration,
    invoke_timeout: Duration,
}

impl HubTransport {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            url: config.url.clone(),
            handshake_timeout: Duration::from_secs(config.handshake_timeout_secs),
            invoke_timeout: Duration::from_secs(config.invoke_timeout_secs),
        }
    }
}

#[async_trait]
impl RealtimeTransport for HubTransport {
    async fn connect(&self) -> Result<Arc<dyn RealtimeConnection>, JobtalkError> {
        let connect = async {
            let (mut ws, _) =
                connect_async(self.url.as_str())
                    .await
                    .map_err(|e| JobtalkError::Connection {
                        message: format!("websocket connect failed: {e}"),
                        source: Some(Box::new(e)),
                    })?;

            ws.send(WsMessage::Text(protocol::handshake_frame().into()))
                .await
                .map_err(|e| JobtalkError::Connection {
                    message: format!("handshake send failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            // The handshake response is the first frame; the same websocket
            // message may already carry hub frames behind it.
            let mut decoder = FrameDecoder::new();
            let mut leftover = VecDeque::new();
            loop {
                let msg = ws.next().await.ok_or_else(|| JobtalkError::Connection {
                    message: "socket closed during handshake".to_string(),
                    source: None,
                })?;
                let msg = msg.map_err(|e| JobtalkError::Connection {
                    message: format!("handshake read failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

                let WsMessage::Text(text) = msg else { continue };
                let mut frames: VecDeque<String> = decoder.push(text.as_str()).into();
                let Some(first) = frames.pop_front() else {
                    continue;
                };

                let response: HandshakeResponse =
                    serde_json::from_str(&first).map_err(|e| JobtalkError::Connection {
                        message: format!("invalid handshake response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                if let Some(error) = response.error {
                    return Err(JobtalkError::Connection {
                        message: format!("handshake rejected: {error}"),
                        source: None,
                    });
                }

                leftover = frames;
                break;
            }

            debug!(url = self.url.as_str(), "hub handshake complete");
            let (sink, source) = ws.split();
            Ok(HubConnection {
                sink: Mutex::new(sink),
                reader: Mutex::new(Reader {
                    source,
                    decoder: FrameDecoder::new(),
                    queued: leftover,
                }),
                invoke_timeout: self.invoke_timeout,
                pending: Mutex::new(HashMap::new()),
                next_invocation_id: AtomicU64::new(1),
            })
        };

        let connection: HubConnection = tokio::time::timeout(self.handshake_timeout, connect)
            .await
            .map_err(|_| JobtalkError::Timeout {
                duration: self.handshake_timeout,
            })??;

        Ok(Arc::new(connection))
    }
}

/// One live hub connection.
pub struct HubConnection {
    sink: Mutex<WsSink>,
    reader: Mutex<Reader>,
    invoke_timeout: Duration,
    pending: Mutex<HashMap<String, oneshot::Sender<Option<String>>>>,
    next_invocation_id: AtomicU64,
}

/// Inbound half: socket stream plus frame bodies not yet processed.
struct Reader {
    source: WsSource,
    decoder: FrameDecoder,
    queued: VecDeque<String>,
}

impl HubConnection {
    async fn send_frame(&self, frame: String) -> Result<(), JobtalkError> {
        self.sink
            .lock()
            .await
            .send(WsMessage::Text(frame.into()))
            .await
            .map_err(|e| JobtalkError::Connection {
                message: format!("frame send failed: {e}"),
                source: Some(Box::new(e)),
            })
    }

    /// Routes a completion frame to whichever invocation awaits it.
    async fn route_completion(&self, invocation_id: String, error: Option<String>) {
        let waiter = self.pending.lock().await.remove(&invocation_id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(error);
            }
            None => debug!(invocation_id, "completion for unknown invocation"),
        }
    }

    /// Converts one decoded frame into an event, or `None` for frames that
    /// are consumed internally.
    async fn handle_frame(&self, body: &str) -> Option<HubEvent> {
        let frame = match protocol::decode_frame(body) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "undecodable hub frame, skipping");
                return None;
            }
        };

        match frame {
            HubFrame::Ping => None,
            HubFrame::Completion {
                invocation_id,
                error,
            } => {
                self.route_completion(invocation_id, error).await;
                None
            }
            HubFrame::Close { error } => Some(HubEvent::Closed { reason: error }),
            HubFrame::Invocation {
                target, arguments, ..
            } => match target.as_str() {
                TARGET_RECEIVE_MESSAGE => {
                    let Some(payload) = arguments.into_iter().next() else {
                        warn!("ReceiveMessage event without payload");
                        return None;
                    };
                    match serde_json::from_value::<WireMessage>(payload) {
                        Ok(wire) => Some(HubEvent::MessageReceived(wire)),
                        Err(e) => {
                            warn!(error = %e, "undecodable ReceiveMessage payload, skipping");
                            None
                        }
                    }
                }
                TARGET_JOINED_CONVERSATION => {
                    let joined = arguments
                        .into_iter()
                        .next()
                        .and_then(|v| v.as_str().map(String::from))
                        .unwrap_or_default();
                    Some(HubEvent::JoinedConversation(joined))
                }
                other => {
                    debug!(target = other, "unhandled hub event target");
                    None
                }
            },
            HubFrame::Other(kind) => {
                debug!(kind, "unhandled hub frame type");
                None
            }
        }
    }
}

#[async_trait]
impl RealtimeConnection for HubConnection {
    async fn join_conversation(&self, conversation_id: &str) -> Result<(), JobtalkError> {
        self.send_frame(protocol::encode_invocation(
            None,
            METHOD_JOIN,
            vec![Value::from(conversation_id)],
        ))
        .await
    }

    async fn leave_conversation(&self, conversation_id: &str) -> Result<(), JobtalkError> {
        self.send_frame(protocol::encode_invocation(
            None,
            METHOD_LEAVE,
            vec![Value::from(conversation_id)],
        ))
        .await
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<(), JobtalkError> {
        let invocation_id = self
            .next_invocation_id
            .fetch_add(1, Ordering::Relaxed)
            .to_string();

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(invocation_id.clone(), tx);

        let frame = protocol::encode_invocation(
            Some(invocation_id.clone()),
            METHOD_SEND,
            vec![
                Value::from(conversation_id),
                Value::from(sender_id),
                Value::from(body),
            ],
        );
        if let Err(e) = self.send_frame(frame).await {
            self.pending.lock().await.remove(&invocation_id);
            return Err(JobtalkError::RealtimeSend {
                message: e.to_string(),
                source: None,
            });
        }

        match tokio::time::timeout(self.invoke_timeout, rx).await {
            Ok(Ok(None)) => Ok(()),
            Ok(Ok(Some(error))) => Err(JobtalkError::RealtimeSend {
                message: format!("hub rejected send: {error}"),
                source: None,
            }),
            Ok(Err(_)) => Err(JobtalkError::RealtimeSend {
                message: "connection dropped before completion".to_string(),
                source: None,
            }),
            Err(_) => {
                self.pending.lock().await.remove(&invocation_id);
                Err(JobtalkError::Timeout {
                    duration: self.invoke_timeout,
                })
            }
        }
    }

    async fn next_event(&self) -> Result<HubEvent, JobtalkError> {
        let mut reader = self.reader.lock().await;
        loop {
            while let Some(body) = reader.queued.pop_front() {
                if let Some(event) = self.handle_frame(&body).await {
                    return Ok(event);
                }
            }

            match reader.source.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    let reader = &mut *reader;
                    reader.queued.extend(reader.decoder.push(text.as_str()));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    return Ok(HubEvent::Closed {
                        reason: frame.map(|f| f.reason.to_string()),
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(JobtalkError::Connection {
                        message: format!("socket read failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
                None => return Ok(HubEvent::Closed { reason: None }),
            }
        }
    }

    fn echoes_sends(&self) -> bool {
        // The hub broadcasts room messages to every member, sender included.
        true
    }

    async fn close(&self) -> Result<(), JobtalkError> {
        let mut sink = self.sink.lock().await;
        let _ = sink.send(WsMessage::Close(None)).await;
        Ok(())
    }
}
