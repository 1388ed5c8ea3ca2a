// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the job-board chat endpoints.
//!
//! Provides [`RestChatApi`], the production [`ChatApi`] implementation:
//! `Chat/list-by-conversation` for history, `Chat/send` for persistence, and
//! the `/healthcheck` reachability probe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use jobtalk_config::RestConfig;
use jobtalk_core::{ChatApi, HealthStatus, JobtalkError, SendReceipt, WireMessage};

use crate::types::{ApiEnvelope, ListMessagesRequest, SendMessageRequest};

/// HTTP client for backend chat communication.
#[derive(Debug, Clone)]
pub struct RestChatApi {
    client: reqwest::Client,
    base_url: String,
    health_url: String,
}

impl RestChatApi {
    /// Creates a new backend client from configuration.
    pub fn new(config: &RestConfig) -> Result<Self, JobtalkError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JobtalkError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_url: config.health_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Unwraps the backend envelope, mapping an error payload through `err`.
    fn unwrap_envelope<T>(
        envelope: ApiEnvelope<T>,
        err: impl Fn(String) -> JobtalkError,
    ) -> Result<T, JobtalkError> {
        match (envelope.data, envelope.error) {
            (Some(data), _) => Ok(data),
            (None, Some(e)) if !e.message.is_empty() || !e.code.is_empty() => {
                Err(err(format!("backend error {}: {}", e.code, e.message)))
            }
            (None, _) => Err(err("empty response envelope".to_string())),
        }
    }
}

#[async_trait]
impl ChatApi for RestChatApi {
    async fn fetch_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<WireMessage>, JobtalkError> {
        let response = self
            .client
            .post(self.endpoint("Chat/list-by-conversation"))
            .json(&ListMessagesRequest {
                conversation_uuid: conversation_id,
            })
            .send()
            .await
            .map_err(|e| JobtalkError::HistoryFetch {
                message: format!("request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobtalkError::HistoryFetch {
                message: format!("status {status}"),
                source: None,
            });
        }

        let envelope: ApiEnvelope<Vec<WireMessage>> =
            response.json().await.map_err(|e| JobtalkError::HistoryFetch {
                message: format!("invalid response body: {e}"),
                source: Some(Box::new(e)),
            })?;

        let messages = Self::unwrap_envelope(envelope, |message| JobtalkError::HistoryFetch {
            message,
            source: None,
        })?;

        debug!(
            conversation_id,
            count = messages.len(),
            "fetched message history"
        );
        Ok(messages)
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<SendReceipt, JobtalkError> {
        let response = self
            .client
            .post(self.endpoint("Chat/send"))
            .json(&SendMessageRequest {
                conversation_uuid: conversation_id,
                sender_uuid: sender_id,
                content: body,
            })
            .send()
            .await
            .map_err(|e| JobtalkError::RestSend {
                message: format!("request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobtalkError::RestSend {
                message: format!("status {status}"),
                source: None,
            });
        }

        let envelope: ApiEnvelope<WireMessage> =
            response.json().await.map_err(|e| JobtalkError::RestSend {
                message: format!("invalid response body: {e}"),
                source: Some(Box::new(e)),
            })?;

        let confirmed = Self::unwrap_envelope(envelope, |message| JobtalkError::RestSend {
            message,
            source: None,
        })?;

        let id = confirmed.uuid.ok_or_else(|| JobtalkError::RestSend {
            message: "confirmation missing server id".to_string(),
            source: None,
        })?;

        debug!(conversation_id, id = id.as_str(), "message persisted via REST");
        Ok(SendReceipt {
            id,
            sent_at: confirmed.send_at,
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, JobtalkError> {
        // Reachability probe only. Network failure is a finding, not an error.
        match self.client.get(&self.health_url).send().await {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => Ok(HealthStatus::Unhealthy(format!(
                "status {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("unreachable: {e}"))),
        }
    }
}
