// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Jobtalk chat core.

use thiserror::Error;

/// The primary error type used across the Jobtalk workspace.
///
/// Variants mirror the failure taxonomy of the chat core: history fetches are
/// user-retriable, connection errors recover through backoff, realtime send
/// errors fall back to REST, and a REST send error is terminal for that
/// delivery attempt.
#[derive(Debug, Error)]
pub enum JobtalkError {
    /// Configuration errors (invalid TOML, missing required fields, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// History fetch failure. Recoverable by the user via the retry affordance.
    #[error("history fetch failed: {message}")]
    HistoryFetch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Hub connection failure (handshake, transport drop, frame decode).
    #[error("connection error: {message}")]
    Connection {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Realtime send failure. The send pipeline falls back to REST.
    #[error("realtime send failed: {message}")]
    RealtimeSend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// REST send failure. Terminal: the message is marked FAILED.
    #[error("rest send failed: {message}")]
    RestSend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
