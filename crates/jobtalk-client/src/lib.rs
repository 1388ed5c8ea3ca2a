// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat session engine for the Jobtalk client.
//!
//! The hosting UI opens a [`ChatSession`] per conversation screen and gets
//! back an ordered message list, a connection status feed, and `send` /
//! `retry_failed` entry points. Everything else, reconnect backoff,
//! optimistic sends, REST fallback and echo reconciliation, happens inside.

pub mod channel;
pub mod history;
pub mod send;
pub mod session;
pub mod store;

pub use channel::ChannelManager;
pub use history::HistoryLoader;
pub use send::SendPipeline;
pub use session::ChatSession;
pub use store::MessageStore;
