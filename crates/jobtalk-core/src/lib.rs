// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Jobtalk chat engine.
//!
//! This crate provides the error type, domain types, and the adapter traits
//! used throughout the Jobtalk workspace. The session logic lives in
//! `jobtalk-client`; production adapters live in `jobtalk-rest` and
//! `jobtalk-hub`.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::JobtalkError;
pub use traits::{ChatApi, RealtimeConnection, RealtimeTransport};
pub use types::{
    ConnectionState, DeliveryState, HealthStatus, HubEvent, Message, SendReceipt, WireMessage,
};
