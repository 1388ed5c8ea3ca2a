// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime hub transport for the Jobtalk chat core.
//!
//! Implements [`RealtimeTransport`](jobtalk_core::RealtimeTransport) over a
//! WebSocket speaking the hub's JSON frame protocol.

pub mod connection;
pub mod protocol;

pub use connection::{HubConnection, HubTransport};
