// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams of the chat core.
//!
//! The core only ever talks to the outside world through two seams: the REST
//! collaborator ([`ChatApi`]) and the realtime hub transport
//! ([`RealtimeTransport`] / [`RealtimeConnection`]). Production
//! implementations live in `jobtalk-rest` and `jobtalk-hub`; tests inject
//! mocks from `jobtalk-test-utils`.

pub mod api;
pub mod transport;

pub use api::ChatApi;
pub use transport::{RealtimeConnection, RealtimeTransport};
