// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed [`ChatApi`](jobtalk_core::ChatApi) implementation for the
//! job-board backend.

pub mod client;
pub mod types;

pub use client::RestChatApi;
