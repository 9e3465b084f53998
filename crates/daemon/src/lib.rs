// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-daemon: configuration, wiring, and the typed request surface.
//!
//! The HTTP/WebSocket transport is an external collaborator; it consumes
//! [`api::Api`] and maps [`api::ApiError::Validation`] to 4xx responses
//! and everything else to 5xx.

pub mod api;
pub mod bootstrap;
pub mod env;

pub use api::{Api, ApiError};
pub use bootstrap::bootstrap;
