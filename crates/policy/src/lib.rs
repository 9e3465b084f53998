// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-policy: approval classification for proposed shell commands and
//! detection of approval prompts in raw terminal output.
//!
//! Terminal-stream matching is approximate by design; the supervisor's
//! fallback timer exists because the assistant's UI evolves. Every pattern
//! the system relies on lives in this crate so UI drift is a one-crate fix.

mod classify;
mod prompt;

pub use classify::{annotate, classify, CommandClass};
pub use prompt::{detect_prompt, prompt_present, PromptDetection};
