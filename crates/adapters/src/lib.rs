// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-adapters: process supervision behind the [`AgentAdapter`] trait.
//!
//! The production implementation wraps the AI-assistant binary in a PTY and
//! drives the approval micro-protocol; the `test-support` feature exposes a
//! scripted fake so the engine and the workspace specs run without real
//! child processes.

pub mod pty;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use gaffer_core::{AgentId, ApprovalFlags, ItemId, PromptUi};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default terminal dimensions for agent PTYs.
pub const DEFAULT_COLS: u16 = 120;
pub const DEFAULT_ROWS: u16 = 40;

/// Signals a supervisor delivers to the agent manager.
///
/// The manager owns persistence: every signal that matters becomes one or
/// more events in the agent and item logs. The supervisor itself never
/// writes.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentSignal {
    /// Raw terminal output chunk.
    Output { chunk: String },
    /// The agent printed the completion marker.
    TasksCompleted,
    /// An approval prompt needs a human (or API) decision.
    ApprovalRequested { command: String, ui: PromptUi, context: String, flags: ApprovalFlags },
    /// Blocklisted command; the supervisor already wrote the deny response.
    ApprovalAutoDenied { command: String, ui: PromptUi, context: String, flags: ApprovalFlags },
    /// Auto-approved command; informational only, nothing is persisted.
    ApprovalAutoApproved { command: String },
    /// The child exited; terminal for the instance.
    Exit { exit_code: Option<i32>, signal: Option<i32> },
}

/// Everything needed to launch one agent process.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub agent_id: AgentId,
    pub item_id: ItemId,
    /// Initial prompt, passed to the assistant as a command-line argument.
    pub prompt: String,
    /// Working directory; the caller guarantees it exists.
    pub workdir: PathBuf,
    pub cols: u16,
    pub rows: u16,
}

impl SpawnConfig {
    pub fn new(
        agent_id: AgentId,
        item_id: ItemId,
        prompt: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            agent_id,
            item_id,
            prompt: prompt.into(),
            workdir: workdir.into(),
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("agent {0} not found")]
    NotFound(String),
    #[error("assistant binary not found (set GAFFER_AGENT_BIN or install the assistant)")]
    BinaryNotFound,
    #[error("pty error: {0}")]
    Pty(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("agent {0} is not awaiting an approval decision")]
    NotWaiting(String),
}

/// Capability surface for spawning and driving agent processes.
///
/// One signal channel per spawned agent; the channel closing after an
/// `Exit` signal is the instance's end of life.
#[async_trait]
pub trait AgentAdapter: Send + Sync + 'static {
    /// Spawn the agent; returns the OS process id.
    async fn spawn(
        &self,
        config: SpawnConfig,
        signal_tx: mpsc::Sender<AgentSignal>,
    ) -> Result<u32, AdapterError>;

    /// Write a line of input to the agent's terminal.
    async fn send_input(&self, agent_id: &AgentId, input: &str) -> Result<(), AdapterError>;

    /// Resize the agent's terminal.
    async fn resize(&self, agent_id: &AgentId, cols: u16, rows: u16)
        -> Result<(), AdapterError>;

    /// Kill the agent process. Removal from the live set happens on exit.
    async fn kill(&self, agent_id: &AgentId) -> Result<(), AdapterError>;

    /// Resolve a pending approval. Valid only while the instance is
    /// waiting; `ui` overrides the detected UI kind when the prompt shape
    /// changed between detection and decision.
    async fn process_approval(
        &self,
        agent_id: &AgentId,
        approved: bool,
        ui: Option<PromptUi>,
    ) -> Result<(), AdapterError>;

    /// Whether a live instance exists for this agent.
    fn is_live(&self, agent_id: &AgentId) -> bool;

    /// Tail of the output ring buffer, if the agent is live.
    fn output_tail(&self, agent_id: &AgentId) -> Option<String>;
}
