// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance output state machine.
//!
//! Pure with respect to I/O: chunks and clock instants come in, actions
//! (signals to emit, bytes to write to the child) come out. The PTY driver
//! in `mod.rs` applies them. This split keeps the approval micro-protocol
//! testable without a terminal.
//!
//! Prompt scanning works on the unconsumed tail of the ring: once a
//! response has been written, everything up to that point counts as
//! consumed, so a prompt that stays on screen in the scrollback can't
//! re-trigger detection after it was answered.

use crate::AgentSignal;
use gaffer_core::PromptUi;
use gaffer_policy::{annotate, classify, detect_prompt, prompt_present, CommandClass};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Ring buffer keeps the last 16 KiB of terminal output.
pub(crate) const RING_CAPACITY: usize = 16 * 1024;
/// Approval requests carry at most 4 KiB of context.
pub(crate) const CONTEXT_CAPACITY: usize = 4 * 1024;
/// How long a sent response may go unacknowledged before the one fallback.
pub(crate) const SETTLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Marker line an agent prints when its assigned tasks are done.
pub(crate) const TASKS_COMPLETED_MARKER: &str = "TASKS_COMPLETED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApprovalState {
    None,
    Waiting,
    Sent,
}

/// What the driver must do after feeding the state machine.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Emit(AgentSignal),
    /// Bytes to write to the child's terminal.
    Write(&'static str),
}

pub(crate) fn approve_response(ui: PromptUi) -> &'static str {
    match ui {
        PromptUi::Menu => "\n",
        PromptUi::Yn => "y",
        PromptUi::Unknown => "\n",
    }
}

pub(crate) fn deny_response(ui: PromptUi) -> &'static str {
    match ui {
        PromptUi::Menu => "3",
        PromptUi::Yn => "n",
        PromptUi::Unknown => "n",
    }
}

fn fallback_response(ui: PromptUi) -> &'static str {
    match ui {
        PromptUi::Menu => "1",
        PromptUi::Yn | PromptUi::Unknown => "\n",
    }
}

pub(crate) struct InstanceState {
    ring: String,
    /// Ring offset up to which prompt output counts as consumed.
    detect_from: usize,
    approval: ApprovalState,
    pending_ui: PromptUi,
    sent_at: Option<Instant>,
    /// Whether any output arrived since the last response write. Until it
    /// does, the prompt counts as still showing (a silent child gets the
    /// fallback, not a reset).
    output_since_send: bool,
    retried: bool,
    tasks_completed: bool,
    workdir: PathBuf,
}

impl InstanceState {
    pub(crate) fn new(workdir: PathBuf) -> Self {
        Self {
            ring: String::new(),
            detect_from: 0,
            approval: ApprovalState::None,
            pending_ui: PromptUi::Unknown,
            sent_at: None,
            output_since_send: false,
            retried: false,
            tasks_completed: false,
            workdir,
        }
    }

    pub(crate) fn ring(&self) -> &str {
        &self.ring
    }

    #[cfg(test)]
    pub(crate) fn approval(&self) -> ApprovalState {
        self.approval
    }

    /// Feed one output chunk through the handling pipeline: ring append,
    /// output signal, completion marker, post-send settling, new-prompt
    /// detection.
    pub(crate) fn handle_chunk(&mut self, chunk: &str, now: Instant) -> Vec<Action> {
        self.push_ring(chunk);
        let mut actions = vec![Action::Emit(AgentSignal::Output { chunk: chunk.to_string() })];

        if !self.tasks_completed
            && chunk.lines().any(|line| line.trim() == TASKS_COMPLETED_MARKER)
        {
            self.tasks_completed = true;
            actions.push(Action::Emit(AgentSignal::TasksCompleted));
        }

        match self.approval {
            ApprovalState::Sent => {
                self.output_since_send = true;
                if !prompt_present(chunk) && !prompt_present(self.scan_window()) {
                    // The child accepted the response and moved on.
                    self.reset_approval();
                } else if let Some(action) = self.settle(now) {
                    actions.push(action);
                }
            }
            ApprovalState::None => {
                if let Some(more) = self.detect_new_prompt(now) {
                    actions.extend(more);
                }
            }
            ApprovalState::Waiting => {}
        }

        actions
    }

    /// Periodic check while a response is outstanding.
    pub(crate) fn tick(&mut self, now: Instant) -> Option<Action> {
        if self.approval != ApprovalState::Sent {
            return None;
        }
        if self.output_since_send && !prompt_present(self.scan_window()) {
            self.reset_approval();
            return None;
        }
        self.settle(now)
    }

    /// Externally injected decision. Valid only while waiting.
    pub(crate) fn process_approval(
        &mut self,
        approved: bool,
        ui_override: Option<PromptUi>,
        now: Instant,
    ) -> Result<Action, ()> {
        if self.approval != ApprovalState::Waiting {
            return Err(());
        }
        let ui = ui_override.unwrap_or(self.pending_ui);
        self.pending_ui = ui;
        self.mark_sent(now);
        Ok(Action::Write(if approved { approve_response(ui) } else { deny_response(ui) }))
    }

    fn settle(&mut self, now: Instant) -> Option<Action> {
        let sent_at = self.sent_at?;
        if self.retried || now.duration_since(sent_at) < SETTLE_TIMEOUT {
            return None;
        }
        self.retried = true;
        // The fallback is itself a response: consume the renders behind it
        // so a later prompt-free chunk can settle the state.
        self.detect_from = self.ring.len();
        self.output_since_send = false;
        Some(Action::Write(fallback_response(self.pending_ui)))
    }

    fn detect_new_prompt(&mut self, now: Instant) -> Option<Vec<Action>> {
        let detection = detect_prompt(self.scan_window())?;
        let command = detection.command.unwrap_or_default();
        let ui = detection.ui;
        self.pending_ui = ui;
        let flags = annotate(&command, Some(&self.workdir));
        let context = self.context();

        let actions = match classify(&command) {
            CommandClass::Blocklist => {
                self.mark_sent(now);
                vec![
                    Action::Emit(AgentSignal::ApprovalAutoDenied { command, ui, context, flags }),
                    Action::Write(deny_response(ui)),
                ]
            }
            CommandClass::ApprovalRequired => {
                self.approval = ApprovalState::Waiting;
                vec![Action::Emit(AgentSignal::ApprovalRequested { command, ui, context, flags })]
            }
            CommandClass::AutoApprove => {
                self.mark_sent(now);
                vec![
                    Action::Emit(AgentSignal::ApprovalAutoApproved { command }),
                    Action::Write(approve_response(ui)),
                ]
            }
        };
        Some(actions)
    }

    /// A response is on the wire; the prompt text behind it is consumed.
    fn mark_sent(&mut self, now: Instant) {
        self.approval = ApprovalState::Sent;
        self.sent_at = Some(now);
        self.output_since_send = false;
        self.retried = false;
        self.detect_from = self.ring.len();
    }

    fn reset_approval(&mut self) {
        self.approval = ApprovalState::None;
        self.pending_ui = PromptUi::Unknown;
        self.sent_at = None;
        self.output_since_send = false;
        self.retried = false;
        self.detect_from = self.ring.len();
    }

    /// Unconsumed tail of the ring, the only region prompt scans look at.
    fn scan_window(&self) -> &str {
        &self.ring[self.detect_from.min(self.ring.len())..]
    }

    fn push_ring(&mut self, chunk: &str) {
        self.ring.push_str(chunk);
        if self.ring.len() > RING_CAPACITY {
            let mut cut = self.ring.len() - RING_CAPACITY;
            while !self.ring.is_char_boundary(cut) {
                cut += 1;
            }
            self.ring.drain(..cut);
            self.detect_from = self.detect_from.saturating_sub(cut);
        }
    }

    /// Tail of the ring for approval-request context.
    fn context(&self) -> String {
        if self.ring.len() <= CONTEXT_CAPACITY {
            return self.ring.clone();
        }
        let mut cut = self.ring.len() - CONTEXT_CAPACITY;
        while !self.ring.is_char_boundary(cut) {
            cut += 1;
        }
        self.ring[cut..].to_string()
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
