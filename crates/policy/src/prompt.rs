// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval-prompt detection in raw terminal output.
//!
//! Operates on the tail of the PTY ring buffer (at most 16 KiB). The
//! assistant's approval UI comes in two recognized shapes: a numbered menu
//! with an arrow marker, and a bracketed yes/no question. Anything that
//! looks like a question about running a command but fits neither shape is
//! `Unknown`, and the supervisor answers it with nothing more than a
//! newline.

use gaffer_core::PromptUi;
use regex::Regex;
use std::sync::LazyLock;

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("constant regex pattern is valid"));
    };
}

// A question the assistant is waiting on.
pattern!(QUESTION, r"(?i)(do you want to (proceed|allow|run|make this edit)|allow (bash|command|this)|waiting for (your )?approval|approve this)");
// Numbered menu option line, optionally carrying the arrow marker.
pattern!(MENU_OPTION, r"(?m)^\s*(?:[❯>]\s*)?\d+[.)]\s+\S");
// Arrow marker somewhere in the tail.
pattern!(MENU_ARROW, r"(?m)^\s*[❯>]\s*\d*");
// Bracketed yes/no.
pattern!(YN, r"(?i)[\[(](y/n|yes/no)[\])]");
// Explicit command markers, strongest first.
pattern!(ALLOW_BASH, r"(?m)^.*Allow (?:Bash|command):\s*(.+?)\s*$");
pattern!(DOLLAR_LINE, r"(?m)^\s*\$\s+(.+?)\s*$");

/// What the detector saw in a terminal tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDetection {
    pub ui: PromptUi,
    /// The proposed command, when a marker gave one away; otherwise the
    /// smallest enclosing line of the question.
    pub command: Option<String>,
}

/// Cheap check: does the tail currently show an approval prompt at all?
///
/// Used by the supervisor's post-send settling pass; detection and
/// extraction are skipped when this is false.
pub fn prompt_present(tail: &str) -> bool {
    QUESTION.is_match(tail)
}

/// Recognize an approval prompt in `tail` and classify its UI.
pub fn detect_prompt(tail: &str) -> Option<PromptDetection> {
    if !QUESTION.is_match(tail) {
        return None;
    }

    let ui = if MENU_OPTION.is_match(tail) && MENU_ARROW.is_match(tail) {
        PromptUi::Menu
    } else if YN.is_match(tail) {
        PromptUi::Yn
    } else {
        PromptUi::Unknown
    };

    Some(PromptDetection { ui, command: extract_command(tail) })
}

/// Pull the proposed command out of the tail.
///
/// Prefers explicit `Allow Bash:` / `Allow command:` markers, then a
/// `$ command` line; falls back to the line carrying the question itself.
fn extract_command(tail: &str) -> Option<String> {
    if let Some(capture) = ALLOW_BASH.captures_iter(tail).last() {
        return capture.get(1).map(|m| m.as_str().to_string());
    }
    if let Some(capture) = DOLLAR_LINE.captures_iter(tail).last() {
        return capture.get(1).map(|m| m.as_str().to_string());
    }
    tail.lines().rev().find(|line| QUESTION.is_match(line)).map(|line| line.trim().to_string())
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
