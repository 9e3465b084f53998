// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell-command classification.
//!
//! Blocklist patterns are checked first; anything they match is refused
//! outright. The approval-required families gate side effects that leave
//! the workspace (network, packages, permissions, deletion). Everything
//! else auto-approves. SQL patterns are case-insensitive because SQL is;
//! unix command names are matched case-sensitively.

use gaffer_core::ApprovalFlags;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Outcome of classifying a proposed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Destructive-root pattern; auto-denied, never surfaced for approval.
    Blocklist,
    /// Needs a human (or API) decision.
    ApprovalRequired,
    /// Safe to wave through.
    AutoApprove,
}

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("constant regex pattern is valid"));
    };
}

// -- blocklist --

pattern!(RM_RECURSIVE_FLAG, r"\brm\b(\s+-[a-zA-Z]*[rR][a-zA-Z]*)");
pattern!(ETC_CREDENTIAL_WRITE, r"(>>?\s*/etc/(passwd|shadow)\b)|(\b(tee|cp|mv|truncate|dd)\b[^|;&]*/etc/(passwd|shadow)\b)|(\bsed\s+-[a-zA-Z]*i[^|;&]*/etc/(passwd|shadow)\b)");
pattern!(DD_RAW_DEVICE, r"\bdd\b[^|;&]*\bof=/dev/(sd[a-z]|hd[a-z]|vd[a-z]|nvme\d+n\d+|mmcblk\d+|disk\d+)");
pattern!(FORK_BOMB, r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:");
pattern!(CHMOD_777_ROOT, r"\bchmod\b(\s+-[a-zA-Z]+)*\s+777\s+/(\s|$)");
pattern!(CRYPTOMINER, r"\b(xmrig|minerd|cgminer|bfgminer|cryptonight)\b|stratum\+tcp://");

// -- approval-required families --

pattern!(DELETION, r"\b(rm|rmdir)\b");
pattern!(REMOTE_GIT, r"\bgit\b[^|;&]*\b(push|reset\s+--hard)\b");
pattern!(GIT_RESET_HARD, r"\bgit\b[^|;&]*\breset\s+--hard\b");
pattern!(CONTAINER, r"\b(docker|podman|nerdctl)\b\s+(run|rm|rmi|stop|kill|start|restart|compose)\b|\bdocker-compose\b");
pattern!(NETWORK, r"\b(curl|wget|ssh|scp|rsync|nc|netcat)\b");
pattern!(PACKAGE_INSTALL, r"\b(npm|pnpm|yarn|bun)\s+(i|install|add|remove|uninstall)\b|\bpip3?\s+(install|uninstall)\b|\bcargo\s+(install|add)\b|\bapt(-get)?\s+(install|remove|purge)\b|\b(brew|gem|apk|dnf|yum|pacman)\s+(install|add|remove|uninstall|-S)\b");
pattern!(PROCESS_SIGNAL, r"\b(kill|pkill|killall)\b");
pattern!(PRIVILEGE, r"\b(sudo|doas)\b|\bsu\s");
pattern!(PERMISSION, r"\b(chmod|chown|chgrp)\b");
pattern!(SQL_DESTRUCTIVE, r"(?i)\b(drop\s+(table|database|schema|index)|truncate\s+table|delete\s+from)\b");
pattern!(ENV_OR_EVAL, r"\bexport\s+\w+=|\b(eval|exec)\b");

// -- annotation --

pattern!(SYSTEM_DIR, r"(^|[\s='\x22])/(etc|usr|boot|root|var|sys|proc)(/|\s|$)");
pattern!(SECRET_DIR, r"~/\.(ssh|aws|gnupg|config/gh)\b|/\.(ssh|aws|gnupg)/");
pattern!(SECRET_FILE, r"\.env(\.\w+)?\b|\bid_(rsa|ed25519|ecdsa)\b|\.pem\b|\.p12\b|\bcredentials\b|\bsecrets?\.(json|ya?ml|toml)\b|\.netrc\b|\.npmrc\b|\btoken[s]?\.(json|txt)\b");
pattern!(ABS_PATH, r"(^|[\s='\x22])(/[\w./-]+)");

/// Classify a proposed shell command. Blocklist wins over everything.
pub fn classify(command: &str) -> CommandClass {
    if is_blocklisted(command) {
        return CommandClass::Blocklist;
    }
    let approval = DELETION.is_match(command)
        || REMOTE_GIT.is_match(command)
        || CONTAINER.is_match(command)
        || NETWORK.is_match(command)
        || PACKAGE_INSTALL.is_match(command)
        || PROCESS_SIGNAL.is_match(command)
        || PRIVILEGE.is_match(command)
        || PERMISSION.is_match(command)
        || SQL_DESTRUCTIVE.is_match(command)
        || ENV_OR_EVAL.is_match(command);
    if approval {
        CommandClass::ApprovalRequired
    } else {
        CommandClass::AutoApprove
    }
}

fn is_blocklisted(command: &str) -> bool {
    rm_reaches_root(command)
        || ETC_CREDENTIAL_WRITE.is_match(command)
        || DD_RAW_DEVICE.is_match(command)
        || FORK_BOMB.is_match(command)
        || CHMOD_777_ROOT.is_match(command)
        || CRYPTOMINER.is_match(command)
}

/// A recursive `rm` whose target normalizes to the filesystem root.
fn rm_reaches_root(command: &str) -> bool {
    if !RM_RECURSIVE_FLAG.is_match(command) {
        return false;
    }
    command
        .split_whitespace()
        .skip(1)
        .filter(|arg| !arg.starts_with('-'))
        .any(|arg| normalizes_to_root(arg))
}

/// Textual normalization: does this argument resolve to `/`?
///
/// Catches `/`, `/*`, `//`, and traversal like `/tmp/../`. Relative paths
/// never normalize to root here; without the agent cwd they can't be
/// resolved, and the approval tier still catches them via the deletion
/// family.
fn normalizes_to_root(arg: &str) -> bool {
    let arg = arg.trim_matches(|c| c == '"' || c == '\'');
    if !arg.starts_with('/') {
        return false;
    }
    let mut depth: i32 = 0;
    for part in arg.split('/') {
        match part {
            "" | "." | "*" => {}
            ".." => depth = (depth - 1).max(0),
            _ => depth += 1,
        }
    }
    depth == 0
}

/// Annotative flags for an approval request. `workspace` is the agent's
/// working directory; absolute paths outside it (or under system/secret
/// directories) set `is_outside_workspace`.
pub fn annotate(command: &str, workspace: Option<&Path>) -> ApprovalFlags {
    let is_destructive = DELETION.is_match(command)
        || GIT_RESET_HARD.is_match(command)
        || SQL_DESTRUCTIVE.is_match(command)
        || DD_RAW_DEVICE.is_match(command)
        || rm_reaches_root(command);

    let involves_network = NETWORK.is_match(command) || REMOTE_GIT.is_match(command);
    let involves_secrets = SECRET_FILE.is_match(command) || SECRET_DIR.is_match(command);

    let mut is_outside_workspace = SYSTEM_DIR.is_match(command) || SECRET_DIR.is_match(command);
    if !is_outside_workspace {
        if let Some(workspace) = workspace {
            for capture in ABS_PATH.captures_iter(command) {
                if let Some(path) = capture.get(2) {
                    if !Path::new(path.as_str()).starts_with(workspace) {
                        is_outside_workspace = true;
                        break;
                    }
                }
            }
        }
    }

    ApprovalFlags { is_outside_workspace, is_destructive, involves_secrets, involves_network }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
