// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assistant binary discovery and command construction.

use crate::{AdapterError, SpawnConfig};
use portable_pty::CommandBuilder;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Well-known install locations, checked after the environment override.
const CANDIDATES: &[&str] = &["/usr/local/bin/claude", "/opt/homebrew/bin/claude"];

/// Locations relative to `$HOME`.
const HOME_CANDIDATES: &[&str] = &[".local/bin/claude", ".claude/local/claude"];

/// Locate the assistant binary: explicit override first, then the fixed
/// candidate list, then `$PATH`.
pub(crate) fn locate_binary(override_path: Option<&Path>) -> Result<PathBuf, AdapterError> {
    if let Some(path) = override_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(AdapterError::BinaryNotFound);
    }

    for candidate in CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    if let Some(home) = std::env::var_os("HOME") {
        for candidate in HOME_CANDIDATES {
            let path = Path::new(&home).join(candidate);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let path = dir.join("claude");
            if path.exists() {
                return Ok(path);
            }
        }
    }

    Err(AdapterError::BinaryNotFound)
}

/// Arguments for one agent launch: accept-edits permission mode plus the
/// initial prompt as the final positional argument.
pub(crate) fn build_args(config: &SpawnConfig) -> Vec<OsString> {
    vec![
        OsString::from("--permission-mode"),
        OsString::from("acceptEdits"),
        OsString::from(config.prompt.clone()),
    ]
}

pub(crate) fn build_command(binary: &Path, config: &SpawnConfig) -> CommandBuilder {
    let mut cmd = CommandBuilder::new(binary);
    for arg in build_args(config) {
        cmd.arg(arg);
    }
    cmd.cwd(&config.workdir);
    cmd
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
