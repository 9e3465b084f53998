// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Resolve the data root: GAFFER_DATA_DIR > XDG data dir > ~/.local/share.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GAFFER_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("gaffer")
}

/// Bind host for the transport collaborator.
pub fn host() -> String {
    std::env::var("GAFFER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Bind port for the transport collaborator.
pub fn port() -> u16 {
    std::env::var("GAFFER_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(4520)
}

/// Log filter, `tracing_subscriber::EnvFilter` syntax.
pub fn log_filter() -> String {
    std::env::var("GAFFER_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Explicit assistant binary path, bypassing discovery.
pub fn agent_bin() -> Option<PathBuf> {
    std::env::var("GAFFER_AGENT_BIN").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
