// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL event logs.
//!
//! One serialized event per line. The file append order is the
//! authoritative total order for an item; readers must never reorder.
//! A torn final line (crash mid-append) is discarded silently on read, as
//! is any line that fails to parse, so the log stays usable after a crash
//! without repair tooling.

use gaffer_core::paths::DataLayout;
use gaffer_core::{Event, ItemId};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("event log I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("event serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The agent log took the event but the item log append failed. The
    /// first append is not rolled back.
    #[error("item log append failed after agent log append: {0}")]
    ItemAppendFailed(#[source] Box<EventLogError>),
}

fn io_err(path: &Path, source: std::io::Error) -> EventLogError {
    EventLogError::Io { path: path.display().to_string(), source }
}

/// Append one event to the log at `path`, creating parent directories and
/// the file as needed. The line is flushed before returning.
pub fn append(path: &Path, event: &Event) -> Result<(), EventLogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
    }
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    file.write_all(line.as_bytes()).map_err(|e| io_err(path, e))?;
    file.flush().map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Read all events from `path` in append order.
///
/// A missing file reads as empty. Unparseable lines (including a torn
/// final line) are skipped; a skipped line in the middle of the file is
/// logged since it means more than a crashed append.
pub fn read(path: &Path) -> Result<Vec<Event>, EventLogError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(path, e)),
    };
    // Lossy: binary garbage in a line makes that line unparseable, which the
    // loop below already tolerates; it must not sink the whole log.
    let content = String::from_utf8_lossy(&bytes);

    let lines: Vec<&str> = content.lines().collect();
    let mut events = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                if idx + 1 < lines.len() {
                    tracing::warn!(
                        path = %path.display(),
                        line = idx + 1,
                        error = %e,
                        "skipping corrupt event log line"
                    );
                }
                // Torn tail lines are expected after a crash; drop quietly.
            }
        }
    }
    Ok(events)
}

/// Append an agent-scoped event to both of its logs: the agent's own log
/// first, then the item log. A failure of the second append surfaces as
/// [`EventLogError::ItemAppendFailed`] without undoing the first.
pub fn append_agent_event(
    layout: &DataLayout,
    item_id: &ItemId,
    event: &Event,
) -> Result<(), EventLogError> {
    let agent_id = match &event.agent_id {
        Some(id) => id,
        // Item-scoped events go to the item log only.
        None => return append(&layout.item_events(item_id), event),
    };
    append(&layout.agent_events(item_id, agent_id), event)?;
    append(&layout.item_events(item_id), event)
        .map_err(|e| EventLogError::ItemAppendFailed(Box::new(e)))
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
