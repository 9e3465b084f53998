// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan artifact and review-findings file access.
//!
//! The plan lives at the workspace root as `plan.yaml`. Before a new
//! planning cycle, the previous artifact is archived alongside it as
//! `plan_{timestamp}_{rand6}.yaml` so the history of cycles survives.

use chrono::Utc;
use gaffer_core::{rand_suffix, Plan, ReviewFindings};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanStoreError {
    #[error("plan not found at {0}")]
    NotFound(PathBuf),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("plan parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("findings parse error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_err(path: &Path, source: std::io::Error) -> PlanStoreError {
    PlanStoreError::Io { path: path.display().to_string(), source }
}

/// Parse the plan artifact at `path`.
pub fn read_plan(path: &Path) -> Result<Plan, PlanStoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PlanStoreError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(io_err(path, e)),
    };
    Ok(serde_yaml::from_str(&content)?)
}

/// Serialize `plan` to `path`.
pub fn write_plan(path: &Path, plan: &Plan) -> Result<(), PlanStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
    }
    let yaml = serde_yaml::to_string(plan)?;
    fs::write(path, yaml).map_err(|e| io_err(path, e))
}

/// Move an existing plan aside as `plan_{timestamp}_{rand6}.yaml` in the
/// same directory. Returns the archive path, or None when there was no
/// plan to archive.
pub fn archive_plan(path: &Path) -> Result<Option<PathBuf>, PlanStoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let archived = dir.join(format!(
        "plan_{}_{}.yaml",
        Utc::now().format("%Y%m%dT%H%M%S"),
        rand_suffix(6)
    ));
    fs::rename(path, &archived).map_err(|e| io_err(path, e))?;
    Ok(Some(archived))
}

/// Read the agent-written findings file, if present.
pub fn read_findings(path: &Path) -> Result<Option<ReviewFindings>, PlanStoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
#[path = "plan_store_tests.rs"]
mod tests;
