// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review-findings contract.
//!
//! Review agents drop a `review_findings.json` in their repository
//! workspace; the worker controller reads it to decide whether another fix
//! iteration is needed. The file is agent-written and read-only here.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFindings {
    #[serde(default)]
    pub findings: Vec<Finding>,
    pub overall_assessment: Assessment,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub severity: Severity,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub description: String,
    #[serde(default)]
    pub suggested_fix: String,
    /// Role label of the agent that should apply the fix.
    #[serde(default)]
    pub target_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Pass,
    NeedsFixes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
        }
    }
}

impl ReviewFindings {
    pub fn passes(&self) -> bool {
        self.overall_assessment == Assessment::Pass
    }

    /// (critical, major, minor) counts.
    pub fn severity_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for finding in &self.findings {
            match finding.severity {
                Severity::Critical => counts.0 += 1,
                Severity::Major => counts.1 += 1,
                Severity::Minor => counts.2 += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
#[path = "findings_tests.rs"]
mod tests;
