// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push and draft-PR creation per repository.
//!
//! Shells out to the `git` and `gh` binaries; both are external
//! collaborators. Refuses to push protected branches (`main`, `master`,
//! or the remote's discovered default). A repository with nothing ahead of
//! its base and a clean tree produces `repo_no_changes` instead of a PR.

use crate::error::EngineError;
use crate::record::Recorder;
use gaffer_core::{Event, EventKind, Item, ItemId, RepositoryConfig};
use std::path::Path;
use tokio::process::Command;

/// Branches that must never receive a work push.
const PROTECTED_BRANCHES: &[&str] = &["main", "master"];

/// Transient files cleaned out of a repo before pushing.
const TRANSIENT_FILES: &[&str] = &["review_findings.json"];

/// Run a tool in `cwd`, returning trimmed stdout or the stderr as error.
pub(crate) async fn run_tool(
    program: &str,
    cwd: &Path,
    args: &[&str],
) -> Result<String, EngineError> {
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| EngineError::Git(format!("{} failed to start: {}", program, e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::Git(format!(
            "{} {} failed: {}",
            program,
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `git` in `cwd`.
pub(crate) async fn run(cwd: &Path, args: &[&str]) -> Result<String, EngineError> {
    run_tool("git", cwd, args).await
}

/// What happened for one repository at finalize.
#[derive(Debug, Clone, PartialEq)]
pub enum PrOutcome {
    Created { pr_url: String, pr_number: u64 },
    NoChanges,
    /// Protected-branch refusal or push/PR failure; recorded as an `error`
    /// event on the item.
    Failed(String),
}

#[derive(Clone)]
pub struct GitExecutor {
    recorder: Recorder,
}

impl GitExecutor {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }

    /// Push and open a draft PR for every repository, in item order. Per-
    /// repo failures are recorded and do not stop the sequence.
    pub async fn create_prs(&self, item: &Item) -> Result<Vec<PrOutcome>, EngineError> {
        let mut outcomes = Vec::with_capacity(item.repositories.len());
        for repo in &item.repositories {
            outcomes.push(self.create_pr_for_repo(item, repo).await);
        }
        Ok(outcomes)
    }

    pub async fn create_pr_for_repo(&self, item: &Item, repo: &RepositoryConfig) -> PrOutcome {
        let repo_name = repo.directory_name.clone();
        match self.try_create_pr(item, repo).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("PR creation for {} failed: {}", repo_name, e);
                tracing::warn!(item_id = %item.id, repo = repo_name, error = %e, "pr creation failed");
                self.record_error(&item.id, &message);
                PrOutcome::Failed(message)
            }
        }
    }

    async fn try_create_pr(
        &self,
        item: &Item,
        repo: &RepositoryConfig,
    ) -> Result<PrOutcome, EngineError> {
        let workdir = self.recorder.layout().repo_workspace(&item.id, &repo.directory_name);
        let branch = run(&workdir, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let default_branch = discover_default_branch(&workdir).await;

        if PROTECTED_BRANCHES.contains(&branch.as_str())
            || default_branch.as_deref() == Some(branch.as_str())
        {
            let message = format!(
                "refusing to push protected branch {} for {}",
                branch, repo.directory_name
            );
            self.record_error(&item.id, &message);
            return Ok(PrOutcome::Failed(message));
        }

        for transient in TRANSIENT_FILES {
            let _ = std::fs::remove_file(workdir.join(transient));
        }

        let base = match &repo.source {
            gaffer_core::RepoSource::Remote { base_branch: Some(base), .. } => base.clone(),
            _ => default_branch.clone().unwrap_or_else(|| "main".to_string()),
        };

        let commit_hash = run(&workdir, &["rev-parse", "HEAD"]).await?;
        let ahead = run(&workdir, &["rev-list", "--count", &format!("origin/{}..HEAD", base)])
            .await
            .ok()
            .and_then(|s| s.parse::<usize>().ok());
        let dirty = !run(&workdir, &["status", "--porcelain"]).await?.is_empty();

        if ahead == Some(0) && !dirty {
            let event = Event::new(
                item.id.clone(),
                EventKind::RepoNoChanges {
                    repo_name: repo.directory_name.clone(),
                    branch: branch.clone(),
                },
            );
            self.recorder.record(&event)?;
            return Ok(PrOutcome::NoChanges);
        }

        run(&workdir, &["push", "-u", "origin", &branch]).await?;

        let body = pr_body(item);
        let stdout = run_tool(
            "gh",
            &workdir,
            &[
                "pr", "create", "--draft", "--title", &item.name, "--body", &body, "--base",
                &base, "--head", &branch,
            ],
        )
        .await?;
        let (pr_url, pr_number) = parse_pr_url(&stdout).ok_or_else(|| {
            EngineError::Git(format!("could not parse PR url from gh output: {}", stdout))
        })?;

        let event = Event::new(
            item.id.clone(),
            EventKind::PrCreated {
                repo_name: repo.directory_name.clone(),
                pr_url: pr_url.clone(),
                pr_number,
                branch,
                commit_hash,
            },
        );
        self.recorder.record(&event)?;
        Ok(PrOutcome::Created { pr_url, pr_number })
    }

    fn record_error(&self, item_id: &ItemId, message: &str) {
        let event = Event::new(
            item_id.clone(),
            EventKind::Error { message: message.to_string(), context: None },
        );
        if let Err(e) = self.recorder.record(&event) {
            tracing::error!(%item_id, error = %e, "failed to record git error");
        }
    }
}

/// Default branch from `origin/HEAD`, else from the host service API.
async fn discover_default_branch(workdir: &Path) -> Option<String> {
    if let Ok(symref) =
        run(workdir, &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"]).await
    {
        return symref.strip_prefix("origin/").map(str::to_string);
    }
    run_tool(
        "gh",
        workdir,
        &["repo", "view", "--json", "defaultBranchRef", "--jq", ".defaultBranchRef.name"],
    )
    .await
    .ok()
    .filter(|s| !s.is_empty())
}

/// Draft-PR body: description, optional design-doc section, attribution.
fn pr_body(item: &Item) -> String {
    let mut body = item.description.clone();
    if !item.design_doc.trim().is_empty() {
        body.push_str("\n\n## Design\n\n");
        body.push_str(&item.design_doc);
    }
    body.push_str("\n\n---\nOpened by gaffer for ");
    body.push_str(item.id.as_str());
    body
}

/// The PR url is the last http(s) line of gh's output; the number is its
/// trailing path segment.
fn parse_pr_url(stdout: &str) -> Option<(String, u64)> {
    let url = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with("http://") || line.starts_with("https://"))?;
    let number = url.rsplit('/').next()?.parse::<u64>().ok()?;
    Some((url.to_string(), number))
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
