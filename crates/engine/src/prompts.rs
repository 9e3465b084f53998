// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt templates for the agent roles.
//!
//! Plain string assembly; the assistant receives these as its initial
//! command-line argument. Agents signal completion by printing the
//! `TASKS_COMPLETED` marker on its own line.

use gaffer_core::{Item, Plan, PlanTask, ReviewFindings};
use std::fmt::Write as _;

fn repo_listing(item: &Item) -> String {
    let mut out = String::new();
    for repo in &item.repositories {
        let _ = writeln!(out, "- {} (role: {})", repo.directory_name, repo.role);
    }
    out
}

/// Prompt for the planner agent, run at the workspace root.
pub fn planner(item: &Item) -> String {
    format!(
        "You are the planning agent for \"{name}\".\n\
         \n\
         Repositories in this workspace:\n{repos}\n\
         Design document:\n{design}\n\
         \n\
         Derive a task plan and write it to plan.yaml in the current \
         directory with this shape:\n\
         version: \"1.0\"\n\
         itemId: {item_id}\n\
         summary: <one line>\n\
         tasks:\n\
         \x20 - id: <unique>\n\
         \x20   title: <short>\n\
         \x20   description: <what to do>\n\
         \x20   agent: <one of the repository roles, or review>\n\
         \x20   repository: <repository directory name>\n\
         \n\
         Every task's repository must be one of the directories above. Add \
         one review task per repository that receives dev tasks. Exit after \
         writing the file.",
        name = item.name,
        repos = repo_listing(item),
        design = item.design_doc,
        item_id = item.id,
    )
}

/// Prompt for a dev agent bound to one repository.
pub fn dev(item: &Item, repo_name: &str, tasks: &[&PlanTask]) -> String {
    let mut task_list = String::new();
    for task in tasks {
        let _ = writeln!(task_list, "- [{}] {}: {}", task.id, task.title, task.description);
        for file in &task.files {
            let _ = writeln!(task_list, "    file hint: {}", file);
        }
    }
    format!(
        "You are the {repo} development agent for \"{name}\". Work only \
         inside this repository checkout.\n\
         \n\
         Your tasks:\n{tasks}\n\
         Commit your work with clear messages as you go. When every task is \
         done, print a line containing exactly TASKS_COMPLETED and wait.",
        repo = repo_name,
        name = item.name,
        tasks = task_list,
    )
}

/// Prompt for a review agent bound to one repository.
pub fn review(item: &Item, repo_name: &str, tasks: &[&PlanTask], plan: &Plan) -> String {
    let mut focus = String::new();
    for task in tasks {
        let _ = writeln!(focus, "- {}: {}", task.title, task.description);
    }
    format!(
        "You are the review agent for the {repo} repository of \"{name}\".\n\
         \n\
         Plan summary: {summary}\n\
         Review focus:\n{focus}\n\
         Review the committed changes in this checkout. Write your verdict \
         to review_findings.json in the current directory:\n\
         {{\"findings\": [{{\"severity\": \"critical|major|minor\", \
         \"file\": \"<path>\", \"line\": <int>, \"description\": \"...\", \
         \"suggestedFix\": \"...\", \"targetAgent\": \"<role>\"}}], \
         \"overallAssessment\": \"pass\" | \"needs_fixes\", \
         \"summary\": \"...\"}}\n\
         Exit after writing the file.",
        repo = repo_name,
        name = item.name,
        summary = plan.summary,
        focus = focus,
    )
}

/// Prompt for the review-receiver agent, run at the workspace root.
pub fn review_receive(
    item: &Item,
    repo_name: &str,
    pr_number: Option<u64>,
    pr_url: Option<&str>,
) -> String {
    let mut roles = String::new();
    for repo in &item.repositories {
        let _ = writeln!(roles, "- {} -> {}", repo.directory_name, repo.role);
    }
    format!(
        "Review comments arrived on the pull request for \"{name}\" \
         (repository: {repo}, PR #{number}, {url}).\n\
         \n\
         Repositories and roles:\n{roles}\n\
         Read the review comments, inspect the affected checkouts, and \
         write a new plan.yaml in the current directory addressing them \
         (same format as the original plan, itemId {item_id}). Exit after \
         writing the file.",
        name = item.name,
        repo = repo_name,
        number = pr_number.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
        url = pr_url.unwrap_or("no url"),
        roles = roles,
        item_id = item.id,
    )
}

/// Textualized review findings sent back to a dev agent.
pub fn feedback(repo_name: &str, findings: &ReviewFindings) -> String {
    let mut grouped = String::new();
    for finding in &findings.findings {
        let location = match finding.line {
            Some(line) => format!("{}:{}", finding.file, line),
            None => finding.file.clone(),
        };
        let _ = writeln!(
            grouped,
            "- [{}] {} ({})\n  fix: {}",
            finding.severity, finding.description, location, finding.suggested_fix
        );
    }
    format!(
        "Review of {repo} found issues that need fixes:\n{grouped}\n\
         Summary: {summary}\n\
         Apply the fixes, commit, and print TASKS_COMPLETED again when done.",
        repo = repo_name,
        grouped = grouped,
        summary = findings.summary,
    )
}

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;
