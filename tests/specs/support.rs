// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scenario scaffolding: a world with the API wired over the fake
//! adapter, local git origins, and a `gh` stub on PATH.

use gaffer_adapters::fake::{FakeAction, FakeAdapter, FakeScript};
use gaffer_adapters::AgentSignal;
use gaffer_core::paths::DataLayout;
use gaffer_core::{Event, ItemId};
use gaffer_daemon::api::Api;
use gaffer_daemon::bootstrap::bootstrap_with;
use gaffer_storage as storage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct World {
    pub dir: TempDir,
    pub layout: DataLayout,
    pub adapter: Arc<FakeAdapter>,
    pub api: Api<Arc<FakeAdapter>>,
}

pub async fn world() -> World {
    let dir = tempfile::tempdir().expect("tempdir");
    install_stub_gh(dir.path());
    let layout = DataLayout::new(dir.path().join("data"));
    std::fs::create_dir_all(layout.items_dir()).expect("data dir");
    let adapter = FakeAdapter::new();
    let api = bootstrap_with(layout.clone(), adapter.clone()).await.expect("bootstrap");
    World { dir, layout, adapter, api }
}

impl World {
    pub fn events(&self, item_id: &ItemId) -> Vec<Event> {
        storage::read(&self.layout.item_events(item_id)).expect("read events")
    }

    pub fn count(&self, item_id: &ItemId, tag: &str) -> usize {
        self.events(item_id).iter().filter(|e| e.kind.tag() == tag).count()
    }
}

/// Put a fake `gh` first on PATH. It answers `pr create` with an
/// incrementing PR url and `repo view` with the default branch name.
pub fn install_stub_gh(dir: &Path) {
    let bin = dir.join("stub-bin");
    std::fs::create_dir_all(&bin).expect("stub dir");
    let script = r#"#!/bin/sh
case "$1" in
  pr)
    n=$(cat "$GH_STUB_DIR/counter" 2>/dev/null || echo 0)
    n=$((n+1))
    echo "$n" > "$GH_STUB_DIR/counter"
    echo "https://github.com/acme/demo/pull/$n"
    ;;
  repo)
    echo "main"
    ;;
esac
"#;
    let gh = bin.join("gh");
    std::fs::write(&gh, script).expect("write gh stub");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755))
            .expect("chmod gh stub");
    }
    std::env::set_var("GH_STUB_DIR", &bin);
    let path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{}", bin.display(), path));
}

/// Create a bare origin seeded with one commit on `main`.
pub async fn seed_origin(dir: &Path, name: &str) -> PathBuf {
    let origin = dir.join(format!("{}.git", name));
    let seed = dir.join(format!("{}-seed", name));
    std::fs::create_dir_all(&origin).expect("origin dir");
    std::fs::create_dir_all(&seed).expect("seed dir");
    sh(&origin, "git init --bare -b main .").await;
    sh(&seed, "git init -b main . && git -c user.email=t@t -c user.name=t commit --allow-empty -m init")
        .await;
    sh(&seed, &format!("git remote add origin {} && git push -q origin main", origin.display()))
        .await;
    origin
}

pub async fn sh(cwd: &Path, script: &str) {
    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(script)
        .current_dir(cwd)
        .status()
        .await
        .expect("spawn sh");
    assert!(status.success(), "script failed: {}", script);
}

/// Poll until `check` holds; panics after ~15 seconds.
pub async fn wait_for(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..600 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("timed out waiting for {}", what);
}

/// Plan YAML with `(id, agent, repository)` tasks.
pub fn plan_yaml(item_id: &ItemId, tasks: &[(&str, &str, &str)]) -> String {
    let mut out = format!("version: \"1.0\"\nitemId: {}\nsummary: scripted plan\ntasks:\n", item_id);
    for (id, agent, repository) in tasks {
        out.push_str(&format!(
            "  - id: {}\n    title: task {}\n    description: scripted\n    agent: {}\n    repository: {}\n",
            id, id, agent, repository
        ));
    }
    out
}

/// A dev-agent script: dirty the checkout, then report completion.
pub fn dev_script(marker: &str) -> FakeScript {
    FakeScript::new(vec![
        FakeAction::WriteWorkdirFile {
            path: format!("{}.txt", marker),
            contents: "scripted change\n".to_string(),
        },
        FakeAction::Signal(AgentSignal::TasksCompleted),
    ])
}

/// A review-agent script that writes a findings verdict and exits.
pub fn review_script(findings_json: &str) -> FakeScript {
    FakeScript::new(vec![
        FakeAction::WriteWorkdirFile {
            path: "review_findings.json".to_string(),
            contents: findings_json.to_string(),
        },
        FakeAction::Signal(AgentSignal::Exit { exit_code: Some(0), signal: None }),
    ])
}

pub const PASS_FINDINGS: &str =
    r#"{"findings": [], "overallAssessment": "pass", "summary": "clean"}"#;

pub const NEEDS_FIXES_FINDINGS: &str = r#"{
  "findings": [{"severity": "major", "file": "src/db.rs", "line": 10,
                "description": "connection leak", "suggestedFix": "add a guard",
                "targetAgent": "back"}],
  "overallAssessment": "needs_fixes", "summary": "one leak"}"#;
