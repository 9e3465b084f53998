// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBus;
use crate::record::Recorder;
use gaffer_adapters::fake::{FakeAction, FakeAdapter, FakeScript};
use gaffer_adapters::AgentSignal;
use gaffer_core::paths::DataLayout;
use gaffer_core::test_support::{plan_task, ItemBuilder};
use gaffer_core::{derive_item_status, ItemStatus, RepoSource, RepositoryConfig};
use gaffer_storage as storage;
use tempfile::TempDir;

const PASS_FINDINGS: &str =
    r#"{"findings": [], "overallAssessment": "pass", "summary": "clean"}"#;
const NEEDS_FIXES_FINDINGS: &str = r#"{
  "findings": [{"severity": "major", "file": "src/db.rs", "line": 10,
                "description": "leak", "suggestedFix": "guard it",
                "targetAgent": "dev"}],
  "overallAssessment": "needs_fixes", "summary": "one leak"}"#;

struct Fixture {
    dir: TempDir,
    layout: DataLayout,
    adapter: Arc<FakeAdapter>,
    worker: Arc<WorkerController<Arc<FakeAdapter>>>,
    item: Item,
}

/// Builds an item whose single repo "app" is a real git clone of a local
/// bare origin, parked on a work branch so finalize takes the no-changes
/// path without needing a forge.
async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path().join("data"));
    let adapter = FakeAdapter::new();
    let recorder = Recorder::new(layout.clone(), EventBus::new());
    let agents = AgentManager::new(adapter.clone(), recorder.clone());
    let store = ItemStore::new(layout.clone());
    let worker = WorkerController::new(
        agents.clone(),
        store.clone(),
        Snapshots::new(),
        GitExecutor::new(recorder),
    );

    let item = ItemBuilder::new("ITEM-WORK0001")
        .remote_repo("app", "dev", "file://unused")
        .build();
    store.save(&item).unwrap();

    let origin = dir.path().join("origin.git");
    let seed = dir.path().join("seed");
    std::fs::create_dir_all(&origin).unwrap();
    std::fs::create_dir_all(&seed).unwrap();
    for (script, cwd) in [
        ("git init --bare -b main .", &origin),
        (
            "git init -b main . && git -c user.email=t@t -c user.name=t commit --allow-empty -m init",
            &seed,
        ),
    ] {
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(script)
            .current_dir(cwd)
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }
    let push = format!("git remote add origin {} && git push -q origin main", origin.display());
    assert!(tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&push)
        .current_dir(&seed)
        .status()
        .await
        .unwrap()
        .success());

    let workspace = layout.workspace_root(&item.id);
    std::fs::create_dir_all(&workspace).unwrap();
    let clone = format!(
        "git clone -q {} app && cd app && git checkout -q -b agent/item-work0001/app",
        origin.display()
    );
    assert!(tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&clone)
        .current_dir(&workspace)
        .status()
        .await
        .unwrap()
        .success());

    Fixture { dir, layout, adapter, worker, item }
}

impl Fixture {
    fn write_plan(&self, with_review: bool) {
        let mut tasks = vec![plan_task("t1", "dev", "app")];
        if with_review {
            tasks.push(plan_task("r1", "review", "app"));
        }
        let plan = Plan {
            version: "1.0".to_string(),
            item_id: self.item.id.clone(),
            summary: "do it".to_string(),
            tasks,
        };
        storage::write_plan(&self.layout.plan_path(&self.item.id), &plan).unwrap();
    }

    fn item_events(&self) -> Vec<Event> {
        storage::read(&self.layout.item_events(&self.item.id)).unwrap()
    }

    fn count(&self, tag: &str) -> usize {
        self.item_events().iter().filter(|e| e.kind.tag() == tag).count()
    }
}

fn review_script(findings_json: &str) -> FakeScript {
    FakeScript::new(vec![
        FakeAction::WriteWorkdirFile {
            path: "review_findings.json".to_string(),
            contents: findings_json.to_string(),
        },
        FakeAction::Signal(AgentSignal::Exit { exit_code: Some(0), signal: None }),
    ])
}

#[tokio::test]
async fn run_without_plan_is_a_validation_error() {
    let f = fixture().await;
    let err = f.worker.run(&f.item.id).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn dev_phase_then_pass_review_completes_item() {
    let f = fixture().await;
    f.write_plan(true);
    f.adapter.push_script("dev", FakeScript::tasks_completed());
    f.adapter.push_script("review", review_script(PASS_FINDINGS));

    f.worker.run(&f.item.id).await.unwrap();

    let events = f.item_events();
    // One dev agent, one review agent, one terminal repo outcome.
    assert_eq!(f.count("tasks_completed"), 1);
    assert_eq!(f.count("review_findings_extracted"), 0);
    assert_eq!(f.count("repo_no_changes"), 1);
    assert_eq!(derive_item_status(&f.item, &events), ItemStatus::Completed);

    // The dev table was cleared at finalize.
    assert!(f.worker.active_dev_agent(&f.item.id, "app").is_none());
}

#[tokio::test]
async fn review_loop_feeds_findings_back_once() {
    let f = fixture().await;
    f.write_plan(true);

    // Dev agent completes, then reacts to feedback by completing again.
    f.adapter.push_script(
        "dev",
        FakeScript::tasks_completed()
            .with_input_reaction(vec![FakeAction::Signal(AgentSignal::TasksCompleted)]),
    );
    // First review fails, second passes.
    f.adapter.push_script("review", review_script(NEEDS_FIXES_FINDINGS));
    f.adapter.push_script("review", review_script(PASS_FINDINGS));

    f.worker.run(&f.item.id).await.unwrap();

    let events = f.item_events();
    let extracted: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::ReviewFindingsExtracted { iteration, major_count, .. } => {
                Some((*iteration, *major_count))
            }
            _ => None,
        })
        .collect();
    assert_eq!(extracted, vec![(1, 1)]);

    // The dev agent received exactly one feedback message.
    let dev_spawn = f
        .adapter
        .spawned()
        .into_iter()
        .find(|s| s.agent_id.role() == Some("dev"))
        .unwrap();
    let inputs = f.adapter.inputs_for(&dev_spawn.agent_id);
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].contains("leak"));

    // Two review agents were spawned in total.
    let reviews =
        f.adapter.spawned().iter().filter(|s| s.agent_id.role() == Some("review")).count();
    assert_eq!(reviews, 2);

    assert_eq!(derive_item_status(&f.item, &events), ItemStatus::Completed);
}

#[tokio::test]
async fn review_loop_is_bounded_to_three_iterations() {
    let f = fixture().await;
    f.write_plan(true);

    f.adapter.push_script(
        "dev",
        FakeScript::tasks_completed()
            .with_input_reaction(vec![FakeAction::Signal(AgentSignal::TasksCompleted)])
            .with_input_reaction(vec![FakeAction::Signal(AgentSignal::TasksCompleted)]),
    );
    for _ in 0..3 {
        f.adapter.push_script("review", review_script(NEEDS_FIXES_FINDINGS));
    }

    f.worker.run(&f.item.id).await.unwrap();

    let reviews =
        f.adapter.spawned().iter().filter(|s| s.agent_id.role() == Some("review")).count();
    assert_eq!(reviews, 3);
    assert_eq!(f.count("review_findings_extracted"), 3);

    // Feedback went out after iterations 1 and 2 but not 3.
    let dev_spawn = f
        .adapter
        .spawned()
        .into_iter()
        .find(|s| s.agent_id.role() == Some("dev"))
        .unwrap();
    assert_eq!(f.adapter.inputs_for(&dev_spawn.agent_id).len(), 2);
}

#[tokio::test]
async fn missing_findings_file_ends_the_loop() {
    let f = fixture().await;
    f.write_plan(true);
    f.adapter.push_script("dev", FakeScript::tasks_completed());
    // Review agent exits without writing findings.
    f.adapter.push_script("review", FakeScript::exits(0));

    f.worker.run(&f.item.id).await.unwrap();
    assert_eq!(f.count("review_findings_extracted"), 0);
    assert_eq!(derive_item_status(&f.item, &f.item_events()), ItemStatus::Completed);
}

#[tokio::test]
async fn traversal_repo_name_aborts_the_run() {
    let f = fixture().await;
    // An item whose repo name climbs out of the workspace.
    let evil = ItemBuilder::new("ITEM-EVIL0001").build();
    let mut evil = evil;
    evil.repositories.push(RepositoryConfig {
        directory_name: "../escape".to_string(),
        role: "dev".to_string(),
        source: RepoSource::Remote {
            url: "https://example.com/x.git".to_string(),
            base_branch: None,
            submodules: false,
            work_branch: None,
        },
    });
    let store = ItemStore::new(f.layout.clone());
    store.save(&evil).unwrap();
    let plan = Plan {
        version: "1.0".to_string(),
        item_id: evil.id.clone(),
        summary: String::new(),
        tasks: vec![plan_task("t1", "dev", "../escape")],
    };
    storage::write_plan(&f.layout.plan_path(&evil.id), &plan).unwrap();

    let err = f.worker.run(&evil.id).await.unwrap_err();
    assert!(err.is_validation());
    assert!(f.adapter.spawned().is_empty());
}

#[test]
fn guard_workdir_rejects_escapes() {
    let root = Path::new("/data/items/ITEM-X/workspace");
    assert!(guard_workdir(root, &root.join("app")).is_ok());
    assert!(guard_workdir(root, &root.join("../other")).is_err());
    assert!(guard_workdir(root, Path::new("/etc")).is_err());
    assert!(guard_workdir(root, &root.join("app/../app2")).is_ok());
    assert!(guard_workdir(root, &root.join("app/../../../../etc")).is_err());
}

#[tokio::test]
async fn dev_table_tracks_active_agent_during_run() {
    let f = fixture().await;
    f.write_plan(false);
    f.adapter.push_script("dev", FakeScript::tasks_completed());

    f.worker.run(&f.item.id).await.unwrap();

    let dev_spawn = f.adapter.spawned().into_iter().next().unwrap();
    assert_eq!(dev_spawn.workdir, f.layout.repo_workspace(&f.item.id, "app"));
    // Cleared after finalize.
    assert!(f.worker.active_dev_agent(&f.item.id, "app").is_none());
    // Keep the tempdir alive to the end.
    assert!(f.dir.path().exists());
}
