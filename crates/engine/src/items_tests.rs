// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBus;
use gaffer_adapters::fake::FakeAdapter;
use gaffer_core::paths::DataLayout;
use gaffer_core::{derive_item_status, ItemStatus, LinkMode};
use gaffer_storage as storage;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    layout: DataLayout,
    adapter: Arc<FakeAdapter>,
    items: Arc<ItemManager<Arc<FakeAdapter>>>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path().join("data"));
    let adapter = FakeAdapter::new();
    let recorder = Recorder::new(layout.clone(), EventBus::new());
    let agents = AgentManager::new(adapter.clone(), recorder);
    let store = ItemStore::new(layout.clone());
    let items = Arc::new(ItemManager::new(agents, store, Snapshots::new()));
    Fixture { dir, layout, adapter, items }
}

fn local_repo_config(path: &Path, link_mode: LinkMode) -> RepositoryConfig {
    RepositoryConfig {
        directory_name: "docs".to_string(),
        role: "docs".to_string(),
        source: RepoSource::Local { path: path.to_path_buf(), link_mode },
    }
}

fn events(f: &Fixture, item: &Item) -> Vec<Event> {
    storage::read(&f.layout.item_events(&item.id)).unwrap()
}

#[tokio::test]
async fn create_item_requires_a_repository() {
    let f = fixture();
    let err = f
        .items
        .create_item(CreateItem {
            name: "empty".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![],
        })
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn create_item_persists_and_emits() {
    let f = fixture();
    let source = f.dir.path().join("src-repo");
    std::fs::create_dir_all(&source).unwrap();

    let item = f
        .items
        .create_item(CreateItem {
            name: "docs pass".to_string(),
            description: "tidy the docs".to_string(),
            design_doc: String::new(),
            repositories: vec![local_repo_config(&source, LinkMode::Symlink)],
        })
        .unwrap();

    assert!(item.id.as_str().starts_with("ITEM-"));
    let loaded = f.items.get_item(&item.id).unwrap();
    assert_eq!(loaded.name, "docs pass");

    let log = events(&f, &item);
    assert!(matches!(&log[0].kind, EventKind::ItemCreated { name, .. } if name == "docs pass"));
}

#[tokio::test]
async fn setup_links_local_repo_and_starts_planner() {
    let f = fixture();
    let source = f.dir.path().join("src-repo");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("README.md"), "hi").unwrap();

    let item = f
        .items
        .create_item(CreateItem {
            name: "docs".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![local_repo_config(&source, LinkMode::Symlink)],
        })
        .unwrap();

    f.items.setup_workspace(&item.id).await.unwrap();

    let staged = f.layout.repo_workspace(&item.id, "docs");
    assert!(staged.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_to_string(staged.join("README.md")).unwrap(), "hi");

    let log = events(&f, &item);
    assert!(log.iter().any(|e| matches!(e.kind, EventKind::WorkspaceSetupStarted { .. })));
    assert!(log
        .iter()
        .any(|e| matches!(e.kind, EventKind::WorkspaceSetupCompleted { success: true, .. })));

    // Planner was auto-started at the workspace root.
    let spawned = f.adapter.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].agent_id.role(), Some("planner"));
    assert_eq!(spawned[0].workdir, f.layout.workspace_root(&item.id));
}

#[tokio::test]
async fn setup_copies_when_asked() {
    let f = fixture();
    let source = f.dir.path().join("src-repo");
    std::fs::create_dir_all(source.join("nested")).unwrap();
    std::fs::write(source.join("nested/file.txt"), "deep").unwrap();

    let item = f
        .items
        .create_item(CreateItem {
            name: "docs".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![local_repo_config(&source, LinkMode::Copy)],
        })
        .unwrap();

    f.items.setup_workspace(&item.id).await.unwrap();

    let staged = f.layout.repo_workspace(&item.id, "docs");
    assert!(!staged.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_to_string(staged.join("nested/file.txt")).unwrap(), "deep");
}

#[tokio::test]
async fn setup_replaces_previous_staging() {
    let f = fixture();
    let source = f.dir.path().join("src-repo");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("marker"), "v2").unwrap();

    let item = f
        .items
        .create_item(CreateItem {
            name: "docs".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![local_repo_config(&source, LinkMode::Copy)],
        })
        .unwrap();

    // Pre-existing stale directory at the target.
    let staged = f.layout.repo_workspace(&item.id, "docs");
    std::fs::create_dir_all(&staged).unwrap();
    std::fs::write(staged.join("stale"), "old").unwrap();

    f.items.retry_setup(&item.id).await.unwrap();

    assert!(!staged.join("stale").exists());
    assert_eq!(std::fs::read_to_string(staged.join("marker")).unwrap(), "v2");
}

#[tokio::test]
async fn clone_failure_is_recorded_and_planner_skipped() {
    let f = fixture();
    let item = f
        .items
        .create_item(CreateItem {
            name: "doomed".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![RepositoryConfig {
                directory_name: "app".to_string(),
                role: "dev".to_string(),
                source: RepoSource::Remote {
                    url: f.dir.path().join("does-not-exist.git").display().to_string(),
                    base_branch: None,
                    submodules: false,
                    work_branch: None,
                },
            }],
        })
        .unwrap();

    f.items.setup_workspace(&item.id).await.unwrap();

    let log = events(&f, &item);
    assert!(log
        .iter()
        .any(|e| matches!(e.kind, EventKind::CloneCompleted { success: false, .. })));
    assert_eq!(derive_item_status(&item, &log), ItemStatus::Error);
    assert!(f.adapter.spawned().is_empty());
}

#[tokio::test]
async fn remote_clone_checks_out_work_branch() {
    let f = fixture();

    // Seed a local origin with one commit.
    let origin = f.dir.path().join("origin.git");
    let seed = f.dir.path().join("seed");
    std::fs::create_dir_all(&origin).unwrap();
    std::fs::create_dir_all(&seed).unwrap();
    for script in [
        ("git init --bare -b main .", &origin),
        ("git init -b main . && git -c user.email=t@t -c user.name=t commit --allow-empty -m init", &seed),
    ] {
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(script.0)
            .current_dir(script.1)
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }
    let push = format!("git remote add origin {} && git push -q origin main", origin.display());
    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&push)
        .current_dir(&seed)
        .status()
        .await
        .unwrap();
    assert!(status.success());

    let item = f
        .items
        .create_item(CreateItem {
            name: "app".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![RepositoryConfig {
                directory_name: "app".to_string(),
                role: "dev".to_string(),
                source: RepoSource::Remote {
                    url: origin.display().to_string(),
                    base_branch: None,
                    submodules: false,
                    work_branch: None,
                },
            }],
        })
        .unwrap();

    f.items.setup_workspace(&item.id).await.unwrap();

    let workdir = f.layout.repo_workspace(&item.id, "app");
    let branch = git::run(&workdir, &["rev-parse", "--abbrev-ref", "HEAD"]).await.unwrap();
    assert_eq!(branch, format!("agent/{}/app", item.id.as_str().to_lowercase()));

    let log = events(&f, &item);
    assert!(log
        .iter()
        .any(|e| matches!(e.kind, EventKind::CloneCompleted { success: true, .. })));
}

#[tokio::test]
async fn update_item_changes_metadata_only() {
    let f = fixture();
    let source = f.dir.path().join("src-repo");
    std::fs::create_dir_all(&source).unwrap();
    let item = f
        .items
        .create_item(CreateItem {
            name: "before".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![local_repo_config(&source, LinkMode::Symlink)],
        })
        .unwrap();

    let updated = f
        .items
        .update_item(
            &item.id,
            UpdateItem { name: Some("after".to_string()), ..Default::default() },
        )
        .unwrap();
    assert_eq!(updated.name, "after");
    assert_eq!(updated.repositories.len(), 1);

    let err = f
        .items
        .update_item(&item.id, UpdateItem { name: Some("  ".to_string()), ..Default::default() })
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn delete_item_removes_directory() {
    let f = fixture();
    let source = f.dir.path().join("src-repo");
    std::fs::create_dir_all(&source).unwrap();
    let item = f
        .items
        .create_item(CreateItem {
            name: "gone".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![local_repo_config(&source, LinkMode::Symlink)],
        })
        .unwrap();

    f.items.delete_item(&item.id).await.unwrap();
    assert!(!f.layout.item_dir(&item.id).exists());
    assert!(matches!(
        f.items.get_item(&item.id),
        Err(EngineError::Storage(gaffer_storage::StoreError::NotFound(_)))
    ));
}
