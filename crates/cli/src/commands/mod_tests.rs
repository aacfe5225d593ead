// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::config::init_work_dir;
use tempfile::TempDir;

#[test]
fn test_open_from_subdirectory() {
    let temp = TempDir::new().unwrap();
    init_work_dir(temp.path(), None).unwrap();
    let nested = temp.path().join("src/deep");
    std::fs::create_dir_all(&nested).unwrap();

    let project = Project::open(&nested).unwrap();
    assert_eq!(project.work_dir, temp.path().join(".kamiflow"));
    assert_eq!(project.project_id, project.config.project_id);
    assert_eq!(
        project.state_path(),
        temp.path().join(".kamiflow/sync/state.json")
    );
}

#[test]
fn test_open_generates_missing_project_id() {
    let temp = TempDir::new().unwrap();
    let work_dir = temp.path().join(".kamiflow");
    std::fs::create_dir_all(&work_dir).unwrap();
    std::fs::write(work_dir.join("config.toml"), "").unwrap();

    let project = Project::open(temp.path()).unwrap();
    assert_eq!(project.project_id.len(), 32);
    let reloaded = Config::load(&work_dir).unwrap();
    assert_eq!(reloaded.project_id, project.project_id);
}

#[test]
fn test_sync_scope_whole_project() {
    let temp = TempDir::new().unwrap();
    init_work_dir(temp.path(), None).unwrap();
    let project = Project::open(temp.path()).unwrap();
    let start = temp.path().join("sub");

    assert!(project.sync_scope(&start, None).unwrap().is_all());
    assert!(project
        .sync_scope(&start, Some(Path::new("..")))
        .unwrap()
        .is_all());
    assert!(project
        .sync_scope(&start, Some(temp.path()))
        .unwrap()
        .is_all());
}

#[test]
fn test_sync_scope_subtree_is_root_relative() {
    let temp = TempDir::new().unwrap();
    init_work_dir(temp.path(), None).unwrap();
    let project = Project::open(temp.path()).unwrap();
    let start = temp.path().join("sub");

    let scope = project.sync_scope(&start, Some(Path::new("out"))).unwrap();
    assert_eq!(scope.prefix(), Some("sub/out"));
    let scope = project
        .sync_scope(temp.path(), Some(&temp.path().join("docs/./api")))
        .unwrap();
    assert_eq!(scope.prefix(), Some("docs/api"));
}

#[test]
fn test_sync_scope_outside_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    init_work_dir(temp.path(), None).unwrap();
    let project = Project::open(temp.path()).unwrap();

    for dir in ["../elsewhere", "/abs/dir"] {
        assert!(matches!(
            project.sync_scope(temp.path(), Some(Path::new(dir))),
            Err(Error::UnsafePath(_))
        ));
    }
    assert!(matches!(
        project.sync_scope(temp.path(), Some(Path::new(".kamiflow"))),
        Err(Error::UnsafePath(_))
    ));
}
