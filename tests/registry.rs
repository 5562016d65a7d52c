//! Registry, discovery and active-repository switching

mod common;

use std::fs;

use common::TestWorkspace;
use ctx_core::CtxError;

#[test]
fn test_create_activates_and_persists() {
    let ws = TestWorkspace::new();
    ws.create("alpha");
    ws.create("beta");

    let registry = ws.registry.store().load().unwrap();
    assert_eq!(registry.discovered, vec!["alpha", "beta"]);
    assert_eq!(registry.active.as_deref(), Some("beta"));
    assert_eq!(ws.switcher.current().unwrap().name, "beta");

    let content = fs::read_to_string(ws.root().join("ctx.config")).unwrap();
    assert!(content.contains("active_ctx = \"beta\""));
}

#[test]
fn test_create_is_retryable_after_partial_setup() {
    let ws = TestWorkspace::new();
    // Directory and VCS exist from an interrupted attempt; nothing registered
    let path = ws.make_marked_repo("gamma");

    let repo = ws.registry.create(&path, "gamma").unwrap();
    assert!(repo.is_valid());
    assert_eq!(ws.commit_count("gamma", "HEAD"), 1);

    assert!(matches!(
        ws.registry.create(&path, "gamma"),
        Err(CtxError::NameCollision(_))
    ));
    assert_eq!(ws.commit_count("gamma", "HEAD"), 1);
}

#[test]
fn test_create_rejects_paths_outside_workspace() {
    let ws = TestWorkspace::new();
    let nested = ws.root().join("outer").join("inner");
    assert!(matches!(
        ws.registry.create(&nested, "inner"),
        Err(CtxError::OutsideWorkspace(_))
    ));

    let elsewhere = tempfile::TempDir::new().unwrap();
    assert!(matches!(
        ws.registry.create(&elsewhere.path().join("x"), "x"),
        Err(CtxError::OutsideWorkspace(_))
    ));
    assert!(matches!(
        ws.registry.create(&ws.root().join("a"), "b"),
        Err(CtxError::InvalidName(_))
    ));
    assert!(ws.registry.store().load().unwrap().discovered.is_empty());
}

#[test]
fn test_register_then_discover_lists_name_once() {
    let ws = TestWorkspace::new();
    let path = ws.make_marked_repo("notes");

    ws.registry.register(&path).unwrap();
    let found: Vec<_> = ws
        .registry
        .discover()
        .into_iter()
        .filter(|r| r.name == "notes")
        .collect();
    assert_eq!(found.len(), 1);

    assert!(matches!(
        ws.registry.register(&path),
        Err(CtxError::NameCollision(_))
    ));
    let registry = ws.registry.store().load().unwrap();
    assert_eq!(registry.discovered, vec!["notes"]);
    // First registration into an empty registry becomes active
    assert_eq!(registry.active.as_deref(), Some("notes"));
}

#[test]
fn test_register_requires_marker() {
    let ws = TestWorkspace::new();
    let path = ws.make_marked_repo("plain");
    fs::remove_file(path.join(".ctx")).unwrap();

    assert!(matches!(
        ws.registry.register(&path),
        Err(CtxError::NotAMarkedRepository(_))
    ));
    assert!(matches!(
        ws.registry.register(&ws.root().join("absent")),
        Err(CtxError::NotAMarkedRepository(_))
    ));
}

#[test]
fn test_discover_requires_marker_and_vcs() {
    let ws = TestWorkspace::new();
    ws.make_marked_repo("valid");
    fs::create_dir_all(ws.root().join("marker-only")).unwrap();
    fs::write(ws.root().join("marker-only").join(".ctx"), "").unwrap();
    fs::create_dir_all(ws.root().join("empty")).unwrap();

    let names: Vec<_> = ws.registry.discover().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["valid"]);
    // Discovery alone never writes the registry
    assert!(!ws.root().join("ctx.config").exists());
}

#[test]
fn test_reconcile_registers_new_and_reports_missing() {
    let ws = TestWorkspace::new();
    ws.make_marked_repo("b-repo");
    ws.make_marked_repo("a-repo");

    let report = ws.registry.reconcile().unwrap();
    assert_eq!(report.added, vec!["a-repo", "b-repo"]);
    assert!(report.missing.is_empty());
    assert_eq!(report.active.as_deref(), Some("a-repo"));

    fs::remove_file(ws.repo_path("b-repo").join(".ctx")).unwrap();
    let report = ws.registry.reconcile().unwrap();
    assert!(report.added.is_empty());
    assert_eq!(report.missing, vec!["b-repo"]);

    let list = ws.registry.list().unwrap();
    let b = list.iter().find(|r| r.name == "b-repo").unwrap();
    assert!(!b.exists);
    assert!(!b.is_valid);
    assert!(list.iter().find(|r| r.name == "a-repo").unwrap().is_active);
}

#[test]
fn test_switch_to_unknown_never_mutates_active() {
    let ws = TestWorkspace::new();
    ws.create("alpha");
    let before = fs::read_to_string(ws.root().join("ctx.config")).unwrap();

    assert!(matches!(
        ws.switcher.switch_to("ghost"),
        Err(CtxError::UnknownRepository(_))
    ));
    assert_eq!(
        fs::read_to_string(ws.root().join("ctx.config")).unwrap(),
        before
    );
    assert_eq!(ws.switcher.current().unwrap().name, "alpha");
}

#[test]
fn test_switch_leaves_working_trees_alone() {
    let ws = TestWorkspace::new();
    ws.create("alpha");
    ws.create("beta");
    ws.write("alpha", "ctx.txt", "unsaved thought\n");

    ws.switcher.switch_to("alpha").unwrap();
    assert_eq!(ws.switcher.current().unwrap().name, "alpha");
    assert_eq!(ws.read("alpha", "ctx.txt"), "unsaved thought\n");

    // Workflow operations follow the active pointer
    assert_eq!(ws.engine.status().unwrap().repository, "alpha");
    ws.switcher.switch_to("beta").unwrap();
    assert!(ws.engine.status().unwrap().is_clean);
}

#[test]
fn test_deregister_rules() {
    let ws = TestWorkspace::new();
    ws.create("alpha");
    ws.create("beta");

    assert!(matches!(
        ws.registry.deregister("beta"),
        Err(CtxError::ActiveRepositoryCannotBeDeregistered(_))
    ));
    assert!(matches!(
        ws.registry.deregister("ghost"),
        Err(CtxError::UnknownRepository(_))
    ));

    ws.registry.deregister("alpha").unwrap();
    assert_eq!(ws.registry.store().load().unwrap().discovered, vec!["beta"]);
    // The directory and its history survive
    assert!(ws.repo_path("alpha").join(".git").exists());
    assert!(matches!(
        ws.switcher.switch_to("alpha"),
        Err(CtxError::UnknownRepository(_))
    ));
}

#[test]
fn test_corrupt_config_surfaces() {
    let ws = TestWorkspace::new();
    fs::write(ws.root().join("ctx.config"), "active_ctx = [").unwrap();

    assert!(matches!(
        ws.switcher.current(),
        Err(CtxError::ConfigCorrupt { .. })
    ));
    assert!(matches!(
        ws.engine.status(),
        Err(CtxError::ConfigCorrupt { .. })
    ));
}
