//! Async facade: end-to-end calls and concurrent callers

use std::fs;

use ctx_core::git::{ChangeKind, DiffScope};
use ctx_core::workflow::{IntegrationOutcome, SaveOutcome};
use ctx_core::{ContextService, CtxError};
use tempfile::TempDir;

fn open() -> (TempDir, ContextService) {
    let dir = TempDir::new().unwrap();
    let service = ContextService::open(dir.path()).unwrap();
    (dir, service)
}

#[tokio::test]
async fn test_new_explore_save_integrate() {
    let (dir, service) = open();
    let repo = service.new_repository("research").await.unwrap();
    assert_eq!(repo.path, dir.path().join("research"));

    service.explore("idea").await.unwrap();
    fs::write(repo.path.join("idea.md"), "an idea\n").unwrap();
    assert!(matches!(
        service.save("capture idea").await.unwrap(),
        SaveOutcome::Saved { .. }
    ));
    service.checkout("main").await.unwrap();

    let preview = service.integrate("idea", true).await.unwrap();
    assert!(matches!(preview, IntegrationOutcome::Preview(ref p) if !p.would_conflict));
    let merged = service.integrate("idea", false).await.unwrap();
    assert!(matches!(merged, IntegrationOutcome::Merged { .. }));
    assert!(repo.path.join("idea.md").exists());

    let listed = service.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_active && listed[0].is_valid);
}

#[tokio::test]
async fn test_settings_file_changes_trunk() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".ctx.toml"),
        "[repository]\ntrunk = \"consensus\"\n",
    )
    .unwrap();
    let service = ContextService::open(dir.path()).unwrap();

    service.new_repository("r").await.unwrap();
    let status = service.status().await.unwrap();
    assert_eq!(status.branch, "consensus");
    assert_eq!(status.trunk, "consensus");
}

#[tokio::test]
async fn test_errors_serialize_with_codes() {
    let (_dir, service) = open();
    let err = service.switch("nowhere").await.unwrap_err();
    assert!(matches!(err, CtxError::UnknownRepository(_)));
    assert_eq!(err.to_json()["code"], "unknown_repository");

    let err = service.status().await.unwrap_err();
    assert_eq!(err.code(), "no_active_repository");
}

#[tokio::test]
async fn test_diff_between_and_against_branches() {
    let (_dir, service) = open();
    let repo = service.new_repository("notes").await.unwrap();
    service.explore("idea").await.unwrap();
    fs::write(repo.path.join("idea.md"), "an idea\n").unwrap();
    service.save("capture idea").await.unwrap();
    service.checkout("main").await.unwrap();

    let between = service
        .diff(DiffScope::from_args(false, &["main".into(), "idea".into()]).unwrap())
        .await
        .unwrap();
    assert_eq!(between.len(), 1);
    assert_eq!(between[0].path, "idea.md");
    assert_eq!(between[0].kind, ChangeKind::Added);

    let against = service
        .diff(DiffScope::from_args(false, &["idea".into()]).unwrap())
        .await
        .unwrap();
    assert!(against
        .iter()
        .any(|c| c.path == "idea.md" && c.kind == ChangeKind::Deleted));

    let err = service
        .diff(DiffScope::from_args(false, &["main".into(), "gone".into()]).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "unknown_branch");

    let three: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
    assert!(DiffScope::from_args(false, &three).is_none());
    assert_eq!(CtxError::TooManyBranches(3).code(), "too_many_branches");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_are_serialized() {
    let (dir, service) = open();
    service.new_repository("shared").await.unwrap();
    let repo = dir.path().join("shared");
    let before = service.status().await.unwrap();
    assert!(before.is_clean);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let path = repo.join(format!("note-{}.md", i));
        tasks.push(tokio::spawn(async move {
            fs::write(&path, format!("note {}\n", i)).unwrap();
            service.save(&format!("note {}", i)).await
        }));
    }

    let mut saved = 0;
    for task in tasks {
        match task.await.unwrap().unwrap() {
            SaveOutcome::Saved { .. } => saved += 1,
            SaveOutcome::NothingToSave => {}
        }
    }

    // Every note ends up committed exactly once, whichever save picked it up
    assert!(saved >= 1);
    let status = service.status().await.unwrap();
    assert!(status.is_clean);
    assert!(status.untracked.is_empty());
    let count = ctx_core::git::status::commit_count(&repo, "HEAD").unwrap();
    assert_eq!(count, 1 + saved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_switches_leave_a_valid_registry() {
    let (dir, service) = open();
    for name in ["a", "b", "c"] {
        service.new_repository(name).await.unwrap();
    }

    let mut tasks = Vec::new();
    for round in 0..12 {
        let service = service.clone();
        let name = ["a", "b", "c"][round % 3];
        tasks.push(tokio::spawn(async move { service.switch(name).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let content = fs::read_to_string(dir.path().join("ctx.config")).unwrap();
    let registry: ctx_core::workspace::Registry = toml::from_str(&content).unwrap();
    assert_eq!(registry.discovered, vec!["a", "b", "c"]);
    assert!(registry
        .active
        .as_deref()
        .map(|a| registry.contains(a))
        .unwrap_or(false));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_previews_run_alongside_reads() {
    let (dir, service) = open();
    service.new_repository("r").await.unwrap();
    service.explore("side").await.unwrap();
    fs::write(dir.path().join("r").join("side.md"), "side\n").unwrap();
    service.save("side").await.unwrap();
    service.checkout("main").await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let preview = service.integrate("side", true).await?;
            let status = service.status().await?;
            Ok::<_, CtxError>((preview, status))
        }));
    }
    for task in tasks {
        let (preview, status) = task.await.unwrap().unwrap();
        assert!(matches!(preview, IntegrationOutcome::Preview(ref p) if p.changed_files == vec!["side.md".to_string()]));
        assert_eq!(status.branch, "main");
        assert!(status.is_clean);
    }
}
