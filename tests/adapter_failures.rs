//! Failure paths of the workflow engine, driven through a scripted `Vcs`

use std::error::Error as _;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ctx_core::git::{
    ChangeEntry, DiffScope, Divergence, GitError, MergeResult, MergeSimulation, Vcs,
};
use ctx_core::workflow::WorkflowEngine;
use ctx_core::workspace::{
    ActiveContextSwitcher, ConfigStore, RepositoryRegistry, WorkspaceConfig,
};
use ctx_core::CtxError;
use tempfile::TempDir;

/// Records every call; `reset_hard` and `commit` fail when asked to
#[derive(Default)]
struct ScriptedVcs {
    calls: Mutex<Vec<&'static str>>,
    fail_reset: bool,
    fail_commit: bool,
    merging: bool,
}

impl ScriptedVcs {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl Vcs for ScriptedVcs {
    fn init(&self, _: &Path, _: &str) -> Result<(), GitError> {
        Ok(())
    }
    fn is_initialized(&self, _: &Path) -> bool {
        true
    }
    fn has_commits(&self, _: &Path) -> bool {
        true
    }
    fn create_branch(&self, _: &Path, _: &str) -> Result<(), GitError> {
        self.record("create_branch");
        Ok(())
    }
    fn delete_branch(&self, _: &Path, _: &str) -> Result<(), GitError> {
        self.record("delete_branch");
        Ok(())
    }
    fn checkout(&self, _: &Path, _: &str) -> Result<(), GitError> {
        self.record("checkout");
        Ok(())
    }
    fn current_branch(&self, _: &Path) -> Result<String, GitError> {
        Ok("main".to_string())
    }
    fn branch_exists(&self, _: &Path, name: &str) -> Result<bool, GitError> {
        Ok(name == "main")
    }
    fn list_branches(&self, _: &Path) -> Result<Vec<String>, GitError> {
        Ok(vec!["main".to_string()])
    }
    fn is_valid_branch_name(&self, _: &Path, _: &str) -> Result<bool, GitError> {
        Ok(true)
    }
    fn is_clean(&self, _: &Path) -> Result<bool, GitError> {
        Ok(false)
    }
    fn untracked_files(&self, _: &Path) -> Result<Vec<String>, GitError> {
        Ok(vec!["scratch.md".to_string()])
    }
    fn is_merging(&self, _: &Path) -> bool {
        self.merging
    }
    fn conflicted_files(&self, _: &Path) -> Vec<String> {
        vec![]
    }
    fn stage_all(&self, _: &Path) -> Result<(), GitError> {
        self.record("stage_all");
        Ok(())
    }
    fn unstage_all(&self, _: &Path) -> Result<(), GitError> {
        self.record("unstage_all");
        Ok(())
    }
    fn commit(&self, _: &Path, _: &str) -> Result<String, GitError> {
        self.record("commit");
        if self.fail_commit {
            Err(GitError::CommandFailed("git commit: hook rejected".to_string()))
        } else {
            Ok("abc1234".to_string())
        }
    }
    fn commit_count(&self, _: &Path, _: &str) -> Result<u32, GitError> {
        Ok(1)
    }
    fn merge(&self, _: &Path, _: &str) -> Result<MergeResult, GitError> {
        self.record("merge");
        Ok(MergeResult::AlreadyUpToDate)
    }
    fn merge_dry_run(&self, _: &Path, _: &str) -> Result<MergeSimulation, GitError> {
        Ok(MergeSimulation::default())
    }
    fn reset_hard(&self, _: &Path) -> Result<(), GitError> {
        self.record("reset_hard");
        if self.fail_reset {
            Err(GitError::CommandFailed("git reset: index.lock exists".to_string()))
        } else {
            Ok(())
        }
    }
    fn clean_untracked(&self, _: &Path) -> Result<(), GitError> {
        self.record("clean_untracked");
        Ok(())
    }
    fn diff(&self, _: &Path, _: &DiffScope) -> Result<Vec<ChangeEntry>, GitError> {
        Ok(vec![])
    }
    fn divergence_from(&self, _: &Path, _: &str) -> Result<Divergence, GitError> {
        Ok(Divergence { ahead: 0, behind: 0 })
    }
}

/// Workspace with one marked, registered and active repository `R`
fn engine_with(vcs: Arc<ScriptedVcs>) -> (TempDir, WorkflowEngine) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("R")).unwrap();
    fs::write(dir.path().join("R").join(".ctx"), "").unwrap();

    let config = WorkspaceConfig::default();
    let store = Arc::new(ConfigStore::new(dir.path()));
    store.update(|r| r.insert("R")).unwrap();
    let registry = Arc::new(RepositoryRegistry::new(
        dir.path(),
        store,
        config.repository,
        vcs,
    ));
    let engine = WorkflowEngine::new(Arc::new(ActiveContextSwitcher::new(registry)));
    (dir, engine)
}

#[test]
fn test_failed_reset_skips_clean() {
    let vcs = Arc::new(ScriptedVcs {
        fail_reset: true,
        ..ScriptedVcs::default()
    });
    let (_dir, engine) = engine_with(vcs.clone());

    let err = engine.discard(true).unwrap_err();
    assert!(matches!(err, CtxError::AdapterFailure(GitError::CommandFailed(_))));
    assert!(err.source().unwrap().to_string().contains("index.lock"));
    assert_eq!(vcs.calls(), vec!["reset_hard"]);
}

#[test]
fn test_successful_reset_then_clean_in_order() {
    let vcs = Arc::new(ScriptedVcs::default());
    let (_dir, engine) = engine_with(vcs.clone());

    let outcome = engine.discard(true).unwrap();
    assert_eq!(outcome.removed, vec!["scratch.md".to_string()]);
    assert_eq!(vcs.calls(), vec!["reset_hard", "clean_untracked"]);
}

#[test]
fn test_failed_commit_unstages_again() {
    let vcs = Arc::new(ScriptedVcs {
        fail_commit: true,
        ..ScriptedVcs::default()
    });
    let (_dir, engine) = engine_with(vcs.clone());

    let err = engine.save("snapshot").unwrap_err();
    assert!(matches!(err, CtxError::AdapterFailure(_)));
    assert!(err.source().unwrap().to_string().contains("hook rejected"));
    assert_eq!(vcs.calls(), vec!["stage_all", "commit", "unstage_all"]);
}

#[test]
fn test_failed_commit_during_merge_keeps_index() {
    let vcs = Arc::new(ScriptedVcs {
        fail_commit: true,
        merging: true,
        ..ScriptedVcs::default()
    });
    let (_dir, engine) = engine_with(vcs.clone());

    assert!(engine.save("resolve").is_err());
    assert_eq!(vcs.calls(), vec!["stage_all", "commit"]);
}
