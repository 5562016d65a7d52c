//! Shared fixtures: a temporary workspace wired to the real git CLI

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use ctx_core::git::{GitCli, Vcs};
use ctx_core::workflow::WorkflowEngine;
use ctx_core::workspace::{
    ActiveContextSwitcher, ConfigStore, ContextRepository, RepositoryRegistry, WorkspaceConfig,
};
use tempfile::TempDir;

pub struct TestWorkspace {
    pub dir: TempDir,
    pub registry: Arc<RepositoryRegistry>,
    pub switcher: Arc<ActiveContextSwitcher>,
    pub engine: WorkflowEngine,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = WorkspaceConfig::load(dir.path()).unwrap();
        let store = Arc::new(ConfigStore::new(dir.path()));
        let registry = Arc::new(RepositoryRegistry::new(
            dir.path(),
            store,
            config.repository,
            Arc::new(GitCli),
        ));
        let switcher = Arc::new(ActiveContextSwitcher::new(registry.clone()));
        let engine = WorkflowEngine::new(switcher.clone());
        Self {
            dir,
            registry,
            switcher,
            engine,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Create and activate a repository through the registry
    pub fn create(&self, name: &str) -> ContextRepository {
        self.registry.create(&self.repo_path(name), name).unwrap()
    }

    pub fn write(&self, repo: &str, file: &str, content: &str) {
        let path = self.repo_path(repo).join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, repo: &str, file: &str) -> String {
        fs::read_to_string(self.repo_path(repo).join(file)).unwrap()
    }

    pub fn current_branch(&self, repo: &str) -> String {
        GitCli.current_branch(&self.repo_path(repo)).unwrap()
    }

    pub fn is_clean(&self, repo: &str) -> bool {
        GitCli.is_clean(&self.repo_path(repo)).unwrap()
    }

    pub fn commit_count(&self, repo: &str, rev: &str) -> u32 {
        GitCli.commit_count(&self.repo_path(repo), rev).unwrap()
    }

    pub fn untracked(&self, repo: &str) -> Vec<String> {
        GitCli.untracked_files(&self.repo_path(repo)).unwrap()
    }

    pub fn branch_exists(&self, repo: &str, branch: &str) -> bool {
        GitCli.branch_exists(&self.repo_path(repo), branch).unwrap()
    }

    /// Raw git for assertions the adapter does not expose
    pub fn git(&self, repo: &str, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.repo_path(repo))
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Make a marked git repository by hand, without registering it
    pub fn make_marked_repo(&self, name: &str) -> PathBuf {
        let path = self.repo_path(name);
        fs::create_dir_all(&path).unwrap();
        GitCli.init(&path, "main").unwrap();
        fs::write(path.join(".ctx"), "").unwrap();
        path
    }
}
