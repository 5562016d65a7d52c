//! Async facade over the manager, for CLI and long-lived callers
//!
//! Each call runs on the blocking pool; the VCS adapter shells out and the
//! per-repository locks are synchronous.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{CtxError, CtxResult};
use crate::git::{ChangeEntry, DiffScope, GitCli, Vcs};
use crate::workflow::{
    CheckoutOutcome, DiscardOutcome, ExploreOutcome, IntegrationOutcome, RepositoryStatus,
    SaveOutcome, WorkflowEngine,
};
use crate::workspace::{
    ActiveContextSwitcher, ConfigStore, ContextRepository, ReconcileReport, RepositoryInfo,
    RepositoryRegistry, WorkspaceConfig,
};

struct Inner {
    config: WorkspaceConfig,
    registry: Arc<RepositoryRegistry>,
    switcher: Arc<ActiveContextSwitcher>,
    engine: WorkflowEngine,
}

/// Cheap to clone; clones share the registry, the locks and the config store
#[derive(Clone)]
pub struct ContextService {
    inner: Arc<Inner>,
}

impl ContextService {
    /// Open the workspace at `workspace_root` using the git command line
    pub fn open(workspace_root: &Path) -> CtxResult<Self> {
        Self::with_vcs(workspace_root, Arc::new(GitCli))
    }

    pub fn with_vcs(workspace_root: &Path, vcs: Arc<dyn Vcs>) -> CtxResult<Self> {
        if !workspace_root.is_dir() {
            return Err(CtxError::io(
                workspace_root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "workspace root is not a directory"),
            ));
        }

        let config = WorkspaceConfig::load(workspace_root)?;
        let store = Arc::new(ConfigStore::new(workspace_root));
        let registry = Arc::new(RepositoryRegistry::new(
            workspace_root,
            store,
            config.repository.clone(),
            vcs,
        ));
        let switcher = Arc::new(ActiveContextSwitcher::new(registry.clone()));
        let engine = WorkflowEngine::new(switcher.clone());

        debug!(root = %workspace_root.display(), trunk = %config.repository.trunk, "Workspace opened");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                registry,
                switcher,
                engine,
            }),
        })
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.inner.config
    }

    pub fn workspace_root(&self) -> &Path {
        self.inner.registry.workspace_root()
    }

    async fn run<T, F>(&self, f: F) -> CtxResult<T>
    where
        F: FnOnce(&Inner) -> CtxResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&inner)).await?
    }

    /// Create `<workspace>/<name>` as a context repository and activate it
    pub async fn new_repository(&self, name: &str) -> CtxResult<ContextRepository> {
        let name = name.to_string();
        self.run(move |s| {
            let path = s.registry.workspace_root().join(&name);
            s.registry.create(&path, &name)
        })
        .await
    }

    pub async fn list(&self) -> CtxResult<Vec<RepositoryInfo>> {
        self.run(|s| s.registry.list()).await
    }

    pub async fn current(&self) -> CtxResult<ContextRepository> {
        self.run(|s| s.switcher.current()).await
    }

    pub async fn switch(&self, name: &str) -> CtxResult<ContextRepository> {
        let name = name.to_string();
        self.run(move |s| s.switcher.switch_to(&name)).await
    }

    pub async fn register(&self, path: impl Into<PathBuf>) -> CtxResult<ContextRepository> {
        let path = path.into();
        self.run(move |s| s.registry.register(&path)).await
    }

    pub async fn deregister(&self, name: &str) -> CtxResult<()> {
        let name = name.to_string();
        self.run(move |s| s.registry.deregister(&name)).await
    }

    pub async fn discover(&self) -> CtxResult<Vec<ContextRepository>> {
        self.run(|s| Ok(s.registry.discover())).await
    }

    pub async fn reconcile(&self) -> CtxResult<ReconcileReport> {
        self.run(|s| s.registry.reconcile()).await
    }

    pub async fn status(&self) -> CtxResult<RepositoryStatus> {
        self.run(|s| s.engine.status()).await
    }

    pub async fn explore(&self, topic: &str) -> CtxResult<ExploreOutcome> {
        let topic = topic.to_string();
        self.run(move |s| s.engine.explore(&topic)).await
    }

    pub async fn checkout(&self, branch: &str) -> CtxResult<CheckoutOutcome> {
        let branch = branch.to_string();
        self.run(move |s| s.engine.checkout(&branch)).await
    }

    pub async fn save(&self, message: &str) -> CtxResult<SaveOutcome> {
        let message = message.to_string();
        self.run(move |s| s.engine.save(&message)).await
    }

    pub async fn integrate(&self, source: &str, preview: bool) -> CtxResult<IntegrationOutcome> {
        let source = source.to_string();
        self.run(move |s| s.engine.integrate(&source, preview)).await
    }

    pub async fn discard(&self, force: bool) -> CtxResult<DiscardOutcome> {
        self.run(move |s| s.engine.discard(force)).await
    }

    pub async fn diff(&self, scope: DiffScope) -> CtxResult<Vec<ChangeEntry>> {
        self.run(move |s| s.engine.diff(&scope)).await
    }
}
