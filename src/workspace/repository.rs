//! Context repository discovery, registration and creation

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{CtxError, CtxResult};
use crate::git::Vcs;
use crate::workspace::config::RepositorySection;
use crate::workspace::state::ConfigStore;

/// Message of the commit recorded by `create`
const FIRST_COMMIT_MESSAGE: &str = "first commit";

/// A directory under the workspace root managed as one context repository
///
/// Branch and cleanliness are never cached here; they are read from version
/// control when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextRepository {
    pub name: String,
    pub path: PathBuf,
    pub marker_present: bool,
    pub vcs_initialized: bool,
}

impl ContextRepository {
    /// Inspect `<workspace_root>/<name>` on disk
    pub fn inspect(workspace_root: &Path, name: &str, marker: &str, vcs: &dyn Vcs) -> Self {
        let path = workspace_root.join(name);
        Self {
            name: name.to_string(),
            marker_present: path.join(marker).is_file(),
            vcs_initialized: vcs.is_initialized(&path),
            path,
        }
    }

    /// Qualifies for discovery: marker present AND version control initialized
    pub fn is_valid(&self) -> bool {
        self.marker_present && self.vcs_initialized
    }
}

/// One row of `list()`
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_active: bool,
    /// Directory and marker present
    pub exists: bool,
    /// Marker and version control present
    pub is_valid: bool,
}

/// Result of reconciling the scan with the persisted registry
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Newly registered names, in scan order
    pub added: Vec<String>,
    /// Registered names whose directories no longer qualify (left registered)
    pub missing: Vec<String>,
    pub active: Option<String>,
}

/// Repository names are single path segments
pub fn validate_name(name: &str) -> CtxResult<()> {
    let ok = !name.trim().is_empty()
        && name == name.trim()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if ok {
        Ok(())
    } else {
        Err(CtxError::InvalidName(name.to_string()))
    }
}

pub struct RepositoryRegistry {
    workspace_root: PathBuf,
    store: Arc<ConfigStore>,
    settings: RepositorySection,
    vcs: Arc<dyn Vcs>,
}

impl RepositoryRegistry {
    pub fn new(
        workspace_root: &Path,
        store: Arc<ConfigStore>,
        settings: RepositorySection,
        vcs: Arc<dyn Vcs>,
    ) -> Self {
        Self {
            workspace_root: workspace_root.to_path_buf(),
            store,
            settings,
            vcs,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn settings(&self) -> &RepositorySection {
        &self.settings
    }

    pub fn vcs(&self) -> &Arc<dyn Vcs> {
        &self.vcs
    }

    /// Inspect a registered (or candidate) repository by name
    pub fn resolve(&self, name: &str) -> ContextRepository {
        ContextRepository::inspect(
            &self.workspace_root,
            name,
            &self.settings.marker,
            self.vcs.as_ref(),
        )
    }

    /// Scan immediate subdirectories for qualifying repositories, sorted by name
    ///
    /// Read-only: the registry is not touched.
    pub fn discover(&self) -> Vec<ContextRepository> {
        WalkDir::new(&self.workspace_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable workspace entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_string()))
            .map(|name| self.resolve(&name))
            .filter(ContextRepository::is_valid)
            .collect()
    }

    /// Register an existing marked repository that sits directly in the workspace
    pub fn register(&self, path: &Path) -> CtxResult<ContextRepository> {
        let name = self.name_for_existing(path)?;
        let repo = self.resolve(&name);

        if !repo.marker_present {
            return Err(CtxError::NotAMarkedRepository(repo.path));
        }
        if !repo.vcs_initialized {
            return Err(CtxError::RepositoryUnavailable(name));
        }

        self.store.update(|registry| registry.insert(&name))?;
        info!(repository = %name, "Repository registered");
        Ok(repo)
    }

    /// Remove a name from the registry; the directory and its history stay
    pub fn deregister(&self, name: &str) -> CtxResult<()> {
        self.store.update(|registry| registry.remove(name))?;
        info!(repository = %name, "Repository deregistered");
        Ok(())
    }

    /// Create (or finish creating) a repository and make it active
    ///
    /// Steps, each checked before the next:
    /// 1. Create the directory if absent
    /// 2. Initialize version control with the trunk as HEAD
    /// 3. Write the marker and the seed file if absent
    /// 4. Record the first commit if the history is empty
    /// 5. Register the name and activate it in a single registry write
    ///
    /// Filesystem steps are idempotent and never rolled back; the registry is
    /// only written once all of them succeeded.
    pub fn create(&self, path: &Path, name: &str) -> CtxResult<ContextRepository> {
        validate_name(name)?;
        let path = self.absolute(path);
        if path.file_name().and_then(|n| n.to_str()) != Some(name) {
            return Err(CtxError::InvalidName(name.to_string()));
        }
        self.ensure_in_workspace(&path)?;

        if self.store.load()?.contains(name) {
            return Err(CtxError::NameCollision(name.to_string()));
        }

        fs::create_dir_all(&path).map_err(|e| CtxError::io(&path, e))?;
        self.vcs.init(&path, &self.settings.trunk)?;

        let marker = path.join(&self.settings.marker);
        if !marker.exists() {
            fs::File::create(&marker).map_err(|e| CtxError::io(&marker, e))?;
        }
        let seed = path.join(&self.settings.seed_file);
        if !seed.exists() {
            fs::write(&seed, &self.settings.seed_content).map_err(|e| CtxError::io(&seed, e))?;
        }

        if !self.vcs.has_commits(&path) {
            self.vcs.stage_all(&path)?;
            self.vcs.commit(&path, FIRST_COMMIT_MESSAGE)?;
        }

        self.store.update(|registry| {
            registry.insert(name)?;
            registry.set_active(name)
        })?;

        info!(repository = %name, path = %path.display(), "Repository created and activated");
        Ok(self.resolve(name))
    }

    /// Register every qualifying repository not yet known and report stale entries
    pub fn reconcile(&self) -> CtxResult<ReconcileReport> {
        let found = self.discover();

        let report = self.store.update(|registry| {
            let mut report = ReconcileReport::default();
            for repo in &found {
                if !registry.contains(&repo.name) {
                    registry.insert(&repo.name)?;
                    report.added.push(repo.name.clone());
                }
            }
            report.missing = registry
                .discovered
                .iter()
                .filter(|name| !found.iter().any(|r| &r.name == *name))
                .cloned()
                .collect();
            report.active = registry.active.clone();
            Ok(report)
        })?;

        for name in &report.missing {
            warn!(repository = %name, "Registered repository no longer qualifies");
        }
        info!(added = report.added.len(), missing = report.missing.len(), "Workspace reconciled");
        Ok(report)
    }

    /// Every registered repository with its on-disk state
    pub fn list(&self) -> CtxResult<Vec<RepositoryInfo>> {
        let registry = self.store.load()?;
        Ok(registry
            .discovered
            .iter()
            .map(|name| {
                let repo = self.resolve(name);
                RepositoryInfo {
                    name: name.clone(),
                    is_active: registry.is_active(name),
                    exists: repo.path.is_dir() && repo.marker_present,
                    is_valid: repo.is_valid(),
                    path: repo.path,
                }
            })
            .collect())
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    /// The parent of `path` must be the workspace root itself
    fn ensure_in_workspace(&self, path: &Path) -> CtxResult<()> {
        let root = self
            .workspace_root
            .canonicalize()
            .map_err(|e| CtxError::io(&self.workspace_root, e))?;
        let parent_matches = path
            .parent()
            .and_then(|p| p.canonicalize().ok())
            .map(|p| p == root)
            .unwrap_or(false);
        if parent_matches {
            Ok(())
        } else {
            Err(CtxError::OutsideWorkspace(path.to_path_buf()))
        }
    }

    fn name_for_existing(&self, path: &Path) -> CtxResult<String> {
        let path = self.absolute(path);
        if !path.is_dir() {
            return Err(CtxError::NotAMarkedRepository(path));
        }
        self.ensure_in_workspace(&path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CtxError::InvalidName(path.display().to_string()))?;
        validate_name(&name)?;
        Ok(name)
    }
}
