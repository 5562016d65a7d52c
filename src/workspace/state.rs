//! Registry persistence (ctx.config)
//!
//! The registry is the only durable state of the manager: which context
//! repositories are known and which one is active. Every write replaces the
//! whole file atomically (temp file in the same directory, then one rename),
//! so concurrent readers see either the old or the new registry, never a mix.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{CtxError, CtxResult};

/// Registry file at the workspace root
pub const CONFIG_FILE_NAME: &str = "ctx.config";

/// Known repositories and the active one - persisted to TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(rename = "active_ctx", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(rename = "discovered_ctx", default)]
    pub discovered: Vec<String>,
}

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.discovered.iter().any(|n| n == name)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.as_deref() == Some(name)
    }

    /// Append a name; fails with `NameCollision` if it is already known
    ///
    /// The first repository added to an empty registry becomes active.
    pub fn insert(&mut self, name: &str) -> CtxResult<()> {
        if self.contains(name) {
            return Err(CtxError::NameCollision(name.to_string()));
        }
        self.discovered.push(name.to_string());
        if self.active.is_none() {
            self.active = Some(name.to_string());
        }
        Ok(())
    }

    /// Remove a name; the active repository cannot be removed
    pub fn remove(&mut self, name: &str) -> CtxResult<()> {
        if self.is_active(name) {
            return Err(CtxError::ActiveRepositoryCannotBeDeregistered(
                name.to_string(),
            ));
        }
        let before = self.discovered.len();
        self.discovered.retain(|n| n != name);
        if self.discovered.len() == before {
            return Err(CtxError::UnknownRepository(name.to_string()));
        }
        Ok(())
    }

    /// Point `active` at a registered name
    pub fn set_active(&mut self, name: &str) -> CtxResult<()> {
        if !self.contains(name) {
            return Err(CtxError::UnknownRepository(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Check the persisted invariants: unique names, active ∈ discovered
    pub fn check_invariants(&self) -> Result<(), String> {
        for (i, name) in self.discovered.iter().enumerate() {
            if self.discovered[..i].contains(name) {
                return Err(format!("duplicate repository name '{}'", name));
            }
        }
        if let Some(active) = &self.active {
            if !self.contains(active) {
                return Err(format!(
                    "active repository '{}' is not in the discovered list",
                    active
                ));
            }
        }
        Ok(())
    }
}

/// Durable key/value store for the [`Registry`]
///
/// Reads go straight to disk and may run concurrently. Writes are serialized
/// by an internal mutex and applied as load-modify-replace in [`update`].
///
/// [`update`]: ConfigStore::update
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            path: workspace_root.join(CONFIG_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry; a missing file is an empty registry
    pub fn load(&self) -> CtxResult<Registry> {
        if !self.path.exists() {
            return Ok(Registry::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| CtxError::io(&self.path, e))?;

        let registry: Registry = toml::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        registry.check_invariants().map_err(|reason| self.corrupt(reason))?;
        Ok(registry)
    }

    /// Atomically replace the persisted registry
    pub fn save(&self, registry: &Registry) -> CtxResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CtxError::Internal("config write lock poisoned".to_string()))?;
        self.write_atomic(registry)
    }

    /// Apply `f` to the freshly loaded registry and persist the result
    ///
    /// Holds the write lock for the whole read-modify-write, so concurrent
    /// updates never lose each other's changes. Nothing is written when `f`
    /// fails.
    pub fn update<T, F>(&self, f: F) -> CtxResult<T>
    where
        F: FnOnce(&mut Registry) -> CtxResult<T>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CtxError::Internal("config write lock poisoned".to_string()))?;

        let mut registry = self.load()?;
        let value = f(&mut registry)?;
        registry
            .check_invariants()
            .map_err(|reason| CtxError::Internal(format!("refusing to persist registry: {}", reason)))?;
        self.write_atomic(&registry)?;
        Ok(value)
    }

    fn write_atomic(&self, registry: &Registry) -> CtxResult<()> {
        let content = toml::to_string_pretty(registry)
            .map_err(|e| CtxError::Internal(format!("Failed to serialize registry: {}", e)))?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_path = parent.join(format!(
            "{}.{}.tmp",
            CONFIG_FILE_NAME,
            uuid::Uuid::new_v4().simple()
        ));

        let written = (|| -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(CtxError::io(&self.path, e));
        }

        debug!(path = %self.path.display(), active = ?registry.active, "Registry saved");
        Ok(())
    }

    fn corrupt(&self, reason: String) -> CtxError {
        CtxError::ConfigCorrupt {
            path: self.path.clone(),
            reason,
        }
    }
}
