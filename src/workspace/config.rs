//! Workspace settings parsing (.ctx.toml) and workspace root discovery

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CtxError, CtxResult};
use crate::workspace::state::CONFIG_FILE_NAME;

/// Optional settings file at the workspace root
pub const SETTINGS_FILE_NAME: &str = ".ctx.toml";

/// How many ancestors are searched for `ctx.config`
const MAX_ROOT_SEARCH_DEPTH: usize = 10;

/// Workspace settings from .ctx.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub repository: RepositorySection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySection {
    /// Branch holding the consensus state
    #[serde(default = "default_trunk")]
    pub trunk: String,
    /// Zero-length file that marks a managed repository
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_seed_file")]
    pub seed_file: String,
    #[serde(default = "default_seed_content")]
    pub seed_content: String,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            trunk: default_trunk(),
            marker: default_marker(),
            seed_file: default_seed_file(),
            seed_content: default_seed_content(),
        }
    }
}

fn default_trunk() -> String {
    "main".to_string()
}

fn default_marker() -> String {
    ".ctx".to_string()
}

fn default_seed_file() -> String {
    "ctx.txt".to_string()
}

fn default_seed_content() -> String {
    "# Context\n\nShared memory for this line of thinking.\n\n\
     - Record what is known and agreed on the trunk.\n\
     - Explore open questions on their own branches, then integrate.\n"
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl WorkspaceConfig {
    /// Load settings from a workspace root; a missing file yields the defaults
    pub fn load(workspace_root: &Path) -> CtxResult<Self> {
        let config_path = workspace_root.join(SETTINGS_FILE_NAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&config_path).map_err(|e| CtxError::io(&config_path, e))?;

        let config: Self = toml::from_str(&content).map_err(|e| CtxError::ConfigCorrupt {
            path: config_path.clone(),
            reason: e.to_string(),
        })?;
        config.validate(&config_path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> CtxResult<()> {
        let corrupt = |reason: &str| CtxError::ConfigCorrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        if self.repository.trunk.trim().is_empty() {
            return Err(corrupt("repository.trunk cannot be empty"));
        }
        if !is_plain_file_name(&self.repository.marker) {
            return Err(corrupt("repository.marker must be a plain file name"));
        }
        if !is_plain_file_name(&self.repository.seed_file) {
            return Err(corrupt("repository.seed_file must be a plain file name"));
        }
        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Find the workspace root by looking for `ctx.config` in `start` and its ancestors
///
/// Falls back to `start` when no config is found within the search depth.
pub fn find_workspace_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .take(MAX_ROOT_SEARCH_DEPTH)
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start.to_path_buf())
}
