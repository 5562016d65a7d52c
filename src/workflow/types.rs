//! Structured outcomes of workflow operations

use serde::Serialize;
use std::path::PathBuf;

use crate::git::{ChangeEntry, Divergence};

#[derive(Debug, Clone, Serialize)]
pub struct ExploreOutcome {
    pub repository: String,
    pub branch: String,
    /// Branch checked out before the exploration started
    pub from: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub repository: String,
    pub branch: String,
    pub previous: String,
    /// False when `branch` was already checked out
    pub changed: bool,
}

/// Result of `save`. An empty save is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved {
        commit: String,
        message: String,
        branch: String,
        /// Whether this commit concluded an in-progress merge
        concluded_merge: bool,
    },
    NothingToSave,
}

/// What integrating `source` into `target` would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationPreview {
    pub source: String,
    pub target: String,
    pub would_conflict: bool,
    pub conflicts: Vec<String>,
    /// Files `source` changed since its merge base with `target`
    pub changed_files: Vec<String>,
    /// `source` is already contained in `target`
    pub already_integrated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum IntegrationOutcome {
    Preview(IntegrationPreview),
    Merged {
        source: String,
        target: String,
        head: String,
    },
    AlreadyUpToDate {
        source: String,
        target: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscardOutcome {
    pub repository: String,
    pub branch: String,
    pub aborted_merge: bool,
    /// Untracked paths removed by a forced discard
    pub removed: Vec<String>,
}

/// Snapshot of the active repository
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStatus {
    pub repository: String,
    pub path: PathBuf,
    pub branch: String,
    pub trunk: String,
    pub branches: Vec<String>,
    pub is_clean: bool,
    pub merging: bool,
    pub conflicts: Vec<String>,
    pub changes: Vec<ChangeEntry>,
    pub untracked: Vec<String>,
    /// Ahead/behind the trunk; absent on the trunk itself or when it is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence: Option<Divergence>,
}
