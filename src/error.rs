//! Error taxonomy for the context repository manager

use std::path::PathBuf;

use serde_json::{json, Value};
use thiserror::Error;

use crate::git::GitError;

/// Every failure a caller can see. All variants are recoverable and carry
/// enough structure to act on; only `AdapterFailure` is unexpected.
#[derive(Error, Debug)]
pub enum CtxError {
    #[error("No active context repository. Create one with `ctx new <name>`")]
    NoActiveRepository,

    #[error("Context repository '{0}' is not registered")]
    UnknownRepository(String),

    #[error("A context repository named '{0}' is already registered")]
    NameCollision(String),

    #[error("'{}' is not a marked context repository", .0.display())]
    NotAMarkedRepository(PathBuf),

    #[error("'{}' is not a directory directly inside the workspace", .0.display())]
    OutsideWorkspace(PathBuf),

    #[error("Invalid repository name: '{0}'")]
    InvalidName(String),

    #[error("Context repository '{0}' is missing its marker or version control")]
    RepositoryUnavailable(String),

    #[error("Working tree has uncommitted changes; save or discard them first")]
    UncommittedChanges,

    #[error("Exploration '{0}' already exists")]
    BranchAlreadyExists(String),

    #[error("Exploration '{0}' does not exist")]
    UnknownBranch(String),

    #[error("'{0}' is not a valid exploration name")]
    InvalidBranchName(String),

    #[error("Cannot integrate exploration '{0}' into itself")]
    CannotIntegrateIntoSelf(String),

    #[error("Diff takes at most two branches, got {0}")]
    TooManyBranches(usize),

    #[error("Save message cannot be empty")]
    EmptyMessage,

    #[error("Integrating '{source_branch}' produced conflicts in {} file(s)", .paths.len())]
    MergeConflict {
        source_branch: String,
        paths: Vec<String>,
    },

    #[error("Config file {} is corrupt: {reason}", .path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },

    #[error("'{0}' is the active repository; switch to another one before deregistering it")]
    ActiveRepositoryCannotBeDeregistered(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version control failure: {0}")]
    AdapterFailure(#[from] GitError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CtxResult<T> = Result<T, CtxError>;

impl CtxError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CtxError::NoActiveRepository => "no_active_repository",
            CtxError::UnknownRepository(_) => "unknown_repository",
            CtxError::NameCollision(_) => "name_collision",
            CtxError::NotAMarkedRepository(_) => "not_a_marked_repository",
            CtxError::OutsideWorkspace(_) => "outside_workspace",
            CtxError::InvalidName(_) => "invalid_name",
            CtxError::RepositoryUnavailable(_) => "repository_unavailable",
            CtxError::UncommittedChanges => "uncommitted_changes",
            CtxError::BranchAlreadyExists(_) => "branch_already_exists",
            CtxError::UnknownBranch(_) => "unknown_branch",
            CtxError::InvalidBranchName(_) => "invalid_branch_name",
            CtxError::CannotIntegrateIntoSelf(_) => "cannot_integrate_into_self",
            CtxError::TooManyBranches(_) => "too_many_branches",
            CtxError::EmptyMessage => "empty_message",
            CtxError::MergeConflict { .. } => "merge_conflict",
            CtxError::ConfigCorrupt { .. } => "config_corrupt",
            CtxError::ActiveRepositoryCannotBeDeregistered(_) => {
                "active_repository_cannot_be_deregistered"
            }
            CtxError::Io { .. } => "io_error",
            CtxError::AdapterFailure(_) => "adapter_failure",
            CtxError::Internal(_) => "internal_error",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CtxError::Io {
            path: path.into(),
            source,
        }
    }

    /// Structured form handed to callers: code, message and any payload
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let CtxError::MergeConflict {
            source_branch,
            paths,
        } = self
        {
            value["source_branch"] = json!(source_branch);
            value["paths"] = json!(paths);
        }
        value
    }
}

/// Convert from tokio JoinError
impl From<tokio::task::JoinError> for CtxError {
    fn from(e: tokio::task::JoinError) -> Self {
        CtxError::Internal(format!("Task failed: {}", e))
    }
}
