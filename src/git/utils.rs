//! Git utilities - type definitions and helper functions
//!
//! Provides the error type, the command runner and the merge-state checks
//! shared by every other git submodule.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Serialize;

/// Kind of change reported for a single path (collapsed from porcelain XY)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed { from: String },
    Copied { from: String },
    TypeChanged,
    Untracked,
    Conflicted,
}

/// One uncommitted change in the working tree or index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    pub path: String,
    #[serde(flatten)]
    pub kind: ChangeKind,
    /// Whether the change is (at least partly) in the index
    pub staged: bool,
}

/// Which changes a diff reports
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiffScope {
    /// Staged, unstaged and untracked changes against HEAD
    #[default]
    Uncommitted,
    /// Only what is in the index
    Staged,
    /// Working tree (or index, when `staged`) against another branch
    Against { branch: String, staged: bool },
    /// What `head` changed since its merge base with `base` (`base...head`)
    Between { base: String, head: String },
}

impl DiffScope {
    /// Build a scope from a staged flag and zero, one or two branch names
    ///
    /// Returns `None` for more than two branches. `staged` has no meaning
    /// between two branches and is ignored there.
    pub fn from_args(staged: bool, branches: &[String]) -> Option<Self> {
        match branches {
            [] if staged => Some(DiffScope::Staged),
            [] => Some(DiffScope::Uncommitted),
            [branch] => Some(DiffScope::Against {
                branch: branch.clone(),
                staged,
            }),
            [base, head] => Some(DiffScope::Between {
                base: base.clone(),
                head: head.clone(),
            }),
            _ => None,
        }
    }

    /// Branch names the scope refers to
    pub fn branches(&self) -> Vec<&str> {
        match self {
            DiffScope::Uncommitted | DiffScope::Staged => vec![],
            DiffScope::Against { branch, .. } => vec![branch.as_str()],
            DiffScope::Between { base, head } => vec![base.as_str(), head.as_str()],
        }
    }
}

/// Outcome of a real merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    Merged { head: String },
    AlreadyUpToDate,
    Conflict(Vec<String>),
}

/// Outcome of a merge simulation in a disposable worktree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeSimulation {
    pub would_conflict: bool,
    pub conflicts: Vec<String>,
    pub changed_files: Vec<String>,
    pub already_integrated: bool,
}

/// Ahead/behind counts of HEAD relative to another branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub ahead: u32,
    pub behind: u32,
}

/// Error type for git operations
#[derive(Debug)]
pub enum GitError {
    NotAGitRepo,
    IoError(std::io::Error),
    CommandFailed(String),
}

impl std::fmt::Display for GitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitError::NotAGitRepo => write!(f, "Not a git repository"),
            GitError::IoError(e) => write!(f, "IO error: {}", e),
            GitError::CommandFailed(msg) => write!(f, "Git command failed: {}", msg),
        }
    }
}

impl std::error::Error for GitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Run git in `workspace_root` and return the raw output, whatever the exit status
pub fn run_git(workspace_root: &Path, args: &[&str]) -> Result<Output, GitError> {
    Command::new("git")
        .args(args)
        .current_dir(workspace_root)
        .output()
        .map_err(GitError::IoError)
}

/// Run git and require success; returns trimmed stdout
pub fn git_checked(workspace_root: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = run_git(workspace_root, args)?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(command_failed(args, &output))
    }
}

/// Build a `CommandFailed` carrying the subcommand and its stderr
pub fn command_failed(args: &[&str], output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let op = args.first().copied().unwrap_or("git");
    GitError::CommandFailed(if stderr.is_empty() {
        format!("git {} exited with {}", op, output.status)
    } else {
        format!("git {}: {}", op, stderr)
    })
}

/// Fail with `NotAGitRepo` unless `workspace_root` has its own `.git`
pub fn ensure_repo(workspace_root: &Path) -> Result<(), GitError> {
    if workspace_root.join(".git").exists() {
        Ok(())
    } else {
        Err(GitError::NotAGitRepo)
    }
}

/// Get the short SHA of HEAD
pub fn get_short_head_sha(workspace_root: &Path) -> Option<String> {
    let output = run_git(workspace_root, &["rev-parse", "--short", "HEAD"]).ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}

/// Whether HEAD points at a commit yet
pub fn has_commits(workspace_root: &Path) -> bool {
    run_git(workspace_root, &["rev-parse", "--verify", "--quiet", "HEAD"])
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Resolve a path inside the git dir; works for linked worktrees where `.git` is a file
fn git_path(workspace_root: &Path, name: &str) -> Option<PathBuf> {
    let output = run_git(workspace_root, &["rev-parse", "--git-path", name]).ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if raw.is_empty() {
        return None;
    }
    let path = PathBuf::from(raw);
    // rev-parse answers relative to the directory it ran in
    Some(if path.is_absolute() {
        path
    } else {
        workspace_root.join(path)
    })
}

/// Check if currently in a merge state
pub fn is_merging(workspace_root: &Path) -> bool {
    if workspace_root.join(".git/MERGE_HEAD").exists() {
        return true;
    }

    git_path(workspace_root, "MERGE_HEAD")
        .map(|p| p.exists())
        .unwrap_or(false)
}

/// Get list of conflicted files
pub fn get_conflict_files(workspace_root: &Path) -> Vec<String> {
    git_stdout(
        workspace_root,
        &["diff", "--name-only", "-z", "--diff-filter=U"],
    )
    .map(|out| nul_separated(&out))
    .unwrap_or_default()
}

/// Run git and require success; returns stdout untouched
///
/// For `-z` output, where trimming would eat whitespace belonging to a path.
pub fn git_stdout(workspace_root: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = run_git(workspace_root, args)?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(command_failed(args, &output))
    }
}

/// Split NUL-terminated `-z` output into paths, verbatim
pub fn nul_separated(text: &str) -> Vec<String> {
    text.split('\0')
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Split newline-separated command output into non-empty entries
///
/// Only for output git never quotes, such as ref names.
pub fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}
