//! Integration preview in a disposable worktree
//!
//! Simulates merging a branch into HEAD without touching the user's working
//! tree, index or branch pointers. The merge runs in a detached worktree
//! created under the system temp dir and removed again on every exit path.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::status::changed_files_since_merge_base;
use super::utils::*;

/// Detached worktree that removes itself when dropped
struct PreviewWorktree {
    repo_root: PathBuf,
    path: PathBuf,
}

impl PreviewWorktree {
    /// `git worktree add --detach <tmp> HEAD`
    fn create(repo_root: &Path) -> Result<Self, GitError> {
        let path = std::env::temp_dir().join(format!("ctx-preview-{}", uuid::Uuid::new_v4()));
        let path_str = path.to_string_lossy().to_string();

        git_checked(
            repo_root,
            &["worktree", "add", "--detach", "-q", &path_str, "HEAD"],
        )?;
        debug!(path = %path.display(), "Preview worktree created");

        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            path,
        })
    }
}

impl Drop for PreviewWorktree {
    fn drop(&mut self) {
        // Unmerged entries can make `worktree remove` refuse, so abort first
        let _ = run_git(&self.path, &["merge", "--abort"]);

        let path_str = self.path.to_string_lossy().to_string();
        let removed = run_git(
            &self.repo_root,
            &["worktree", "remove", "--force", &path_str],
        )
        .map(|o| o.status.success())
        .unwrap_or(false);

        if !removed {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove preview worktree");
            }
            let _ = run_git(&self.repo_root, &["worktree", "prune"]);
        }
        debug!(path = %self.path.display(), "Preview worktree removed");
    }
}

/// Whether `ancestor` is reachable from `descendant`
pub fn is_ancestor(repo_root: &Path, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
    let args = ["merge-base", "--is-ancestor", ancestor, descendant];
    let output = run_git(repo_root, &args)?;
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(command_failed(&args, &output)),
    }
}

/// Simulate `git merge <source>` into HEAD
///
/// Steps:
/// 1. Collect the files `source` changed since the merge base (read-only diff)
/// 2. Short-circuit when `source` is already contained in HEAD
/// 3. Merge with `--no-commit --no-ff` inside a detached preview worktree
/// 4. Read the unmerged paths there, then discard the worktree
pub fn merge_dry_run(repo_root: &Path, source: &str) -> Result<MergeSimulation, GitError> {
    ensure_repo(repo_root)?;

    if is_ancestor(repo_root, source, "HEAD")? {
        return Ok(MergeSimulation {
            already_integrated: true,
            ..MergeSimulation::default()
        });
    }

    let changed_files = changed_files_since_merge_base(repo_root, source)?;

    let worktree = PreviewWorktree::create(repo_root)?;
    let args = ["merge", "--no-commit", "--no-ff", source];
    let output = run_git(&worktree.path, &args)?;

    let conflicts = if output.status.success() {
        vec![]
    } else if is_merging(&worktree.path) {
        get_conflict_files(&worktree.path)
    } else {
        return Err(command_failed(&args, &output));
    };

    Ok(MergeSimulation {
        would_conflict: !conflicts.is_empty(),
        conflicts,
        changed_files,
        already_integrated: false,
    })
}
