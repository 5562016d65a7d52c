//! Git working-tree operations
//!
//! Provides the merge, hard reset and clean primitives.
//!
//! SAFETY: `reset_hard` and `clean_untracked` are destructive and cannot be
//! undone. Callers decide when they are allowed to run.

use std::path::Path;

use super::utils::*;

/// Merge `source` into the checked-out branch (`git merge --no-edit`)
///
/// On conflict the repository is left mid-merge with markers in the working
/// tree, exactly as git leaves it.
pub fn merge(workspace_root: &Path, source: &str) -> Result<MergeResult, GitError> {
    ensure_repo(workspace_root)?;

    let before = get_short_head_sha(workspace_root);
    let args = ["merge", "--no-edit", source];
    let output = run_git(workspace_root, &args)?;

    if output.status.success() {
        let head = get_short_head_sha(workspace_root)
            .ok_or_else(|| GitError::CommandFailed("Merge finished but HEAD is unreadable".to_string()))?;
        if before.as_deref() == Some(head.as_str()) {
            return Ok(MergeResult::AlreadyUpToDate);
        }
        return Ok(MergeResult::Merged { head });
    }

    if is_merging(workspace_root) {
        let conflicts = get_conflict_files(workspace_root);
        if !conflicts.is_empty() {
            return Ok(MergeResult::Conflict(conflicts));
        }
    }

    Err(command_failed(&args, &output))
}

/// Reset index and working tree to HEAD (`git reset --hard`)
///
/// Also drops an in-progress merge.
pub fn reset_hard(workspace_root: &Path) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    git_checked(workspace_root, &["reset", "--hard", "-q", "HEAD"]).map(|_| ())
}

/// Remove untracked files and directories (`git clean -fd`); ignored files stay
pub fn clean_untracked(workspace_root: &Path) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    git_checked(workspace_root, &["clean", "-f", "-d", "-q"]).map(|_| ())
}
