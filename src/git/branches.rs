//! Git branch management
//!
//! Provides functions for listing, checking out, creating and deleting branches.

use std::path::Path;

use super::utils::*;

/// Name of the checked-out branch, or `"HEAD"` when detached
///
/// Uses `git symbolic-ref --short -q HEAD`, which also answers for an
/// unborn branch (repository without commits).
pub fn current_branch(workspace_root: &Path) -> Result<String, GitError> {
    ensure_repo(workspace_root)?;

    let output = run_git(workspace_root, &["symbolic-ref", "--short", "-q", "HEAD"])?;
    if output.status.success() {
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !name.is_empty() {
            return Ok(name);
        }
    }

    // Exit status 1 with no output means a detached HEAD
    if output.status.code() == Some(1) {
        Ok("HEAD".to_string())
    } else {
        Err(command_failed(&["symbolic-ref"], &output))
    }
}

/// List local branches
///
/// Uses `git for-each-ref refs/heads --format="%(refname:short)"`
pub fn list_branches(workspace_root: &Path) -> Result<Vec<String>, GitError> {
    ensure_repo(workspace_root)?;
    let out = git_checked(
        workspace_root,
        &["for-each-ref", "refs/heads", "--format=%(refname:short)"],
    )?;
    Ok(non_empty_lines(&out))
}

/// Whether a local branch exists
pub fn branch_exists(workspace_root: &Path, branch: &str) -> Result<bool, GitError> {
    ensure_repo(workspace_root)?;
    let refname = format!("refs/heads/{}", branch);
    let output = run_git(workspace_root, &["show-ref", "--verify", "--quiet", &refname])?;
    Ok(output.status.success())
}

/// Whether `name` is acceptable as a new branch name
///
/// `check-ref-format --branch` expands `@` and `@{-N}` shorthands and accepts
/// them, so those are refused before asking git.
pub fn is_valid_branch_name(workspace_root: &Path, name: &str) -> Result<bool, GitError> {
    if name.starts_with('@') || name.contains("@{") {
        return Ok(false);
    }
    let output = run_git(workspace_root, &["check-ref-format", "--branch", name])?;
    Ok(output.status.success())
}

/// Create a branch at HEAD without checking it out
pub fn create_branch(workspace_root: &Path, branch: &str) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    git_checked(workspace_root, &["branch", branch]).map(|_| ())
}

/// Check out an existing branch
pub fn checkout(workspace_root: &Path, branch: &str) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    git_checked(workspace_root, &["checkout", "-q", branch]).map(|_| ())
}

/// Force-delete a local branch
pub fn delete_branch(workspace_root: &Path, branch: &str) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    git_checked(workspace_root, &["branch", "-D", branch]).map(|_| ())
}
