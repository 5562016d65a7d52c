//! Git init, staging and commit operations

use std::path::Path;

use super::utils::*;

/// Identity written into a repository that has none configured
const FALLBACK_USER_NAME: &str = "ctx";
const FALLBACK_USER_EMAIL: &str = "ctx@localhost";

/// Initialize a repository whose unborn HEAD points at `trunk`
///
/// Idempotent: an existing `.git` is left untouched.
pub fn init_repo(workspace_root: &Path, trunk: &str) -> Result<(), GitError> {
    if workspace_root.join(".git").exists() {
        return Ok(());
    }

    git_checked(workspace_root, &["init", "-q"])?;
    // `init -b` needs git 2.28; symbolic-ref works on every version before the first commit
    let head_ref = format!("refs/heads/{}", trunk);
    git_checked(workspace_root, &["symbolic-ref", "HEAD", &head_ref])?;
    ensure_identity(workspace_root)
}

/// Write a repository-local identity when neither local nor global config has one
fn ensure_identity(workspace_root: &Path) -> Result<(), GitError> {
    let has = |key: &str| {
        run_git(workspace_root, &["config", "--get", key])
            .map(|o| o.status.success())
            .unwrap_or(false)
    };

    if !has("user.name") {
        git_checked(workspace_root, &["config", "user.name", FALLBACK_USER_NAME])?;
    }
    if !has("user.email") {
        git_checked(workspace_root, &["config", "user.email", FALLBACK_USER_EMAIL])?;
    }
    Ok(())
}

/// Stage every change, untracked files included (`git add -A`)
pub fn stage_all(workspace_root: &Path) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    git_checked(workspace_root, &["add", "-A"]).map(|_| ())
}

/// Drop everything from the index again, keeping the working tree (`git reset -q`)
pub fn unstage_all(workspace_root: &Path) -> Result<(), GitError> {
    ensure_repo(workspace_root)?;
    if !has_commits(workspace_root) {
        return git_checked(workspace_root, &["rm", "-r", "-q", "--cached", "."]).map(|_| ());
    }
    git_checked(workspace_root, &["reset", "-q"]).map(|_| ())
}

/// Commit the index with `message`; returns the short SHA of the new commit
pub fn commit(workspace_root: &Path, message: &str) -> Result<String, GitError> {
    ensure_repo(workspace_root)?;

    let output = run_git(workspace_root, &["commit", "-q", "-m", message])?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let error_msg = if stderr.contains("user.name") || stderr.contains("user.email") {
            "Git identity not configured. Run: git config user.name \"Your Name\" && git config user.email \"you@example.com\"".to_string()
        } else if stderr.contains("pre-commit") || stderr.contains("hook") {
            format!("Pre-commit hook failed: {}", stderr)
        } else {
            return Err(command_failed(&["commit"], &output));
        };
        return Err(GitError::CommandFailed(error_msg));
    }

    get_short_head_sha(workspace_root)
        .ok_or_else(|| GitError::CommandFailed("Commit created but HEAD is unreadable".to_string()))
}
