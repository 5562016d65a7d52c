//! The VCS adapter seam
//!
//! The workflow engine only talks to version control through [`Vcs`]. Every
//! method takes the repository root and returns typed results; textual git
//! output never crosses this boundary.

use std::path::Path;

use super::utils::{ChangeEntry, DiffScope, Divergence, GitError, MergeResult, MergeSimulation};
use super::{branches, commit, integration, operations, status};

pub trait Vcs: Send + Sync {
    /// Initialize version control with `trunk` as the unborn branch; idempotent
    fn init(&self, repo: &Path, trunk: &str) -> Result<(), GitError>;
    fn is_initialized(&self, repo: &Path) -> bool;
    fn has_commits(&self, repo: &Path) -> bool;

    fn create_branch(&self, repo: &Path, name: &str) -> Result<(), GitError>;
    fn delete_branch(&self, repo: &Path, name: &str) -> Result<(), GitError>;
    fn checkout(&self, repo: &Path, name: &str) -> Result<(), GitError>;
    fn current_branch(&self, repo: &Path) -> Result<String, GitError>;
    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool, GitError>;
    fn list_branches(&self, repo: &Path) -> Result<Vec<String>, GitError>;
    fn is_valid_branch_name(&self, repo: &Path, name: &str) -> Result<bool, GitError>;

    fn is_clean(&self, repo: &Path) -> Result<bool, GitError>;
    fn untracked_files(&self, repo: &Path) -> Result<Vec<String>, GitError>;
    fn is_merging(&self, repo: &Path) -> bool;
    fn conflicted_files(&self, repo: &Path) -> Vec<String>;

    fn stage_all(&self, repo: &Path) -> Result<(), GitError>;
    fn unstage_all(&self, repo: &Path) -> Result<(), GitError>;
    /// Commit the index; returns the short SHA
    fn commit(&self, repo: &Path, message: &str) -> Result<String, GitError>;
    fn commit_count(&self, repo: &Path, rev: &str) -> Result<u32, GitError>;

    fn merge(&self, repo: &Path, branch: &str) -> Result<MergeResult, GitError>;
    fn merge_dry_run(&self, repo: &Path, branch: &str) -> Result<MergeSimulation, GitError>;
    fn reset_hard(&self, repo: &Path) -> Result<(), GitError>;
    fn clean_untracked(&self, repo: &Path) -> Result<(), GitError>;

    /// Changes selected by `scope`; branch names are passed through unchecked
    fn diff(&self, repo: &Path, scope: &DiffScope) -> Result<Vec<ChangeEntry>, GitError>;
    fn divergence_from(&self, repo: &Path, base: &str) -> Result<Divergence, GitError>;
}

/// [`Vcs`] backed by the `git` command line
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl Vcs for GitCli {
    fn init(&self, repo: &Path, trunk: &str) -> Result<(), GitError> {
        commit::init_repo(repo, trunk)
    }

    fn is_initialized(&self, repo: &Path) -> bool {
        repo.join(".git").exists()
    }

    fn has_commits(&self, repo: &Path) -> bool {
        super::utils::has_commits(repo)
    }

    fn create_branch(&self, repo: &Path, name: &str) -> Result<(), GitError> {
        branches::create_branch(repo, name)
    }

    fn delete_branch(&self, repo: &Path, name: &str) -> Result<(), GitError> {
        branches::delete_branch(repo, name)
    }

    fn checkout(&self, repo: &Path, name: &str) -> Result<(), GitError> {
        branches::checkout(repo, name)
    }

    fn current_branch(&self, repo: &Path) -> Result<String, GitError> {
        branches::current_branch(repo)
    }

    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool, GitError> {
        branches::branch_exists(repo, name)
    }

    fn list_branches(&self, repo: &Path) -> Result<Vec<String>, GitError> {
        branches::list_branches(repo)
    }

    fn is_valid_branch_name(&self, repo: &Path, name: &str) -> Result<bool, GitError> {
        branches::is_valid_branch_name(repo, name)
    }

    fn is_clean(&self, repo: &Path) -> Result<bool, GitError> {
        status::is_clean(repo)
    }

    fn untracked_files(&self, repo: &Path) -> Result<Vec<String>, GitError> {
        status::untracked_files(repo)
    }

    fn is_merging(&self, repo: &Path) -> bool {
        super::utils::is_merging(repo)
    }

    fn conflicted_files(&self, repo: &Path) -> Vec<String> {
        super::utils::get_conflict_files(repo)
    }

    fn stage_all(&self, repo: &Path) -> Result<(), GitError> {
        commit::stage_all(repo)
    }

    fn unstage_all(&self, repo: &Path) -> Result<(), GitError> {
        commit::unstage_all(repo)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<String, GitError> {
        commit::commit(repo, message)
    }

    fn commit_count(&self, repo: &Path, rev: &str) -> Result<u32, GitError> {
        status::commit_count(repo, rev)
    }

    fn merge(&self, repo: &Path, branch: &str) -> Result<MergeResult, GitError> {
        operations::merge(repo, branch)
    }

    fn merge_dry_run(&self, repo: &Path, branch: &str) -> Result<MergeSimulation, GitError> {
        integration::merge_dry_run(repo, branch)
    }

    fn reset_hard(&self, repo: &Path) -> Result<(), GitError> {
        operations::reset_hard(repo)
    }

    fn clean_untracked(&self, repo: &Path) -> Result<(), GitError> {
        operations::clean_untracked(repo)
    }

    fn diff(&self, repo: &Path, scope: &DiffScope) -> Result<Vec<ChangeEntry>, GitError> {
        status::diff_scoped(repo, scope)
    }

    fn divergence_from(&self, repo: &Path, base: &str) -> Result<Divergence, GitError> {
        status::divergence_from(repo, base)
    }
}
