//! Semantic workflow operations on the active repository
//!
//! Every operation resolves the active repository first, then takes that
//! repository's lock: mutating operations exclusively, reads shared. The VCS
//! is only reached through the [`Vcs`] adapter.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CtxError, CtxResult};
use crate::git::{ChangeEntry, DiffScope, MergeResult, Vcs};
use crate::workspace::{ActiveContextSwitcher, ContextRepository};

use super::locks::{exclusive, shared, RepoLocks};
use super::types::*;

pub struct WorkflowEngine {
    switcher: Arc<ActiveContextSwitcher>,
    locks: RepoLocks,
}

impl WorkflowEngine {
    pub fn new(switcher: Arc<ActiveContextSwitcher>) -> Self {
        Self {
            switcher,
            locks: RepoLocks::new(),
        }
    }

    fn vcs(&self) -> &dyn Vcs {
        self.switcher.registry().vcs().as_ref()
    }

    fn trunk(&self) -> &str {
        &self.switcher.registry().settings().trunk
    }

    /// The active repository, required to still carry its marker and VCS
    fn active(&self) -> CtxResult<ContextRepository> {
        let repo = self.switcher.current()?;
        if !repo.is_valid() {
            return Err(CtxError::RepositoryUnavailable(repo.name));
        }
        Ok(repo)
    }

    /// Tracked changes or an unfinished merge block branch movement
    fn ensure_settled(&self, repo: &ContextRepository) -> CtxResult<()> {
        if self.vcs().is_merging(&repo.path) || !self.vcs().is_clean(&repo.path)? {
            return Err(CtxError::UncommittedChanges);
        }
        Ok(())
    }

    /// Create branch `topic` from the current branch and check it out
    ///
    /// Fails without creating anything if the tree is dirty or the branch exists.
    pub fn explore(&self, topic: &str) -> CtxResult<ExploreOutcome> {
        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let _guard = exclusive(&lock);
        let vcs = self.vcs();

        if topic.trim().is_empty() || !vcs.is_valid_branch_name(&repo.path, topic)? {
            return Err(CtxError::InvalidBranchName(topic.to_string()));
        }
        self.ensure_settled(&repo)?;
        if vcs.branch_exists(&repo.path, topic)? {
            return Err(CtxError::BranchAlreadyExists(topic.to_string()));
        }

        let from = vcs.current_branch(&repo.path)?;
        vcs.create_branch(&repo.path, topic)?;
        if let Err(e) = vcs.checkout(&repo.path, topic) {
            if let Err(cleanup) = vcs.delete_branch(&repo.path, topic) {
                warn!(repository = %repo.name, branch = %topic, error = %cleanup, "Failed to remove branch after checkout failure");
            }
            return Err(e.into());
        }

        info!(repository = %repo.name, branch = %topic, from = %from, "Exploration started");
        Ok(ExploreOutcome {
            repository: repo.name,
            branch: topic.to_string(),
            from,
        })
    }

    /// Check out an existing branch (e.g. back to the trunk)
    pub fn checkout(&self, branch: &str) -> CtxResult<CheckoutOutcome> {
        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let _guard = exclusive(&lock);
        let vcs = self.vcs();

        if branch.trim().is_empty() || !vcs.branch_exists(&repo.path, branch)? {
            return Err(CtxError::UnknownBranch(branch.to_string()));
        }

        let previous = vcs.current_branch(&repo.path)?;
        if previous == branch {
            return Ok(CheckoutOutcome {
                repository: repo.name,
                branch: branch.to_string(),
                previous,
                changed: false,
            });
        }

        self.ensure_settled(&repo)?;
        vcs.checkout(&repo.path, branch)?;

        info!(repository = %repo.name, branch = %branch, previous = %previous, "Branch checked out");
        Ok(CheckoutOutcome {
            repository: repo.name,
            branch: branch.to_string(),
            previous,
            changed: true,
        })
    }

    /// Stage everything (tracked and untracked) and commit it as one snapshot
    ///
    /// A clean tree yields `NothingToSave`. While a merge is in progress the
    /// commit is always made, since it is what concludes the merge.
    pub fn save(&self, message: &str) -> CtxResult<SaveOutcome> {
        if message.trim().is_empty() {
            return Err(CtxError::EmptyMessage);
        }

        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let _guard = exclusive(&lock);
        let vcs = self.vcs();

        let merging = vcs.is_merging(&repo.path);
        if !merging
            && vcs.is_clean(&repo.path)?
            && vcs.untracked_files(&repo.path)?.is_empty()
        {
            debug!(repository = %repo.name, "Nothing to save");
            return Ok(SaveOutcome::NothingToSave);
        }

        vcs.stage_all(&repo.path)?;
        let commit = match vcs.commit(&repo.path, message) {
            Ok(sha) => sha,
            Err(e) => {
                // A merge keeps its index; anything else goes back to unstaged
                if !merging {
                    if let Err(undo) = vcs.unstage_all(&repo.path) {
                        warn!(repository = %repo.name, error = %undo, "Failed to unstage after commit failure");
                    }
                }
                return Err(e.into());
            }
        };
        let branch = vcs.current_branch(&repo.path)?;

        info!(repository = %repo.name, branch = %branch, commit = %commit, "Changes saved");
        Ok(SaveOutcome::Saved {
            commit,
            message: message.to_string(),
            branch,
            concluded_merge: merging,
        })
    }

    /// Merge `source` into the current branch, or simulate it when `preview`
    ///
    /// A preview runs in a disposable worktree and never touches the current
    /// branch, index or working tree. A real merge that conflicts leaves the
    /// repository mid-merge and reports the conflicting paths.
    pub fn integrate(&self, source: &str, preview: bool) -> CtxResult<IntegrationOutcome> {
        if source.trim().is_empty() {
            return Err(CtxError::UnknownBranch(String::new()));
        }

        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let vcs = self.vcs();

        if preview {
            let _guard = shared(&lock);
            let target = self.integration_target(&repo, source)?;
            let sim = vcs.merge_dry_run(&repo.path, source)?;
            debug!(repository = %repo.name, source = %source, target = %target, would_conflict = sim.would_conflict, "Integration previewed");
            return Ok(IntegrationOutcome::Preview(IntegrationPreview {
                source: source.to_string(),
                target,
                would_conflict: sim.would_conflict,
                conflicts: sim.conflicts,
                changed_files: sim.changed_files,
                already_integrated: sim.already_integrated,
            }));
        }

        let _guard = exclusive(&lock);
        let target = self.integration_target(&repo, source)?;
        self.ensure_settled(&repo)?;

        match vcs.merge(&repo.path, source)? {
            MergeResult::Merged { head } => {
                info!(repository = %repo.name, source = %source, target = %target, head = %head, "Integrated");
                Ok(IntegrationOutcome::Merged {
                    source: source.to_string(),
                    target,
                    head,
                })
            }
            MergeResult::AlreadyUpToDate => Ok(IntegrationOutcome::AlreadyUpToDate {
                source: source.to_string(),
                target,
            }),
            MergeResult::Conflict(paths) => {
                warn!(repository = %repo.name, source = %source, target = %target, conflicts = paths.len(), "Integration stopped on conflicts");
                Err(CtxError::MergeConflict {
                    source_branch: source.to_string(),
                    paths,
                })
            }
        }
    }

    /// Current branch, after checking `source` exists and differs from it
    fn integration_target(&self, repo: &ContextRepository, source: &str) -> CtxResult<String> {
        if !self.vcs().branch_exists(&repo.path, source)? {
            return Err(CtxError::UnknownBranch(source.to_string()));
        }
        let target = self.vcs().current_branch(&repo.path)?;
        if target == source {
            return Err(CtxError::CannotIntegrateIntoSelf(source.to_string()));
        }
        Ok(target)
    }

    /// Reset tracked files to the last commit; with `force` also drop untracked files
    ///
    /// The reset runs first and the clean only if the reset succeeded. An
    /// in-progress merge is aborted by the reset.
    pub fn discard(&self, force: bool) -> CtxResult<DiscardOutcome> {
        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let _guard = exclusive(&lock);
        let vcs = self.vcs();

        let aborted_merge = vcs.is_merging(&repo.path);
        vcs.reset_hard(&repo.path)?;

        let removed = if force {
            let untracked = vcs.untracked_files(&repo.path)?;
            vcs.clean_untracked(&repo.path)?;
            untracked
        } else {
            Vec::new()
        };
        let branch = vcs.current_branch(&repo.path)?;

        info!(repository = %repo.name, branch = %branch, force, aborted_merge, removed = removed.len(), "Changes discarded");
        Ok(DiscardOutcome {
            repository: repo.name,
            branch,
            aborted_merge,
            removed,
        })
    }

    /// Changes of the active repository, uncommitted ones by default
    ///
    /// Every branch named by `scope` must exist locally.
    pub fn diff(&self, scope: &DiffScope) -> CtxResult<Vec<ChangeEntry>> {
        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let _guard = shared(&lock);
        let vcs = self.vcs();

        for branch in scope.branches() {
            if branch.trim().is_empty() || !vcs.branch_exists(&repo.path, branch)? {
                return Err(CtxError::UnknownBranch(branch.to_string()));
            }
        }
        Ok(vcs.diff(&repo.path, scope)?)
    }

    pub fn status(&self) -> CtxResult<RepositoryStatus> {
        let repo = self.active()?;
        let lock = self.locks.handle(&repo.name);
        let _guard = shared(&lock);
        let vcs = self.vcs();
        let trunk = self.trunk().to_string();

        let branch = vcs.current_branch(&repo.path)?;
        let branches = vcs.list_branches(&repo.path)?;
        let merging = vcs.is_merging(&repo.path);
        let conflicts = if merging {
            vcs.conflicted_files(&repo.path)
        } else {
            Vec::new()
        };

        let divergence = if branch != trunk && branches.contains(&trunk) {
            Some(vcs.divergence_from(&repo.path, &trunk)?)
        } else {
            None
        };

        Ok(RepositoryStatus {
            is_clean: vcs.is_clean(&repo.path)?,
            changes: vcs.diff(&repo.path, &DiffScope::Uncommitted)?,
            untracked: vcs.untracked_files(&repo.path)?,
            repository: repo.name,
            path: repo.path,
            branch,
            trunk,
            branches,
            merging,
            conflicts,
            divergence,
        })
    }
}
