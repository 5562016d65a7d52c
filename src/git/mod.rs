// Git module - the VCS adapter, split into logical submodules:
// - utils: Common types, error handling, command runner and merge-state checks
// - status: Cleanliness, change summary, commit counts and divergence
// - branches: Branch management (list, checkout, create, delete)
// - commit: Init, staging and commits
// - operations: Merge, hard reset and clean
// - integration: Merge preview in a disposable worktree
// - adapter: The `Vcs` trait consumed by the workflow engine

pub mod adapter;
pub mod branches;
pub mod commit;
pub mod integration;
pub mod operations;
pub mod status;
pub mod utils;

pub use adapter::{GitCli, Vcs};
pub use utils::{
    ChangeEntry, ChangeKind, DiffScope, Divergence, GitError, MergeResult, MergeSimulation,
};
