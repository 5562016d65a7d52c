//! Context repository manager
//!
//! Keeps several git-backed "context" repositories side by side in one
//! workspace, tracks which one is active, and maps the explore / save /
//! integrate / discard vocabulary onto git.

pub mod error;
pub mod git;
pub mod service;
pub mod util;
pub mod workflow;
pub mod workspace;

pub use error::{CtxError, CtxResult};
pub use service::ContextService;
