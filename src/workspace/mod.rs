//! Workspace layer - registry of context repositories and the active pointer
//!
//! This module provides:
//! - Settings loading (.ctx.toml) and workspace root discovery
//! - Durable registry persistence (ctx.config)
//! - Repository discovery, registration and creation
//! - Active repository switching

pub mod config;
pub mod repository;
pub mod state;
pub mod switcher;

pub use config::{find_workspace_root, WorkspaceConfig};
pub use repository::{ContextRepository, ReconcileReport, RepositoryInfo, RepositoryRegistry};
pub use state::{ConfigStore, Registry};
pub use switcher::ActiveContextSwitcher;
