//! Active context selection

use std::sync::Arc;
use tracing::info;

use crate::error::{CtxError, CtxResult};
use crate::workspace::repository::{ContextRepository, RepositoryRegistry};

/// Moves the single "active" pointer between registered repositories
pub struct ActiveContextSwitcher {
    registry: Arc<RepositoryRegistry>,
}

impl ActiveContextSwitcher {
    pub fn new(registry: Arc<RepositoryRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RepositoryRegistry> {
        &self.registry
    }

    /// Make `name` active. Unknown names leave the registry untouched.
    ///
    /// Switching never inspects the working tree of either repository.
    pub fn switch_to(&self, name: &str) -> CtxResult<ContextRepository> {
        let previous = self.registry.store().update(|registry| {
            let previous = registry.active.clone();
            registry.set_active(name)?;
            Ok(previous)
        })?;
        info!(from = ?previous, to = %name, "Active repository switched");
        Ok(self.registry.resolve(name))
    }

    /// The active repository as currently found on disk
    pub fn current(&self) -> CtxResult<ContextRepository> {
        let registry = self.registry.store().load()?;
        let name = registry.active.ok_or(CtxError::NoActiveRepository)?;
        Ok(self.registry.resolve(&name))
    }
}
