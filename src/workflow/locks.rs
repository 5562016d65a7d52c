//! Per-repository exclusive sections

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lock table keyed by repository name
///
/// Mutating workflow operations hold the write side for their whole run;
/// read-only operations share the read side. A poisoned lock is recovered:
/// it guards no data, only ordering.
#[derive(Debug, Default)]
pub struct RepoLocks {
    table: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for `name`, created on first use
    pub fn handle(&self, name: &str) -> Arc<RwLock<()>> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

pub fn exclusive(lock: &RwLock<()>) -> RwLockWriteGuard<'_, ()> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

pub fn shared(lock: &RwLock<()>) -> RwLockReadGuard<'_, ()> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}
