//! Resolved path to logical name map shared with the watcher

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Thread-safe `absolute path -> logical name` map
///
/// Written on every successful resolution, read from the watcher thread.
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct PathMapping {
    inner: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl PathMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` was resolved from `name`, replacing any earlier name
    pub fn record(&self, path: impl Into<PathBuf>, name: impl Into<String>) {
        let path = path.into();
        let name = name.into();
        debug!(path = %path.display(), %name, "PathMapping::record: called");
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(path, name);
    }

    /// Logical name most recently resolved to `path`
    pub fn lookup(&self, path: &Path) -> Option<String> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
