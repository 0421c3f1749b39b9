//! Filesystem watching for resolved templates
//!
//! One non-recursive watch per search directory. A modification of a file
//! that has been resolved is announced as [`UPDATE_EVENT`] with the logical
//! name it was last resolved under; every other change is ignored.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::WatchError;
use crate::events::{EventBus, UPDATE_EVENT};
use crate::mapping::PathMapping;

/// Starts watches for a list of search directories
pub struct WatchManager;

impl WatchManager {
    /// Watch every existing directory in `dirs`
    ///
    /// A directory that cannot be watched is logged and skipped.
    pub fn start(dirs: &[PathBuf], mapping: PathMapping, bus: Arc<EventBus>) -> WatchHandle {
        debug!(count = dirs.len(), "WatchManager::start: called");
        let mut watchers = Vec::new();
        for dir in dirs {
            if !dir.is_dir() {
                debug!(dir = %dir.display(), "WatchManager::start: skipping missing directory");
                continue;
            }
            match watch_directory(dir, mapping.clone(), Arc::clone(&bus)) {
                Ok(watcher) => watchers.push((dir.clone(), watcher)),
                Err(e) => warn!("[watch] {e}"),
            }
        }
        WatchHandle { watchers }
    }
}

fn watch_directory(dir: &Path, mapping: PathMapping, bus: Arc<EventBus>) -> Result<RecommendedWatcher, WatchError> {
    let owned = dir.to_path_buf();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            dispatch(&owned, &event, &mapping, &bus);
        }
        Err(e) => warn!(dir = %owned.display(), "[watch] notify error: {e}"),
    })?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| WatchError::Path {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
    debug!(dir = %dir.display(), "watch_directory: watching");
    Ok(watcher)
}

/// True for content or metadata changes; creations, removals and renames do not count
pub fn is_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(k) if !matches!(k, ModifyKind::Name(_)))
}

/// Translate one notification from `dir` into update events
///
/// Returns how many update events were emitted. Paths are keyed as
/// `dir/<file name>` so they match what the resolver recorded even when the
/// platform reports a canonicalized path.
pub fn dispatch(dir: &Path, event: &Event, mapping: &PathMapping, bus: &EventBus) -> usize {
    if !is_change(&event.kind) {
        return 0;
    }
    let mut emitted = 0;
    for path in &event.paths {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let key = dir.join(file_name);
        let Some(name) = mapping.lookup(&key) else {
            debug!(path = %key.display(), "dispatch: unmapped path");
            continue;
        };
        debug!(path = %key.display(), %name, "dispatch: emitting update");
        if let Err(e) = bus.emit(UPDATE_EVENT, &name) {
            warn!(%name, "[watch] update listener failed: {e}");
        }
        emitted += 1;
    }
    emitted
}

/// Active watches; dropping the handle releases them
pub struct WatchHandle {
    watchers: Vec<(PathBuf, RecommendedWatcher)>,
}

impl WatchHandle {
    /// Directories currently watched
    pub fn directories(&self) -> Vec<&Path> {
        self.watchers.iter().map(|(dir, _)| dir.as_path()).collect()
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Release every watch now
    pub fn stop(self) {
        debug!(count = self.watchers.len(), "WatchHandle::stop: called");
        drop(self);
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle").field("directories", &self.directories()).finish()
    }
}
