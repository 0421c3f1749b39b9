//! Source cache invalidated by update events

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::LoaderError;
use crate::events::{ListenerId, UPDATE_EVENT};
use crate::resolver::{PathResolver, TemplateSource};

/// Cached sources plus a per-name count of updates seen
#[derive(Debug, Default)]
struct Entries {
    sources: HashMap<String, TemplateSource>,
    generations: HashMap<String, u64>,
}

impl Entries {
    fn generation(&self, name: &str) -> u64 {
        self.generations.get(name).copied().unwrap_or(0)
    }
}

type SharedEntries = Arc<RwLock<Entries>>;

/// Caches resolved templates by logical name until their file changes
///
/// Unsubscribes from the resolver when dropped.
pub struct SourceCache {
    resolver: Arc<PathResolver>,
    entries: SharedEntries,
    listener: ListenerId,
}

impl SourceCache {
    pub fn attach(resolver: Arc<PathResolver>) -> Self {
        let entries: SharedEntries = Arc::default();
        let evict = Arc::clone(&entries);
        let listener = resolver.on(UPDATE_EVENT, move |name| {
            let mut entries = evict.write().unwrap_or_else(PoisonError::into_inner);
            *entries.generations.entry(name.to_string()).or_insert(0) += 1;
            let removed = entries.sources.remove(name);
            debug!(%name, evicted = removed.is_some(), "SourceCache: update");
            Ok(())
        });
        Self {
            resolver,
            entries,
            listener,
        }
    }

    /// Cached source for `name`, loading it on a miss
    ///
    /// A load that overlaps an update for the same name is returned but not
    /// cached.
    pub fn get(&self, name: &str) -> Result<Option<TemplateSource>, LoaderError> {
        let generation = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = entries.sources.get(name) {
                debug!(%name, "SourceCache::get: hit");
                return Ok(Some(hit.clone()));
            }
            entries.generation(name)
        };
        debug!(%name, generation, "SourceCache::get: miss");
        let loaded = self.resolver.get_source(name)?;
        if let Some(found) = &loaded {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if entries.generation(name) == generation {
                entries.sources.insert(name.to_string(), found.clone());
            } else {
                debug!(%name, "SourceCache::get: updated while loading, not cached");
            }
        }
        Ok(loaded)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SourceCache {
    fn drop(&mut self) {
        self.resolver.bus().off(UPDATE_EVENT, self.listener);
    }
}
