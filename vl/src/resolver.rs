//! Path Resolver
//!
//! Turns a logical template name into a file on disk and its source text.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::events::{EventBus, ListenerId};
use crate::folders::ViewFolderResolver;
use crate::mapping::PathMapping;
use crate::paths;
use crate::reference;
use crate::rewrite::{self, NunjucksTokenizer, Tokenizer};
use crate::watch::{WatchHandle, WatchManager};

/// A resolved template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSource {
    /// Template text, rewritten when it came from a module's view folder
    pub source: String,
    /// Absolute path it was read from
    pub path: PathBuf,
}

/// Construction options for [`PathResolver`]
#[derive(Clone)]
pub struct ResolverOptions {
    /// Do not watch the search paths
    pub no_watch: bool,
    /// Tokenizer used to rewrite namespaced templates
    pub tokenizer: Arc<dyn Tokenizer>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            no_watch: false,
            tokenizer: Arc::new(NunjucksTokenizer),
        }
    }
}

impl ResolverOptions {
    pub fn unwatched() -> Self {
        Self {
            no_watch: true,
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverOptions").field("no_watch", &self.no_watch).finish()
    }
}

/// Loads templates by logical name
///
/// Flat names (`pages/home.html`) are searched for in the search paths in
/// order. Namespaced names (`blog:show.html`) are searched for in the view
/// folders of the named module and rewritten so that the templates they pull
/// in are namespaced too.
pub struct PathResolver {
    search_paths: Vec<PathBuf>,
    folders: Arc<dyn ViewFolderResolver>,
    tokenizer: Arc<dyn Tokenizer>,
    mapping: PathMapping,
    bus: Arc<EventBus>,
    watch: Mutex<Option<WatchHandle>>,
}

impl PathResolver {
    /// Create a resolver over `search_paths`, watching them unless `options.no_watch`
    pub fn new(search_paths: Vec<PathBuf>, folders: Arc<dyn ViewFolderResolver>, options: ResolverOptions) -> Self {
        let search_paths: Vec<PathBuf> = search_paths.iter().map(|p| paths::absolutize(p)).collect();
        debug!(?search_paths, no_watch = options.no_watch, "PathResolver::new: called");

        let mapping = PathMapping::new();
        let bus = Arc::new(EventBus::new());
        let watch = if options.no_watch {
            None
        } else {
            let handle = WatchManager::start(&search_paths, mapping.clone(), Arc::clone(&bus));
            info!("Watching {} of {} search paths", handle.len(), search_paths.len());
            Some(handle)
        };

        Self {
            search_paths,
            folders,
            tokenizer: options.tokenizer,
            mapping,
            bus,
            watch: Mutex::new(watch),
        }
    }

    /// Create a resolver over the configured search paths
    pub fn from_config(config: &LoaderConfig, folders: Arc<dyn ViewFolderResolver>) -> Self {
        let options = ResolverOptions {
            no_watch: config.no_watch,
            ..ResolverOptions::default()
        };
        Self::new(config.resolved_search_paths(), folders, options)
    }

    /// Resolve `name` to its source text
    ///
    /// Returns `Ok(None)` when no candidate file exists, so that the next
    /// loader in a chain can be tried.
    pub fn get_source(&self, name: &str) -> Result<Option<TemplateSource>, LoaderError> {
        debug!(%name, "PathResolver::get_source: called");
        let reference = reference::parse(name);

        match reference.module.as_deref() {
            Some(module) => self.get_namespaced(name, module, &reference.residual),
            None => self.get_flat(name),
        }
    }

    fn get_namespaced(&self, name: &str, module: &str, residual: &str) -> Result<Option<TemplateSource>, LoaderError> {
        let folders = self.folders.folders_for(module);
        debug!(%module, %residual, candidates = folders.len(), "PathResolver::get_namespaced: called");
        for dir in &folders {
            let path = paths::join_template_path(dir, residual);
            if !path.is_file() {
                debug!(path = %path.display(), "PathResolver::get_namespaced: not found");
                continue;
            }
            // Recorded before reading so a template that fails to rewrite still reports edits
            self.mapping.record(&path, name);
            let raw = read(&path)?;
            let source = rewrite::rewrite_with(self.tokenizer.as_ref(), &raw, module)?;
            debug!(path = %path.display(), "PathResolver::get_namespaced: found");
            return Ok(Some(TemplateSource { source, path }));
        }
        debug!(%name, "PathResolver::get_namespaced: not found anywhere");
        Ok(None)
    }

    fn get_flat(&self, name: &str) -> Result<Option<TemplateSource>, LoaderError> {
        for dir in &self.search_paths {
            let path = paths::join_template_path(dir, name);
            if !path.is_file() {
                continue;
            }
            self.mapping.record(&path, name);
            let source = read(&path)?;
            debug!(path = %path.display(), "PathResolver::get_flat: found");
            return Ok(Some(TemplateSource { source, path }));
        }
        debug!(%name, "PathResolver::get_flat: not found anywhere");
        Ok(None)
    }

    /// Subscribe to an event on this resolver's bus
    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&str) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.bus.on(event, callback)
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn mapping(&self) -> &PathMapping {
        &self.mapping
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// True while at least one search path is under watch
    pub fn is_watching(&self) -> bool {
        self.watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_empty())
    }

    /// Release all watches; resolution keeps working
    pub fn stop_watching(&self) {
        let handle = self.watch.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("search_paths", &self.search_paths)
            .field("mapped", &self.mapping.len())
            .field("watching", &self.is_watching())
            .finish()
    }
}

/// Invalid UTF-8 is replaced rather than rejected
fn read(path: &Path) -> Result<String, LoaderError> {
    let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
