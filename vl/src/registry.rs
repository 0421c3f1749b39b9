//! Per-module resolvers and loader chains

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::folders::ViewFolderResolver;
use crate::resolver::{PathResolver, ResolverOptions, TemplateSource};

/// Owns one [`PathResolver`] per module, created the first time it is asked for
///
/// A module's resolver searches the module's view folders as its flat search
/// paths, so a bare name requested by that module finds the module's own
/// templates (and project-level overrides of them) first.
pub struct LoaderRegistry {
    config: LoaderConfig,
    folders: Arc<dyn ViewFolderResolver>,
    resolvers: RwLock<HashMap<String, Arc<PathResolver>>>,
}

impl LoaderRegistry {
    pub fn new(config: LoaderConfig, folders: Arc<dyn ViewFolderResolver>) -> Self {
        debug!(modules = config.modules.len(), "LoaderRegistry::new: called");
        Self {
            config,
            folders,
            resolvers: RwLock::new(HashMap::new()),
        }
    }

    /// Resolver for `module`, created on first use
    pub fn resolver_for(&self, module: &str) -> Arc<PathResolver> {
        if let Some(existing) = self.resolvers.read().unwrap_or_else(PoisonError::into_inner).get(module) {
            return Arc::clone(existing);
        }

        let mut resolvers = self.resolvers.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have created it between the two locks
        if let Some(existing) = resolvers.get(module) {
            return Arc::clone(existing);
        }

        debug!(%module, "LoaderRegistry::resolver_for: creating resolver");
        let options = ResolverOptions {
            no_watch: self.config.no_watch,
            ..ResolverOptions::default()
        };
        let resolver = Arc::new(PathResolver::new(
            self.folders.folders_for(module),
            Arc::clone(&self.folders),
            options,
        ));
        resolvers.insert(module.to_string(), Arc::clone(&resolver));
        resolver
    }

    /// Chain trying `module` first, then each accessible module in order
    pub fn chain_for(&self, module: &str, accessible: &[&str]) -> LoaderChain {
        debug!(%module, ?accessible, "LoaderRegistry::chain_for: called");
        let mut resolvers = vec![self.resolver_for(module)];
        for other in accessible {
            if *other != module {
                resolvers.push(self.resolver_for(other));
            }
        }
        LoaderChain::new(resolvers)
    }

    pub fn len(&self) -> usize {
        self.resolvers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every resolver, releasing their watches once no chain holds them
    pub fn dispose(&self) {
        let drained: Vec<_> = self
            .resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        debug!(count = drained.len(), "LoaderRegistry::dispose: called");
        for (_, resolver) in drained {
            resolver.stop_watching();
        }
    }
}

/// Ordered list of resolvers; the first one that finds a template wins
#[derive(Debug, Clone)]
pub struct LoaderChain {
    resolvers: Vec<Arc<PathResolver>>,
}

impl LoaderChain {
    pub fn new(resolvers: Vec<Arc<PathResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn get_source(&self, name: &str) -> Result<Option<TemplateSource>, LoaderError> {
        debug!(%name, len = self.resolvers.len(), "LoaderChain::get_source: called");
        for resolver in &self.resolvers {
            if let Some(found) = resolver.get_source(name)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    pub fn resolvers(&self) -> &[Arc<PathResolver>] {
        &self.resolvers
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}
