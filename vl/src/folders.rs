//! View folder resolution for namespaced template names

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{LoaderConfig, ModuleConfig};
use crate::paths;

/// Maps a module name to its candidate template directories
///
/// Earlier directories take precedence. Unknown modules yield an empty list.
pub trait ViewFolderResolver: Send + Sync {
    fn folders_for(&self, module: &str) -> Vec<PathBuf>;
}

impl ViewFolderResolver for HashMap<String, Vec<PathBuf>> {
    fn folders_for(&self, module: &str) -> Vec<PathBuf> {
        self.get(module).cloned().unwrap_or_default()
    }
}

/// View folders derived from module configuration
///
/// For each module in the inheritance chain, starting with the module itself:
///
/// 1. `<project_root>/lib/modules/<name>/views`, the project-level override
/// 2. `<dir>/views`, the module's own templates
#[derive(Debug, Clone)]
pub struct ModuleViewFolders {
    project_root: PathBuf,
    modules: HashMap<String, ModuleConfig>,
}

impl ModuleViewFolders {
    pub fn new(project_root: impl AsRef<Path>, modules: impl IntoIterator<Item = ModuleConfig>) -> Self {
        let project_root = paths::absolutize(project_root.as_ref());
        let modules = modules.into_iter().map(|m| (m.name.clone(), m)).collect();
        Self { project_root, modules }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(&config.project_root, config.modules.iter().cloned())
    }

    /// Module names from `module` up through its ancestors
    ///
    /// Stops at an unknown parent or on the first repeated name.
    pub fn chain(&self, module: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(module);
        while let Some(name) = current {
            let Some(config) = self.modules.get(name) else {
                break;
            };
            if !seen.insert(name) {
                debug!(%module, %name, "ModuleViewFolders::chain: cycle detected");
                break;
            }
            chain.push(name.to_string());
            current = config.extends.as_deref();
        }
        chain
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

impl ViewFolderResolver for ModuleViewFolders {
    fn folders_for(&self, module: &str) -> Vec<PathBuf> {
        let mut folders = Vec::new();
        for name in self.chain(module) {
            folders.push(self.project_root.join("lib").join("modules").join(&name).join("views"));
            if let Some(dir) = self.modules.get(&name).and_then(|m| m.dir.as_ref()) {
                folders.push(paths::absolutize(&dir.join("views")));
            }
        }
        debug!(%module, count = folders.len(), "ModuleViewFolders::folders_for: done");
        folders
    }
}
