//! Enumerate the templates a list of directories makes available

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

/// One logical name and every file that provides it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Logical name, `/`-separated and relative to its directory
    pub name: String,
    /// File that resolution returns for `name`
    pub path: PathBuf,
    /// Files with the same name in lower-precedence directories
    pub shadowed: Vec<PathBuf>,
}

/// List every file beneath `dirs`, earlier directories taking precedence
///
/// Hidden files and directories are skipped. Entries are sorted by name.
pub fn list_templates(dirs: &[PathBuf]) -> Vec<CatalogEntry> {
    debug!(count = dirs.len(), "catalog::list_templates: called");
    let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        let root = dir.clone();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| e.path() == root || !is_hidden(e.file_name().to_str()));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = logical_name(dir, entry.path()) else {
                continue;
            };
            let path = entry.path().to_path_buf();
            match entries.get_mut(&name) {
                Some(existing) => existing.shadowed.push(path),
                None => {
                    entries.insert(
                        name.clone(),
                        CatalogEntry {
                            name,
                            path,
                            shadowed: Vec::new(),
                        },
                    );
                }
            }
        }
    }

    entries.into_values().collect()
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

fn logical_name(dir: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(dir).ok()?;
    let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if parts.is_empty() { None } else { Some(parts.join("/")) }
}
