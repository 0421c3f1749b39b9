//! Module references in logical template names
//!
//! A logical name is either flat (`foo/bar.html`) or prefixed with the module
//! that owns it (`blog:foo/bar.html`). Rewritten templates prepend their own
//! module to every path they reference, so a name can carry several prefixes
//! (`blog:forms:field.html`). Only the last prefix counts.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// `module:rest`, where module is a run of ASCII word characters or hyphens
static MODULE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_\-]+):(.+)$").expect("module prefix pattern is valid"));

/// Parsed form of a logical template name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    /// Owning module, if the name was namespaced
    pub module: Option<String>,
    /// Path to look up inside the module's view folders (or the search paths)
    pub residual: String,
}

impl ModuleReference {
    pub fn is_namespaced(&self) -> bool {
        self.module.is_some()
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}:{}", module, self.residual),
            None => write!(f, "{}", self.residual),
        }
    }
}

/// Split a logical name into its module and residual path
///
/// Prefixes are stripped repeatedly and the last one stripped wins:
/// `a:b:c` parses to module `b`, residual `c`.
pub fn parse(name: &str) -> ModuleReference {
    let mut module = None;
    let mut rest = name;
    while let Some(caps) = MODULE_PREFIX.captures(rest) {
        let (Some(prefix), Some(suffix)) = (caps.get(1), caps.get(2)) else {
            break;
        };
        if is_drive_letter(prefix.as_str(), suffix.as_str()) {
            break;
        }
        module = Some(prefix.as_str());
        rest = suffix.as_str();
    }
    debug!(%name, ?module, residual = %rest, "reference::parse: done");
    ModuleReference {
        module: module.map(str::to_string),
        residual: rest.to_string(),
    }
}

/// `C:\x` and `C:/x` are absolute paths, not module `C`
fn is_drive_letter(prefix: &str, suffix: &str) -> bool {
    prefix.len() == 1 && suffix.starts_with(['/', '\\'])
}
