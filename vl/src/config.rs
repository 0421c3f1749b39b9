//! viewloader configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Main viewloader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root that project-level overrides (`lib/modules/<name>/views`) live under
    #[serde(rename = "project-root")]
    pub project_root: PathBuf,

    /// Flat search paths, highest precedence first
    #[serde(rename = "search-paths")]
    pub search_paths: Vec<PathBuf>,

    /// Disable filesystem watching
    #[serde(rename = "no-watch")]
    pub no_watch: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Known modules and their inheritance
    pub modules: Vec<ModuleConfig>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            search_paths: vec![PathBuf::from("views")],
            no_watch: false,
            log_level: None,
            modules: Vec::new(),
        }
    }
}

/// One module that owns templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub name: String,

    /// Module directory; its `views` subdirectory holds the module's templates
    pub dir: Option<PathBuf>,

    /// Parent module whose templates this one inherits
    pub extends: Option<String>,
}

impl LoaderConfig {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .viewloader.yml
        let local_config = PathBuf::from(".viewloader.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/viewloader/viewloader.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("viewloader").join("viewloader.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load one file; relative paths inside it are taken relative to the file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let mut config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        if let Some(base) = path.parent() {
            config.rebase(base);
        }

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Peek at the log level before logging is set up
    ///
    /// Errors are swallowed: a broken config is reported later by [`LoaderConfig::load`].
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut v = vec![PathBuf::from(".viewloader.yml")];
                if let Some(dir) = dirs::config_dir() {
                    v.push(dir.join("viewloader").join("viewloader.yml"));
                }
                v
            }
        };
        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    /// Search paths made absolute and normalized, in precedence order
    pub fn resolved_search_paths(&self) -> Vec<PathBuf> {
        self.search_paths.iter().map(|p| paths::absolutize(p)).collect()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }

    fn rebase(&mut self, base: &Path) {
        let rebase = |p: &Path| if p.is_relative() { base.join(p) } else { p.to_path_buf() };
        self.project_root = rebase(&self.project_root);
        self.search_paths = self.search_paths.iter().map(|p| rebase(p)).collect();
        for module in &mut self.modules {
            if let Some(dir) = &module.dir {
                module.dir = Some(rebase(dir));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.project_root, PathBuf::from("."));
        assert_eq!(config.search_paths, vec![PathBuf::from("views")]);
        assert!(!config.no_watch);
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
project-root: /srv/site
search-paths:
  - /srv/site/views
  - /srv/shared/views
no-watch: true
log-level: debug
modules:
  - name: apostrophe-templates
    dir: /srv/site/node_modules/apostrophe/lib/modules/apostrophe-templates
  - name: blog
    dir: /srv/site/lib/blog
    extends: apostrophe-templates
"#;
        let config: LoaderConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project_root, PathBuf::from("/srv/site"));
        assert_eq!(config.search_paths.len(), 2);
        assert!(config.no_watch);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.module("blog").unwrap().extends.as_deref(), Some("apostrophe-templates"));
        assert!(config.module("missing").is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LoaderConfig = serde_yaml::from_str("no-watch: true\n").unwrap();
        assert!(config.no_watch);
        assert_eq!(config.search_paths, vec![PathBuf::from("views")]);
    }

    #[test]
    fn test_load_from_file_rebases_relative_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("viewloader.yml");
        fs::write(
            &path,
            "search-paths: [views, /abs/views]\nmodules:\n  - name: blog\n    dir: lib/blog\n",
        )
        .unwrap();

        let config = LoaderConfig::load_from_file(&path).unwrap();
        assert_eq!(config.project_root, temp.path().join("."));
        assert_eq!(config.search_paths[0], temp.path().join("views"));
        assert_eq!(config.search_paths[1], PathBuf::from("/abs/views"));
        assert_eq!(config.modules[0].dir, Some(temp.path().join("lib/blog")));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let missing = PathBuf::from("/definitely/not/here/viewloader.yml");
        assert!(LoaderConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_log_level() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("viewloader.yml");
        fs::write(&path, "log-level: warn\n").unwrap();
        assert_eq!(LoaderConfig::load_log_level(Some(&path)).as_deref(), Some("warn"));

        fs::write(&path, "log-level: [not, a, string\n").unwrap();
        assert_eq!(LoaderConfig::load_log_level(Some(&path)), None);
    }

    #[test]
    fn test_resolved_search_paths_are_absolute() {
        let config = LoaderConfig {
            search_paths: vec![PathBuf::from("views/./x/..")],
            ..Default::default()
        };
        let resolved = config.resolved_search_paths();
        assert!(resolved[0].is_absolute());
        assert!(resolved[0].ends_with("views"));
    }
}
