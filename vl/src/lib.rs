//! viewloader - layered, module-namespaced template loading
//!
//! Resolves logical template names to source text for a Nunjucks-style
//! template engine.
//!
//! # Core Concepts
//!
//! - **Layered search paths**: earlier directories shadow later ones
//! - **Module namespaces**: `blog:show.html` is looked up in the `blog`
//!   module's view folders, project-level overrides first
//! - **Rewriting**: a namespaced template's own `include`/`import`/`extends`/`from`
//!   references are prefixed with its module so they stay inside it
//! - **Live invalidation**: edits to resolved files are published as
//!   `"update"` events carrying the logical name
//!
//! # Architecture
//!
//! ```text
//!   name ──► reference::parse ──┬─ module ──► ViewFolderResolver ──► read ──► rewrite ──┐
//!                               └─ flat ────► search paths ────────► read ──────────────┤
//!                                                                                       ▼
//!                                       PathMapping (path -> name) ◄──── TemplateSource
//!                                              │
//!   notify ──► watch::dispatch ────────────────┴──► EventBus "update" ──► SourceCache, ...
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use viewloader::{LoaderConfig, ModuleViewFolders, PathResolver};
//!
//! let config = LoaderConfig::load(None)?;
//! let folders = Arc::new(ModuleViewFolders::from_config(&config));
//! let resolver = PathResolver::from_config(&config, folders);
//!
//! resolver.on("update", |name| {
//!     println!("{name} changed");
//!     Ok(())
//! });
//!
//! if let Some(found) = resolver.get_source("blog:show.html")? {
//!     println!("{}", found.source);
//! }
//! # Ok::<(), eyre::Report>(())
//! ```

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod folders;
pub mod mapping;
pub mod paths;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod rewrite;
pub mod watch;

// Re-export commonly used types
pub use cache::SourceCache;
pub use catalog::{CatalogEntry, list_templates};
pub use config::{LoaderConfig, ModuleConfig};
pub use error::{LoaderError, WatchError};
pub use events::{EventBus, ListenerId, UPDATE_EVENT};
pub use folders::{ModuleViewFolders, ViewFolderResolver};
pub use mapping::PathMapping;
pub use reference::ModuleReference;
pub use registry::{LoaderChain, LoaderRegistry};
pub use resolver::{PathResolver, ResolverOptions, TemplateSource};
pub use rewrite::{NunjucksTokenizer, RESERVED_KEYWORDS, Tokenizer, rewrite, rewrite_with};
pub use watch::{WatchHandle, WatchManager};
