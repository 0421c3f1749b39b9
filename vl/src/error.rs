//! Loader and watcher error types

use std::path::PathBuf;

use thiserror::Error;
use tplex::LexError;

/// Errors that can occur while resolving a template
///
/// A template that simply does not exist is not an error; resolution returns
/// `Ok(None)` so the next loader in a chain can be tried.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to tokenize template: {0}")]
    Lex(#[from] LexError),
}

impl LoaderError {
    /// Path of the template involved, when known
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            LoaderError::Io { path, .. } => Some(path),
            LoaderError::Lex(_) => None,
        }
    }
}

/// Errors from setting up directory watches
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    Init { reason: String },

    #[error("Cannot watch path {}: {reason}", path.display())]
    Path { path: PathBuf, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::Init { reason: e.to_string() }
    }
}
