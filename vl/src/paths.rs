//! Lexical path helpers
//!
//! Nothing here touches the filesystem. Symlinks are not resolved.

use std::path::{Component, Path, PathBuf};

/// Remove `.` and `..` components without consulting the filesystem
///
/// `..` at the root is dropped; on a relative path with nothing left to pop it
/// is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Make `path` absolute against the current directory and normalize it
pub fn absolutize(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize(&abs)
}

/// Join a template name beneath a directory
///
/// Leading separators on `name` are stripped, so an absolute-looking name is
/// still looked up inside `dir`.
pub fn join_template_path(dir: &Path, name: &str) -> PathBuf {
    let trimmed = name.trim_start_matches(['/', '\\']);
    normalize(&dir.join(trimmed))
}
