//! Path normalization utilities.
//!
//! Provides consistent path handling across the pipeline:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_path` - resolve config paths against the project root
//! - `to_slash` / `relative_slash` - portable `/`-separated strings for
//!   rule matching and manifest values

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to lexical cleanup of `.` and `..` components, so paths that
/// do not exist yet still compare equal to their canonical siblings.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| lexical_normalize(path))
}

/// Remove `.` and `..` components without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a config path against the project root.
///
/// Absolute paths are kept, relative ones are joined with `root`.
/// Always returns a normalized path.
#[inline]
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    }
}

/// Render a path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> Cow<'_, str> {
    let lossy = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        lossy
    } else {
        Cow::Owned(lossy.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}

/// Path of `path` relative to `base`, `/`-separated.
///
/// Falls back to the full path when `path` is not under `base`.
pub fn relative_slash(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .map_or_else(|_| to_slash(path).into_owned(), |rel| to_slash(rel).into_owned())
}
