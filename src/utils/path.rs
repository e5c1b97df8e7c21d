//! Path utilities.
//!
//! Pure functions for path manipulation, plus the mapping from page
//! source files to route paths used by the bulk prebuild.

use std::path::{Component, Path, PathBuf};

use crate::core::RoutePath;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to joining relative paths with the current directory.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Map a page source file to its route.
///
/// `pages/blog/post.tsx` -> `/blog/post`, `pages/blog/index.tsx` -> `/blog`.
/// Returns `None` for files outside `pages_root`.
pub fn route_for_source(pages_root: &Path, file: &Path) -> Option<RoutePath> {
    let relative = file.strip_prefix(pages_root).ok()?;
    let stem = relative.file_stem()?.to_str()?;

    let mut segments: Vec<&str> = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_str()?),
                _ => return None,
            }
        }
    }
    if stem != "index" {
        segments.push(stem);
    }

    Some(RoutePath::new(&segments.join("/")))
}
