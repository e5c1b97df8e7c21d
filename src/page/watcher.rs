//! Dependency watcher of one page.
//!
//! Parent directories of the declared files are watched non-recursively,
//! so editors that save through rename-over still produce events for the
//! file itself. Events are filtered down to the declared set and each burst
//! already buffered is coalesced into a single change callback.

use std::path::{Path, PathBuf};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use rustc_hash::FxHashSet;
use tokio::{sync::mpsc, task::JoinHandle};

use super::PageError;
use crate::{core::RoutePath, debug, log, utils::path::normalize_path};

/// Editor artifacts that never count as a change.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
}

/// Whether an event can change file content.
fn is_content_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Watches a fixed set of files. Dropping it stops watching.
pub struct PageWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    files: usize,
}

impl PageWatcher {
    /// Start watching `files`; `on_change` runs on the runtime for every
    /// coalesced burst touching at least one of them.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn<F>(route: &RoutePath, files: &[PathBuf], on_change: F) -> Result<Self, PageError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let watched: FxHashSet<PathBuf> = files.iter().map(|f| normalize_path(f)).collect();
        let dirs: FxHashSet<PathBuf> = watched
            .iter()
            .filter_map(|f| f.parent().map(Path::to_path_buf))
            .collect();

        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Event>();
        let watch_route = route.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => log!("watch"; "{}: {}", watch_route, e),
            }
        })
        .map_err(|e| watch_error(route, e))?;

        for dir in &dirs {
            if !dir.is_dir() {
                debug!("watch"; "{}: skipping missing directory {}", route, dir.display());
                continue;
            }
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| watch_error(route, e))?;
        }

        let files = watched.len();
        let route = route.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let mut changed = touches(&event, &watched);
                while let Ok(event) = rx.try_recv() {
                    changed |= touches(&event, &watched);
                }
                if changed {
                    debug!("watch"; "{} dependency changed", route);
                    on_change();
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            task,
            files,
        })
    }

    /// Number of distinct files watched.
    pub fn file_count(&self) -> usize {
        self.files
    }
}

impl Drop for PageWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn touches(event: &notify::Event, watched: &FxHashSet<PathBuf>) -> bool {
    is_content_event(&event.kind)
        && event
            .paths
            .iter()
            .any(|p| !is_temp_file(p) && watched.contains(&normalize_event_path(p)))
}

/// Removed files can no longer be canonicalized; resolve through the parent.
fn normalize_event_path(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !path.exists() => normalize_path(parent).join(name),
        _ => normalize_path(path),
    }
}

fn watch_error(route: &RoutePath, err: notify::Error) -> PageError {
    PageError::Watch {
        route: route.clone(),
        message: err.to_string(),
    }
}
