//! Reload delivery after a page rebuild.
//!
//! Chosen once when the engine is built: the socket broadcaster for browsers,
//! or a window-reload invoker when running inside a desktop shell.

use std::sync::Arc;

use super::LiveReloadChannel;
use crate::{core::RoutePath, debug};

/// An open window of the hosting desktop shell.
pub trait ShellWindow: Send + Sync {
    /// Current URL of the window.
    fn url(&self) -> String;

    /// Reload bypassing the cache.
    fn reload_ignoring_cache(&self);
}

/// Desktop shell embedding the engine.
pub trait DesktopShell: Send + Sync {
    fn windows(&self) -> Vec<Arc<dyn ShellWindow>>;
}

/// How a reload notice reaches the viewer of a page.
#[derive(Clone)]
pub enum ReloadNotifier {
    /// Broadcast the route over the live-reload socket
    Socket(Arc<LiveReloadChannel>),
    /// Reload matching windows of the embedding shell
    Window(Arc<dyn DesktopShell>),
}

impl std::fmt::Debug for ReloadNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socket(channel) => f.debug_tuple("Socket").field(channel).finish(),
            Self::Window(_) => f.write_str("Window"),
        }
    }
}

impl ReloadNotifier {
    /// Notify viewers of `route`. Returns how many clients or windows were reached.
    pub fn reload(&self, route: &RoutePath) -> usize {
        match self {
            Self::Socket(channel) => channel.notify(route),
            Self::Window(shell) => {
                let mut reloaded = 0;
                for window in shell.windows() {
                    if window_shows(&window.url(), route) {
                        window.reload_ignoring_cache();
                        reloaded += 1;
                    }
                }
                debug!("reload"; "reloaded {} windows showing {}", reloaded, route);
                reloaded
            }
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Window(_))
    }
}

/// Whether a window URL points at `route` (query, fragment and trailing slash ignored).
fn window_shows(url: &str, route: &RoutePath) -> bool {
    url::Url::parse(url)
        .map(|url| RoutePath::from_browser(url.path()) == *route)
        .unwrap_or(false)
}
