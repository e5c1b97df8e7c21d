//! Pages: one route's artifact, watcher, activity and render logic.
//!
//! # Module Structure
//!
//! ```text
//! page/
//! ├── error.rs     # PageError
//! ├── state.rs     # Lifecycle, cached artifact state
//! ├── watcher.rs   # Dependency watcher
//! ├── render.rs    # Render pipeline
//! ├── registry.rs  # Route → Page map
//! └── mod.rs       # Page (this file)
//! ```
//!
//! # Build flow
//!
//! ```text
//! render ─▶ init(Active) ─┬─ artifact on disk ──────────────▶ load ─▶ Ready
//!                         └─ missing ─▶ BuildQueue::request ─▶ build ─▶ load
//!
//! watcher ─▶ on_source_change ─▶ Stale ─(100ms if idle)─▶ BuildQueue::submit
//! ```

mod error;
mod registry;
mod render;
mod state;
mod watcher;

#[cfg(test)]
mod tests;

pub use error::PageError;
pub use registry::PageRegistry;
pub use state::{Lifecycle, ResolvedHashes};
pub use watcher::PageWatcher;

use std::{
    path::PathBuf,
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    artifact::{ArtifactStore, BuildArtifact},
    compiler::{BuildRequest, BuildTarget},
    core::{Priority, RoutePath},
    debug,
    engine::Engine,
    log,
    reload::Activity,
    utils::hash::fingerprint,
};
use state::PageState;

/// Delay before an idle page's rebuild is queued, so active pages go first.
pub const REBUILD_DEBOUNCE: Duration = Duration::from_millis(100);

pub struct Page {
    route: RoutePath,
    name: String,
    artifact: ArtifactStore,
    js_path: String,
    css_path: String,
    engine: Arc<Engine>,
    state: RwLock<PageState>,
    activity: Activity,
    watcher: Mutex<Option<PageWatcher>>,
    /// Heartbeat subscription task
    listener: Mutex<Option<JoinHandle<()>>>,
    this: Weak<Page>,
}

impl Page {
    /// Create an unbuilt page. Must be called inside a tokio runtime when
    /// the engine carries a heartbeat source.
    pub fn new(route: RoutePath, engine: Arc<Engine>) -> Arc<Self> {
        let name = route.display_name();
        let config = engine.config();
        let artifact = ArtifactStore::for_page(&config.build.dir, &name);
        let prefix = config.render.asset_prefix();
        let js_path = format!("{prefix}/{name}.js");
        let css_path = format!("{prefix}/{name}.css");

        Arc::new_cyclic(|this| {
            let listener = engine
                .heartbeats()
                .map(|tx| spawn_heartbeat_listener(route.clone(), tx.subscribe(), this.clone()));

            Self {
                route,
                name,
                artifact,
                js_path,
                css_path,
                engine,
                state: RwLock::new(PageState::default()),
                activity: Activity::new(),
                watcher: Mutex::new(None),
                listener: Mutex::new(listener),
                this: this.clone(),
            }
        })
    }

    #[inline]
    pub fn route(&self) -> &RoutePath {
        &self.route
    }

    /// Sanitized identifier, used for artifact and asset file names.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative(&self) -> &str {
        self.route.relative()
    }

    pub fn artifact_path(&self) -> &std::path::Path {
        self.artifact.path()
    }

    pub fn js_path(&self) -> &str {
        &self.js_path
    }

    pub fn css_path(&self) -> &str {
        &self.css_path
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.read().lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle().is_ready()
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn is_active(&self) -> bool {
        self.activity.is_active()
    }

    /// A browser viewing this page is alive.
    pub fn heartbeat(&self) {
        self.activity.heartbeat();
    }

    /// Client bundle of a ready page.
    pub fn client_code(&self) -> Option<String> {
        let state = self.state.read();
        state
            .client
            .as_ref()
            .filter(|_| state.lifecycle.is_ready())
            .map(|c| c.code.clone())
    }

    /// Cached server CSS of a ready page (empty for client-only pages).
    pub fn server_css(&self) -> Option<String> {
        let state = self.state.read();
        state.lifecycle.is_ready().then(|| {
            state
                .server
                .as_ref()
                .map(|s| s.css.code.clone())
                .unwrap_or_default()
        })
    }

    pub fn hashes(&self) -> ResolvedHashes {
        self.state.read().hashes.clone()
    }

    /// Number of files the current watcher observes.
    pub fn watched_files(&self) -> usize {
        self.watcher.lock().as_ref().map_or(0, PageWatcher::file_count)
    }

    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.state.write().lifecycle = lifecycle;
    }

    fn arc(&self) -> Result<Arc<Self>, PageError> {
        self.this
            .upgrade()
            .ok_or_else(|| PageError::Cancelled(self.route.clone()))
    }

    // =========================================================================
    // Build and init
    // =========================================================================

    /// Load the artifact, or have the queue build it first when missing.
    pub async fn init(&self, priority: Priority) -> Result<(), PageError> {
        if self.load().await? {
            return Ok(());
        }

        debug!("page"; "{} has no artifact, requesting {} build", self.route, priority.label());
        self.set_lifecycle(Lifecycle::Building);
        let target: Arc<dyn BuildTarget> = self.arc()?;
        let result = self.engine.queue().request(target, priority).await;
        if result.is_err() {
            // Nothing is building any more, e.g. the queue cancelled the request
            let mut state = self.state.write();
            if state.lifecycle == Lifecycle::Building {
                state.lifecycle = Lifecycle::Unbuilt;
            }
        }
        result
    }

    /// Run the external build step, then load what it wrote.
    pub async fn build(&self) -> Result<(), PageError> {
        let request = BuildRequest {
            name: self.name.clone(),
            path: self.route.clone(),
            build_path: self.artifact.path().to_path_buf(),
            config: self.engine.config().build.options.clone(),
        };

        debug!("build"; "building {}", self.route);
        if let Err(err) = self.engine.invoker().invoke(&request).await {
            let _ = self.artifact.remove().await;
            self.set_lifecycle(Lifecycle::Unbuilt);
            return Err(PageError::build(&self.route, err));
        }
        if !self.load().await? {
            return Err(PageError::build(&self.route, "build step wrote no artifact"));
        }
        Ok(())
    }

    /// Read the artifact from disk and make it current.
    ///
    /// `Ok(false)` when there is no artifact: the page is back to unbuilt.
    async fn load(&self) -> Result<bool, PageError> {
        let artifact = match self.artifact.read().await {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                self.set_lifecycle(Lifecycle::Unbuilt);
                return Ok(false);
            }
            Err(err) => {
                log!("page"; "{}: {}, removing artifact", self.route, err);
                let _ = self.artifact.remove().await;
                self.set_lifecycle(Lifecycle::Unbuilt);
                return Err(err);
            }
        };

        let module = match &artifact.server {
            Some(server) => match self.engine.loader().load(&self.name, &server.code).await {
                Ok(module) => Some(module),
                Err(err) => {
                    // Artifact stays on disk; the next init retries the load
                    self.set_lifecycle(Lifecycle::Stale);
                    return Err(PageError::module(&self.route, err));
                }
            },
            None => None,
        };

        let watch_files = self.resolve_watch_files(&artifact);
        let hashes = resolve_hashes(&artifact);
        {
            let mut state = self.state.write();
            state.client = Some(Arc::new(artifact.client));
            state.server = artifact.server.map(Arc::new);
            state.hashes = hashes;
            state.module = module;
            state.lifecycle = Lifecycle::Ready;
        }
        debug!("page"; "{} ready", self.route);

        if self.engine.watch_enabled() {
            self.rewatch(&watch_files);
            self.engine.notify_reload(&self.route);
        }
        Ok(true)
    }

    fn resolve_watch_files(&self, artifact: &BuildArtifact) -> Vec<PathBuf> {
        let root = self.engine.config().get_root();
        artifact
            .client
            .watch_files
            .iter()
            .map(|f| if f.is_absolute() { f.clone() } else { root.join(f) })
            .collect()
    }

    /// Replace the watcher, closing the previous one first.
    fn rewatch(&self, files: &[PathBuf]) {
        let mut slot = self.watcher.lock();
        slot.take();
        if files.is_empty() {
            return;
        }

        let this = self.this.clone();
        match PageWatcher::spawn(&self.route, files, move || {
            if let Some(page) = this.upgrade() {
                page.on_source_change();
            }
        }) {
            Ok(watcher) => *slot = Some(watcher),
            Err(err) => log!("watch"; "{}", err),
        }
    }

    /// A watched dependency changed: mark stale and queue a rebuild.
    ///
    /// Priority is the activity at the moment of the change. Idle pages wait
    /// [`REBUILD_DEBOUNCE`] first, unless running inside a desktop shell.
    pub fn on_source_change(&self) {
        let active = self.activity.is_active();
        self.set_lifecycle(Lifecycle::Stale);
        let Ok(page) = self.arc() else {
            return;
        };

        let priority = Priority::from(active);
        let delay = !active && !self.engine.is_embedded();
        debug!("watch"; "{} is stale, queueing {} rebuild", self.route, priority.label());

        tokio::spawn(async move {
            if delay {
                tokio::time::sleep(REBUILD_DEBOUNCE).await;
            }
            page.set_lifecycle(Lifecycle::Building);
            let target: Arc<dyn BuildTarget> = page.clone();
            page.engine.queue().submit(target, priority);
        });
    }

    /// Release the watcher, the heartbeat subscription and the idle timer.
    pub fn close(&self) {
        self.watcher.lock().take();
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        self.activity.close();
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("route", &self.route)
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle())
            .field("active", &self.is_active())
            .finish()
    }
}

#[async_trait]
impl BuildTarget for Page {
    fn route(&self) -> &RoutePath {
        &self.route
    }

    async fn build(&self) -> Result<(), PageError> {
        Page::build(self).await
    }
}

/// Artifact hashes, falling back to content fingerprints.
fn resolve_hashes(artifact: &BuildArtifact) -> ResolvedHashes {
    ResolvedHashes {
        js: artifact
            .hashes
            .js
            .clone()
            .unwrap_or_else(|| fingerprint(&artifact.client.code)),
        css: artifact
            .hashes
            .css
            .clone()
            .unwrap_or_else(|| fingerprint(artifact.server_css())),
    }
}

/// Turn heartbeats echoing `route` into activity.
fn spawn_heartbeat_listener(
    route: RoutePath,
    mut rx: broadcast::Receiver<RoutePath>,
    page: Weak<Page>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(beat) if beat == route => match page.upgrade() {
                    Some(page) => page.heartbeat(),
                    None => break,
                },
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
