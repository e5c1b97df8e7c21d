//! Shared collaborators of every page.
//!
//! Built once per process (or per test) and handed to the registry:
//!
//! ```ignore
//! let engine = Engine::builder(config, scheduler)
//!     .live_reload(channel)
//!     .build();
//! let registry = PageRegistry::new(engine);
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    compiler::{BuildInvoker, BuildQueue, ScriptInvoker},
    config::EngineConfig,
    core::RoutePath,
    reload::{DesktopShell, LiveReloadChannel, ReloadNotifier},
    render::{DocumentTemplate, ModuleLoader, PreRenderHook, ScriptLoader, ShellTemplate},
};

pub struct Engine {
    config: Arc<EngineConfig>,
    invoker: Arc<dyn BuildInvoker>,
    queue: Arc<dyn BuildQueue>,
    loader: Arc<dyn ModuleLoader>,
    template: Arc<dyn DocumentTemplate>,
    notifier: Option<ReloadNotifier>,
    heartbeats: Option<broadcast::Sender<RoutePath>>,
    live_reload_port: Option<u16>,
    pre_render: Option<PreRenderHook>,
}

impl Engine {
    pub fn builder(config: Arc<EngineConfig>, queue: Arc<dyn BuildQueue>) -> EngineBuilder {
        EngineBuilder::new(config, queue)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn invoker(&self) -> &dyn BuildInvoker {
        self.invoker.as_ref()
    }

    pub fn queue(&self) -> &dyn BuildQueue {
        self.queue.as_ref()
    }

    pub fn loader(&self) -> &dyn ModuleLoader {
        self.loader.as_ref()
    }

    pub fn template(&self) -> &dyn DocumentTemplate {
        self.template.as_ref()
    }

    pub fn pre_render(&self) -> Option<&PreRenderHook> {
        self.pre_render.as_ref()
    }

    /// Heartbeat bus pages subscribe to.
    pub fn heartbeats(&self) -> Option<&broadcast::Sender<RoutePath>> {
        self.heartbeats.as_ref()
    }

    /// Attach watchers to artifact `watchFiles`.
    pub fn watch_enabled(&self) -> bool {
        self.config.serve.watch
    }

    /// Push reload notices after a successful init.
    pub fn live_reload_enabled(&self) -> bool {
        self.config.serve.live_reload && self.notifier.is_some()
    }

    /// Port to inline into the live-reload client, when the socket is up.
    pub fn live_reload_port(&self) -> Option<u16> {
        self.live_reload_port
            .filter(|_| self.config.serve.live_reload)
    }

    /// Running inside a desktop shell.
    pub fn is_embedded(&self) -> bool {
        self.notifier
            .as_ref()
            .is_some_and(ReloadNotifier::is_embedded)
    }

    /// Deliver a reload notice for `route`, if live reload is on.
    pub fn notify_reload(&self, route: &RoutePath) {
        if let Some(notifier) = self.notifier.as_ref().filter(|_| self.live_reload_enabled()) {
            notifier.reload(route);
        }
    }
}

/// Builder with the bundled collaborators as defaults.
pub struct EngineBuilder {
    config: Arc<EngineConfig>,
    queue: Arc<dyn BuildQueue>,
    invoker: Option<Arc<dyn BuildInvoker>>,
    loader: Option<Arc<dyn ModuleLoader>>,
    template: Option<Arc<dyn DocumentTemplate>>,
    notifier: Option<ReloadNotifier>,
    heartbeats: Option<broadcast::Sender<RoutePath>>,
    live_reload_port: Option<u16>,
    pre_render: Option<PreRenderHook>,
}

impl EngineBuilder {
    pub fn new(config: Arc<EngineConfig>, queue: Arc<dyn BuildQueue>) -> Self {
        Self {
            config,
            queue,
            invoker: None,
            loader: None,
            template: None,
            notifier: None,
            heartbeats: None,
            live_reload_port: None,
            pre_render: None,
        }
    }

    pub fn invoker(mut self, invoker: Arc<dyn BuildInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn template(mut self, template: Arc<dyn DocumentTemplate>) -> Self {
        self.template = Some(template);
        self
    }

    /// Socket reloads plus heartbeats from the channel's clients.
    pub fn live_reload(mut self, channel: Arc<LiveReloadChannel>) -> Self {
        self.heartbeats = Some(channel.heartbeat_sender());
        self.live_reload_port = Some(channel.port());
        self.notifier = Some(ReloadNotifier::Socket(channel));
        self
    }

    /// Window reloads through the embedding shell. Rebuilds are not debounced.
    pub fn desktop_shell(mut self, shell: Arc<dyn DesktopShell>) -> Self {
        self.notifier = Some(ReloadNotifier::Window(shell));
        self.live_reload_port = None;
        self
    }

    /// Heartbeat source other than a live-reload channel.
    pub fn heartbeats(mut self, heartbeats: broadcast::Sender<RoutePath>) -> Self {
        self.heartbeats = Some(heartbeats);
        self
    }

    pub fn pre_render(mut self, hook: PreRenderHook) -> Self {
        self.pre_render = Some(hook);
        self
    }

    pub fn build(self) -> Arc<Engine> {
        let invoker = self
            .invoker
            .unwrap_or_else(|| Arc::new(ScriptInvoker::from_config(&self.config)));
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(ScriptLoader::from_config(&self.config)));
        let template = self.template.unwrap_or_else(|| Arc::new(ShellTemplate));

        Arc::new(Engine {
            config: self.config,
            invoker,
            queue: self.queue,
            loader,
            template,
            notifier: self.notifier,
            heartbeats: self.heartbeats,
            live_reload_port: self.live_reload_port,
            pre_render: self.pre_render,
        })
    }
}
