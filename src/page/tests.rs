//! Page state machine and registry tests.
//!
//! Collaborators are replaced by in-process fakes: the invoker writes
//! artifact JSON directly, the queue builds inline and records submits,
//! and SSR modules echo their context.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tempfile::TempDir;
use tokio::sync::broadcast;

use super::*;
use crate::{
    artifact::{ArtifactStore, BuildArtifact, ClientComponent, ContentHashes, CssPayload, ServerComponent},
    compiler::{BuildInvoker, BuildQueue},
    config::EngineConfig,
    reload::{DesktopShell, ShellWindow},
    render::{ModuleLoader, RenderContext, Renderable, Rendered},
};

// =============================================================================
// Fakes
// =============================================================================

/// Writes `artifact` to the requested build path, or fails.
struct FakeInvoker {
    artifact: Mutex<Option<BuildArtifact>>,
    calls: AtomicUsize,
}

impl FakeInvoker {
    fn writing(artifact: BuildArtifact) -> Arc<Self> {
        Arc::new(Self {
            artifact: Mutex::new(Some(artifact)),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            artifact: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildInvoker for FakeInvoker {
    async fn invoke(&self, request: &BuildRequest) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let artifact = self.artifact.lock().clone();
        match artifact {
            Some(artifact) => {
                ArtifactStore::new(&request.build_path).write(&artifact).await?;
                Ok(())
            }
            None => {
                // A partial file must not survive a failed build
                if let Some(parent) = request.build_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&request.build_path, "{\"client\":").await?;
                bail!("build script exited with status 1")
            }
        }
    }
}

/// Builds requested pages inline; records every call.
#[derive(Default)]
struct RecordingQueue {
    requests: Mutex<Vec<(RoutePath, Priority)>>,
    submits: Mutex<Vec<(RoutePath, Priority)>>,
}

impl RecordingQueue {
    fn requests(&self) -> Vec<(RoutePath, Priority)> {
        self.requests.lock().clone()
    }

    fn submits(&self) -> Vec<(RoutePath, Priority)> {
        self.submits.lock().clone()
    }
}

#[async_trait]
impl BuildQueue for RecordingQueue {
    async fn request(
        &self,
        target: Arc<dyn BuildTarget>,
        priority: Priority,
    ) -> Result<(), PageError> {
        self.requests.lock().push((target.route().clone(), priority));
        target.build().await
    }

    fn submit(&self, target: Arc<dyn BuildTarget>, priority: Priority) {
        self.submits.lock().push((target.route().clone(), priority));
    }
}

/// Renders `<h1>{title}</h1>`; remembers the last context it saw.
struct EchoModule {
    fail: bool,
    seen: Arc<Mutex<Option<Value>>>,
    saw_current: Arc<AtomicBool>,
}

#[async_trait]
impl Renderable for EchoModule {
    async fn render(&self, context: &RenderContext) -> Result<Rendered> {
        *self.seen.lock() = Some(Value::Object(context.locals().clone()));
        self.saw_current
            .store(crate::render::current().is_some(), Ordering::SeqCst);
        if self.fail {
            bail!("ReferenceError: window is not defined");
        }
        let title = context.get("title").and_then(Value::as_str).unwrap_or("");
        Ok(Rendered {
            head: format!("<title>{title}</title>"),
            html: format!("<h1>{title}</h1>"),
            css: Some("h1{color:red}".into()),
        })
    }
}

/// Loads echo modules; the first `fail_first` loaded modules fail to render.
#[derive(Default)]
struct EchoLoader {
    loads: AtomicUsize,
    fail_first: usize,
    seen: Arc<Mutex<Option<Value>>>,
    saw_current: Arc<AtomicBool>,
}

impl EchoLoader {
    fn failing_first(n: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first: n,
            ..Self::default()
        })
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Value {
        self.seen.lock().clone().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl ModuleLoader for EchoLoader {
    async fn load(&self, _name: &str, _code: &str) -> Result<Arc<dyn Renderable>> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(EchoModule {
            fail: n < self.fail_first,
            seen: Arc::clone(&self.seen),
            saw_current: Arc::clone(&self.saw_current),
        }))
    }
}

struct FakeWindow {
    url: String,
    reloads: AtomicUsize,
}

impl ShellWindow for FakeWindow {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn reload_ignoring_cache(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeShell(Vec<Arc<FakeWindow>>);

impl DesktopShell for FakeShell {
    fn windows(&self) -> Vec<Arc<dyn ShellWindow>> {
        self.0
            .iter()
            .map(|w| Arc::clone(w) as Arc<dyn ShellWindow>)
            .collect()
    }
}

// =============================================================================
// Helpers
// =============================================================================

struct Fixture {
    dir: TempDir,
    invoker: Arc<FakeInvoker>,
    queue: Arc<RecordingQueue>,
    loader: Arc<EchoLoader>,
}

impl Fixture {
    fn new(invoker: Arc<FakeInvoker>) -> Self {
        Self::with_loader(invoker, Arc::new(EchoLoader::default()))
    }

    fn with_loader(invoker: Arc<FakeInvoker>, loader: Arc<EchoLoader>) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            invoker,
            queue: Arc::new(RecordingQueue::default()),
            loader,
        }
    }

    fn build_dir(&self) -> PathBuf {
        self.dir.path().join(".pagewright")
    }

    fn config(&self, watch: bool, live_reload: bool) -> Arc<EngineConfig> {
        let mut config = EngineConfig::default();
        config.root = self.dir.path().to_path_buf();
        config.build.dir = self.build_dir();
        config.serve.watch = watch;
        config.serve.live_reload = live_reload;
        Arc::new(config)
    }

    fn builder(&self, watch: bool, live_reload: bool) -> crate::engine::EngineBuilder {
        Engine::builder(self.config(watch, live_reload), self.queue.clone())
            .invoker(self.invoker.clone())
            .loader(self.loader.clone())
    }

    fn registry(&self) -> PageRegistry {
        PageRegistry::new(self.builder(false, false).build())
    }

    async fn write_artifact(&self, name: &str, artifact: &BuildArtifact) {
        ArtifactStore::for_page(&self.build_dir(), name)
            .write(artifact)
            .await
            .unwrap();
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.build_dir().join(format!("{name}.json"))
    }
}

fn sample_artifact() -> BuildArtifact {
    BuildArtifact {
        client: ClientComponent {
            code: "<js>".into(),
            watch_files: vec![],
        },
        server: Some(ServerComponent {
            code: "<ssr>".into(),
            css: CssPayload {
                code: ".a{}".into(),
            },
        }),
        hashes: ContentHashes {
            js: Some("h1".into()),
            css: Some("h2".into()),
        },
    }
}

fn locals(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

// =============================================================================
// Render
// =============================================================================

#[tokio::test]
async fn test_render_cached_artifact() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();

    let doc = registry
        .render(&RoutePath::new("/about"), locals(json!({"title": "Hi"})))
        .await
        .unwrap();

    assert!(doc.contains("<h1>Hi</h1>"));
    assert!(doc.contains("<title>Hi</title>"));
    assert!(doc.contains(".a{}"));
    assert!(!doc.contains("h1{color:red}"));
    assert!(doc.contains("/_pages/about.js?v=h1"));
    assert!(doc.contains("/_pages/about.css?v=h2"));
    assert!(!doc.contains("WebSocket"));

    assert_eq!(fx.invoker.calls(), 0);
    assert!(fx.queue.requests().is_empty());
    assert!(fx.queue.submits().is_empty());
    assert!(registry.get(&RoutePath::new("/about")).unwrap().is_ready());
}

#[tokio::test]
async fn test_render_for_email() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();

    let html = registry
        .render_email(&RoutePath::new("/about"), locals(json!({"title": "Hi"})))
        .await
        .unwrap();

    assert_eq!(html, "<h1>Hi</h1>");
}

#[tokio::test]
async fn test_render_is_idempotent() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();
    let route = RoutePath::new("/about");

    let first = registry
        .render(&route, locals(json!({"title": "Hi"})))
        .await
        .unwrap();
    let second = registry
        .render(&route, locals(json!({"title": "Hi"})))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.loader.loads(), 1);
}

#[tokio::test]
async fn test_engine_fields_not_overridden() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();

    registry
        .render(
            &RoutePath::new("/about"),
            locals(json!({"path": "/evil", "name": "evil", "title": "Hi", "settings": {"x": 1}})),
        )
        .await
        .unwrap();

    let seen = fx.loader.seen();
    assert_eq!(seen["path"], json!("/about"));
    assert_eq!(seen["name"], json!("about"));
    assert_eq!(seen["jsPath"], json!("/_pages/about.js"));
    assert_eq!(seen["title"], json!("Hi"));
    // Excluded by `render.exclude_locals`
    assert!(seen.get("settings").is_none());
    assert!(fx.loader.saw_current.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_client_only_page() {
    let fx = Fixture::new(FakeInvoker::failing());
    let mut artifact = sample_artifact();
    artifact.server = None;
    artifact.hashes = ContentHashes::default();
    fx.write_artifact("widget", &artifact).await;
    let registry = fx.registry();

    let doc = registry
        .render(&RoutePath::new("/widget"), Map::new())
        .await
        .unwrap();

    assert_eq!(fx.loader.loads(), 0);
    assert!(doc.contains(r#"<div id="widget"></div>"#));
    let page = registry.get(&RoutePath::new("/widget")).unwrap();
    assert_eq!(page.hashes().js, crate::utils::hash::fingerprint("<js>"));
    assert_eq!(page.server_css().as_deref(), Some(""));
}

#[tokio::test]
async fn test_pre_render_hook_sees_context() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let seen = Arc::new(Mutex::new(None));
    let hook_seen = Arc::clone(&seen);
    let engine = fx
        .builder(false, false)
        .pre_render(Arc::new(move |ctx: &RenderContext| {
            *hook_seen.lock() = ctx.get("path").cloned();
        }))
        .build();
    let registry = PageRegistry::new(engine);

    registry
        .render(&RoutePath::new("/about"), Map::new())
        .await
        .unwrap();

    assert_eq!(*seen.lock(), Some(json!("/about")));
}

#[tokio::test]
async fn test_dev_css_and_template_literal_props() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let mut config = (*fx.config(false, false)).clone();
    config.render.dev_css = true;
    config.render.props_template_literal = true;
    let engine = Engine::builder(Arc::new(config), fx.queue.clone())
        .invoker(fx.invoker.clone())
        .loader(fx.loader.clone())
        .build();
    let registry = PageRegistry::new(engine);

    let doc = registry
        .render(&RoutePath::new("/about"), locals(json!({"title": "Hi"})))
        .await
        .unwrap();

    assert!(doc.contains("h1{color:red}"));
    assert!(!doc.contains(".a{}"));
    assert!(doc.contains("window.__PAGEWRIGHT_PROPS__ = `{"));
}

#[tokio::test]
async fn test_live_reload_script_injected_once() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let channel = crate::reload::LiveReloadChannel::start(0).unwrap();
    let port = channel.port();
    let engine = fx
        .builder(false, true)
        .live_reload(Arc::clone(&channel))
        .build();
    let registry = PageRegistry::new(engine);

    for _ in 0..2 {
        let doc = registry
            .render(&RoutePath::new("/about"), Map::new())
            .await
            .unwrap();
        assert_eq!(doc.matches("new WebSocket").count(), 1);
        assert!(doc.contains(&format!("const port = {port};")));
    }
    assert_eq!(fx.loader.seen()["liveReloadPort"], json!(port));

    channel.shutdown();
}

// =============================================================================
// Build and init
// =============================================================================

#[tokio::test]
async fn test_missing_artifact_builds_with_active_priority() {
    let fx = Fixture::new(FakeInvoker::writing(sample_artifact()));
    let registry = fx.registry();
    let route = RoutePath::new("/about");

    let doc = registry
        .render(&route, locals(json!({"title": "Hi"})))
        .await
        .unwrap();

    assert!(doc.contains("<h1>Hi</h1>"));
    assert_eq!(fx.invoker.calls(), 1);
    assert_eq!(fx.queue.requests(), vec![(route.clone(), Priority::Active)]);
    assert!(fx.artifact_path("about").exists());
    assert_eq!(registry.get(&route).unwrap().lifecycle(), Lifecycle::Ready);
}

#[tokio::test]
async fn test_forced_rebuild() {
    let fx = Fixture::new(FakeInvoker::writing(sample_artifact()));
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();

    registry
        .render(&RoutePath::new("/about"), locals(json!({"rebuild": "1"})))
        .await
        .unwrap();

    assert_eq!(fx.invoker.calls(), 1);
    assert!(fx.queue.requests().is_empty());
    assert_eq!(fx.loader.loads(), 1);
}

#[tokio::test]
async fn test_build_failure_evicts_and_cleans_up() {
    let fx = Fixture::new(FakeInvoker::failing());
    let registry = fx.registry();
    let route = RoutePath::new("/about");

    let page = registry.page(&route);
    let err = registry.render(&route, Map::new()).await.unwrap_err();

    assert!(matches!(err, PageError::Build { .. }), "{err}");
    assert!(err.to_string().contains("exited with status 1"));
    assert!(!fx.artifact_path("about").exists());
    assert_eq!(page.lifecycle(), Lifecycle::Unbuilt);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_corrupt_artifact_is_deleted() {
    let fx = Fixture::new(FakeInvoker::failing());
    let path = fx.artifact_path("about");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();
    let registry = fx.registry();

    let err = registry
        .render(&RoutePath::new("/about"), Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PageError::Corrupt { .. }), "{err}");
    assert!(!path.exists());
    assert!(registry.is_empty());
    assert_eq!(fx.invoker.calls(), 0);
}

#[tokio::test]
async fn test_vanished_artifact_requests_build() {
    let fx = Fixture::new(FakeInvoker::writing(sample_artifact()));
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();
    let route = RoutePath::new("/about");
    let page = registry.page(&route);

    page.init(Priority::Idle).await.unwrap();
    assert!(fx.queue.requests().is_empty());

    std::fs::remove_file(fx.artifact_path("about")).unwrap();
    page.init(Priority::Active).await.unwrap();

    assert_eq!(fx.queue.requests(), vec![(route, Priority::Active)]);
    assert_eq!(fx.invoker.calls(), 1);
    assert_eq!(page.lifecycle(), Lifecycle::Ready);
}

#[tokio::test]
async fn test_cancelled_build_request_leaves_page_unbuilt() {
    let fx = Fixture::new(FakeInvoker::writing(sample_artifact()));
    let scheduler = crate::compiler::BuildScheduler::start(1);
    scheduler.shutdown();
    let engine = Engine::builder(fx.config(false, false), scheduler)
        .invoker(fx.invoker.clone())
        .loader(fx.loader.clone())
        .build();
    let registry = PageRegistry::new(engine);
    let page = registry.page(&RoutePath::new("/about"));

    let err = page.init(Priority::Active).await.unwrap_err();

    assert!(matches!(err, PageError::Cancelled(_)), "{err}");
    assert_eq!(page.lifecycle(), Lifecycle::Unbuilt);
    assert_eq!(fx.invoker.calls(), 0);
}

#[tokio::test]
async fn test_render_failure_starts_over() {
    let fx = Fixture::with_loader(FakeInvoker::failing(), EchoLoader::failing_first(1));
    fx.write_artifact("about", &sample_artifact()).await;
    let registry = fx.registry();
    let route = RoutePath::new("/about");

    let first_page = registry.page(&route);
    let err = registry.render(&route, Map::new()).await.unwrap_err();
    assert!(matches!(err, PageError::Render { .. }), "{err}");
    assert!(registry.get(&route).is_none());

    let doc = registry
        .render(&route, locals(json!({"title": "Again"})))
        .await
        .unwrap();
    assert!(doc.contains("<h1>Again</h1>"));

    let second_page = registry.get(&route).unwrap();
    assert!(!Arc::ptr_eq(&first_page, &second_page));
    assert_eq!(fx.loader.loads(), 2);
}

// =============================================================================
// Staleness and activity
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_idle_change_is_debounced() {
    let fx = Fixture::new(FakeInvoker::failing());
    let registry = fx.registry();
    let route = RoutePath::new("/about");
    let page = registry.page(&route);

    page.on_source_change();
    assert_eq!(page.lifecycle(), Lifecycle::Stale);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fx.queue.submits().is_empty());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(fx.queue.submits(), vec![(route, Priority::Idle)]);
    assert_eq!(page.lifecycle(), Lifecycle::Building);
}

#[tokio::test(start_paused = true)]
async fn test_active_change_is_immediate() {
    let fx = Fixture::new(FakeInvoker::failing());
    let registry = fx.registry();
    let route = RoutePath::new("/about");
    let page = registry.page(&route);

    page.heartbeat();
    page.on_source_change();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(fx.queue.submits(), vec![(route, Priority::Active)]);
}

#[tokio::test(start_paused = true)]
async fn test_embedded_change_skips_debounce() {
    let fx = Fixture::new(FakeInvoker::failing());
    let engine = fx
        .builder(true, true)
        .desktop_shell(Arc::new(FakeShell(vec![])))
        .build();
    let registry = PageRegistry::new(engine);
    let route = RoutePath::new("/about");
    let page = registry.page(&route);

    page.on_source_change();
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(fx.queue.submits(), vec![(route, Priority::Idle)]);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeats_drive_activity() {
    let fx = Fixture::new(FakeInvoker::failing());
    let (tx, _rx) = broadcast::channel(16);
    let engine = fx.builder(false, true).heartbeats(tx.clone()).build();
    let registry = PageRegistry::new(engine);
    let about = registry.page(&RoutePath::new("/about"));
    let blog = registry.page(&RoutePath::new("/blog"));

    tx.send(RoutePath::new("/about")).unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(about.is_active());
    assert!(!blog.is_active());

    tokio::time::sleep(crate::reload::IDLE_WINDOW + Duration::from_secs(1)).await;
    assert!(!about.is_active());
    assert!(!about.activity().has_timer());
}

#[tokio::test]
async fn test_desktop_shell_reload_after_init() {
    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let about = Arc::new(FakeWindow {
        url: "http://localhost:5290/about".into(),
        reloads: AtomicUsize::new(0),
    });
    let other = Arc::new(FakeWindow {
        url: "http://localhost:5290/blog".into(),
        reloads: AtomicUsize::new(0),
    });
    let engine = fx
        .builder(true, true)
        .desktop_shell(Arc::new(FakeShell(vec![
            Arc::clone(&about),
            Arc::clone(&other),
        ])))
        .build();
    let registry = PageRegistry::new(engine);

    let doc = registry
        .render(&RoutePath::new("/about"), Map::new())
        .await
        .unwrap();

    assert_eq!(about.reloads.load(Ordering::SeqCst), 1);
    assert_eq!(other.reloads.load(Ordering::SeqCst), 0);
    // Windows reload through the shell, not the socket client
    assert!(!doc.contains("WebSocket"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_socket_reload_after_init() {
    use tungstenite::{Message, stream::MaybeTlsStream};

    let fx = Fixture::new(FakeInvoker::failing());
    fx.write_artifact("about", &sample_artifact()).await;
    let channel = crate::reload::LiveReloadChannel::start(0).unwrap();
    let engine = fx
        .builder(true, true)
        .live_reload(Arc::clone(&channel))
        .build();
    let registry = PageRegistry::new(engine);

    let url = format!("ws://127.0.0.1:{}", channel.port());
    let (mut client, _) = tungstenite::connect(url).unwrap();
    if let MaybeTlsStream::Plain(stream) = client.get_ref() {
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    }
    assert!(wait_until(|| channel.client_count() == 1).await);

    let doc = registry
        .render(&RoutePath::new("/about"), Map::new())
        .await
        .unwrap();
    assert!(doc.contains("new WebSocket"));

    match client.read().unwrap() {
        Message::Text(text) => assert_eq!(text.as_str(), "/about"),
        other => panic!("unexpected message: {other:?}"),
    }

    channel.shutdown();
}

#[tokio::test]
async fn test_watched_change_requests_rebuild() {
    let fx = Fixture::new(FakeInvoker::failing());
    let source = fx.dir.path().join("src/about.tsx");
    std::fs::create_dir_all(source.parent().unwrap()).unwrap();
    std::fs::write(&source, "export default 1").unwrap();

    let mut artifact = sample_artifact();
    artifact.client.watch_files = vec![PathBuf::from("src/about.tsx")];
    fx.write_artifact("about", &artifact).await;

    let registry = PageRegistry::new(fx.builder(true, false).build());
    let route = RoutePath::new("/about");
    registry.render(&route, Map::new()).await.unwrap();
    let page = registry.get(&route).unwrap();
    assert_eq!(page.watched_files(), 1);

    write_later(&source).await;
    assert!(wait_until(|| !fx.queue.submits().is_empty()).await);
    assert_eq!(fx.queue.submits()[0], (route, Priority::Idle));
}

#[tokio::test]
async fn test_eviction_closes_watcher() {
    let fx = Fixture::with_loader(FakeInvoker::failing(), EchoLoader::failing_first(1));
    let source = fx.dir.path().join("about.tsx");
    std::fs::write(&source, "v1").unwrap();
    let mut artifact = sample_artifact();
    artifact.client.watch_files = vec![source.clone()];
    fx.write_artifact("about", &artifact).await;

    let registry = PageRegistry::new(fx.builder(true, false).build());
    let route = RoutePath::new("/about");
    let page = registry.page(&route);

    registry.render(&route, Map::new()).await.unwrap_err();
    assert_eq!(page.watched_files(), 0);

    write_later(&source).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(fx.queue.submits().is_empty());
}

async fn write_later(path: &Path) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(path, format!("changed {:?}", std::time::SystemTime::now())).unwrap();
}
