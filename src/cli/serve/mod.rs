//! Development server with live reload support.
//!
//! `tiny_http` accepts requests on the main thread; each one is handled
//! as a task on the tokio runtime, and the reply is sent from the blocking
//! pool.
//!
//! | Request                      | Reply                              |
//! |------------------------------|------------------------------------|
//! | `<asset_prefix>/<name>.js`   | client bundle of a ready page      |
//! | `<asset_prefix>/<name>.css`  | cached server CSS of a ready page  |
//! | file-like path (`/a.ico`)    | 404                                |
//! | anything else                | rendered page, query → locals      |

mod lifecycle;
mod response;

use std::sync::Arc;

use anyhow::Result;
use tiny_http::{Method, Server};
use tokio::runtime::Handle;

use super::common::{plural_count, query_locals};
use crate::{
    compiler::BuildScheduler,
    config::EngineConfig,
    core::{RoutePath, is_shutdown},
    debug,
    engine::Engine,
    log,
    page::PageRegistry,
    reload::LiveReloadChannel,
};
use response::Reply;

/// Serve pages until Ctrl+C. Must be called inside the runtime of `handle`.
pub fn serve(config: Arc<EngineConfig>, handle: Handle) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    let scheduler = BuildScheduler::start(0);
    let mut engine = Engine::builder(Arc::clone(&config), scheduler.clone());
    let channel = if config.serve.live_reload {
        let channel = LiveReloadChannel::start(config.serve.live_reload_port)?;
        debug!("reload"; "ws://localhost:{}", channel.port());
        engine = engine.live_reload(Arc::clone(&channel));
        Some(channel)
    } else {
        None
    };
    let registry = Arc::new(PageRegistry::new(engine.build()));

    let shutdown_channel = channel.clone();
    let _shutdown_watcher = lifecycle::on_shutdown(shutdown_rx, move || {
        if let Some(channel) = shutdown_channel {
            channel.shutdown();
        }
    });

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, &registry, &handle);

    if !registry.is_empty() {
        debug!("serve"; "closing {}", plural_count(registry.len(), "page"));
    }
    registry.close_all();
    scheduler.shutdown();
    if let Some(channel) = channel {
        channel.shutdown();
    }
    Ok(())
}

fn run_request_loop(server: &Server, registry: &Arc<PageRegistry>, handle: &Handle) {
    for request in server.incoming_requests() {
        let registry = Arc::clone(registry);
        let method = request.method().clone();
        let url = request.url().to_string();
        handle.spawn(async move {
            let reply = handle_request(&registry, &method, &url).await;
            let sent = tokio::task::spawn_blocking(move || response::send(request, reply)).await;
            match sent {
                Ok(Err(e)) => log!("serve"; "request error: {e}"),
                Err(e) => log!("serve"; "request task failed: {e}"),
                Ok(Ok(())) => {}
            }
        });
    }
}

/// Handle a single HTTP request.
async fn handle_request(registry: &PageRegistry, method: &Method, url: &str) -> Reply {
    // Early exit if shutdown requested
    if is_shutdown() {
        return Reply::unavailable();
    }
    if !matches!(method, Method::Get | Method::Head) {
        return Reply::method_not_allowed();
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let prefix = registry.engine().config().render.asset_prefix();
    if let Some(asset) = Asset::parse(prefix, path) {
        return serve_asset(registry, &asset);
    }
    if looks_like_file(path) {
        return Reply::not_found();
    }

    let route = RoutePath::from_browser(url);
    match registry.render(&route, query_locals(url)).await {
        Ok(html) => Reply::html(html),
        Err(err) => {
            log!("error"; "{}", err);
            Reply::render_error(&err)
        }
    }
}

/// Client asset of a page, addressed by display name.
#[derive(Debug, PartialEq, Eq)]
enum Asset<'a> {
    Js(&'a str),
    Css(&'a str),
}

impl<'a> Asset<'a> {
    fn parse(prefix: &str, path: &'a str) -> Option<Self> {
        let file = path.strip_prefix(prefix)?.strip_prefix('/')?;
        if file.contains('/') {
            return None;
        }
        if let Some(name) = file.strip_suffix(".js") {
            Some(Self::Js(name))
        } else {
            file.strip_suffix(".css").map(Self::Css)
        }
    }
}

fn serve_asset(registry: &PageRegistry, asset: &Asset<'_>) -> Reply {
    let (Asset::Js(name) | Asset::Css(name)) = *asset;
    let Some(page) = registry.find_by_name(name) else {
        return Reply::not_found();
    };
    let body = match asset {
        Asset::Js(_) => page.client_code().map(Reply::javascript),
        Asset::Css(_) => page.server_css().map(Reply::css),
    };
    body.unwrap_or_else(Reply::not_found)
}

/// Last segment carries an extension: never a page route.
fn looks_like_file(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|segment| segment.rsplit_once('.').is_some_and(|(stem, _)| !stem.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactStore, BuildArtifact, ClientComponent, ContentHashes};
    use tempfile::TempDir;

    #[test]
    fn test_asset_parse() {
        assert_eq!(Asset::parse("/_pages", "/_pages/about.js"), Some(Asset::Js("about")));
        assert_eq!(Asset::parse("/_pages", "/_pages/blog_post.css"), Some(Asset::Css("blog_post")));
        assert_eq!(Asset::parse("/_pages", "/_pages/a/b.js"), None);
        assert_eq!(Asset::parse("/_pages", "/_pages/about.map"), None);
        assert_eq!(Asset::parse("/_pages", "/about.js"), None);
    }

    #[test]
    fn test_looks_like_file() {
        assert!(looks_like_file("/favicon.ico"));
        assert!(looks_like_file("/img/logo.svg"));
        assert!(!looks_like_file("/blog/post"));
        assert!(!looks_like_file("/"));
        assert!(!looks_like_file("/.well-known"));
    }

    async fn registry_with_widget(dir: &TempDir) -> PageRegistry {
        let mut config = EngineConfig::default();
        config.root = dir.path().to_path_buf();
        config.build.dir = dir.path().join(".pagewright");
        config.serve.watch = false;
        config.serve.live_reload = false;

        // Client-only: rendering needs neither the build script nor an SSR runtime
        ArtifactStore::for_page(&config.build.dir, "widget")
            .write(&BuildArtifact {
                client: ClientComponent {
                    code: "console.log('widget')".into(),
                    watch_files: vec![],
                },
                server: None,
                hashes: ContentHashes::default(),
            })
            .await
            .unwrap();

        let scheduler = BuildScheduler::start(1);
        PageRegistry::new(Engine::builder(Arc::new(config), scheduler).build())
    }

    #[tokio::test]
    async fn test_page_and_assets() {
        let dir = TempDir::new().unwrap();
        let registry = registry_with_widget(&dir).await;

        // Assets of a page that was never rendered are unknown
        let reply = handle_request(&registry, &Method::Get, "/_pages/widget.js").await;
        assert_eq!(reply.status, 404);

        let reply = handle_request(&registry, &Method::Get, "/widget?title=Hi").await;
        assert_eq!(reply.status, 200);
        let body = String::from_utf8(reply.body).unwrap();
        assert!(body.contains(r#"<div id="widget"></div>"#));
        assert!(body.contains(r#""title":"Hi""#));

        let reply = handle_request(&registry, &Method::Get, "/_pages/widget.js").await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, b"console.log('widget')");

        let reply = handle_request(&registry, &Method::Get, "/_pages/widget.css").await;
        assert_eq!(reply.status, 200);
        assert!(reply.body.is_empty());

        let reply = handle_request(&registry, &Method::Post, "/widget").await;
        assert_eq!(reply.status, 405);
    }
}
