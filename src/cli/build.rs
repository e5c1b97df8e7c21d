//! Bulk prebuild.
//!
//! Walks `build.pages`, maps each page source to its route and builds every
//! page through the scheduler at idle priority.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Result, bail};
use jwalk::WalkDir;
use tokio::task::JoinSet;

use super::common::plural_count;
use crate::{
    compiler::{BuildQueue, BuildScheduler, BuildTarget},
    config::EngineConfig,
    core::{Priority, RoutePath, is_shutdown},
    engine::Engine,
    log,
    logger::ProgressLine,
    page::{PageError, PageRegistry},
    utils::path::route_for_source,
};

/// Build every page found under `build.pages`.
pub async fn build_pages(config: Arc<EngineConfig>) -> Result<()> {
    let pages_dir = config.build.pages.clone();
    if !pages_dir.is_dir() {
        bail!("pages directory `{}` does not exist", pages_dir.display());
    }

    let routes = collect_routes(&config);
    if routes.is_empty() {
        log!("build"; "no pages found in {}", pages_dir.display());
        return Ok(());
    }

    let scheduler = BuildScheduler::start(0);
    let engine = Engine::builder(Arc::clone(&config), scheduler.clone()).build();
    let registry = PageRegistry::new(engine);
    let progress = Arc::new(ProgressLine::new("build", routes.len()));

    let total = routes.len();
    let mut builds = JoinSet::new();
    for route in routes {
        let target: Arc<dyn BuildTarget> = registry.page(&route);
        let scheduler = Arc::clone(&scheduler);
        let progress = Arc::clone(&progress);
        builds.spawn(async move {
            let result = scheduler.request(target, Priority::Idle).await;
            progress.inc();
            (route, result)
        });
    }

    let mut failures: Vec<(RoutePath, PageError)> = Vec::new();
    while let Some(joined) = builds.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((route, Err(err))) => failures.push((route, err)),
            Err(err) => log!("error"; "build task failed: {}", err),
        }
        if is_shutdown() {
            builds.abort_all();
            break;
        }
    }
    scheduler.wait_idle().await;
    if let Ok(progress) = Arc::try_unwrap(progress) {
        progress.finish();
    }

    registry.close_all();
    scheduler.shutdown();

    if !failures.is_empty() {
        failures.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, err) in &failures {
            log!("error"; "{}", err);
        }
        bail!(
            "{} of {} failed to build",
            plural_count(failures.len(), "page"),
            total
        );
    }

    log!("build"; "built {}", plural_count(total, "page"));
    Ok(())
}

/// Routes of all page sources, sorted and deduplicated.
fn collect_routes(config: &EngineConfig) -> Vec<RoutePath> {
    let root = &config.build.pages;
    let mut routes: Vec<RoutePath> = collect_sources(root)
        .into_iter()
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| config.build.is_page_extension(e))
        })
        .filter_map(|path| route_for_source(root, &path))
        .collect();
    routes.sort();
    routes.dedup();
    routes
}

fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .skip_hidden(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_routes() {
        let dir = TempDir::new().unwrap();
        let pages = dir.path().join("pages");
        for file in [
            "index.tsx",
            "about.jsx",
            "blog/index.svelte",
            "blog/first-post.tsx",
            "blog/notes.md",
            ".drafts/secret.tsx",
        ] {
            let path = pages.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }

        let mut config = EngineConfig::default();
        config.build.pages = pages;
        let routes: Vec<String> = collect_routes(&config)
            .iter()
            .map(|r| r.to_string())
            .collect();

        assert_eq!(routes, vec!["/", "/about", "/blog", "/blog/first-post"]);
    }
}
