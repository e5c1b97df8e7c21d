//! One-shot render of a single page to stdout.

use std::{io::Write, sync::Arc};

use anyhow::{Context, Result};

use super::common::parse_locals;
use crate::{
    compiler::BuildScheduler,
    config::EngineConfig,
    core::RoutePath,
    engine::Engine,
    page::PageRegistry,
};

/// Render `route` with JSON `locals`, building it first if needed.
pub async fn render_page(
    config: Arc<EngineConfig>,
    route: &str,
    locals: Option<&str>,
    email: bool,
) -> Result<()> {
    let locals = parse_locals(locals)?;
    let route = RoutePath::from_browser(route);

    let scheduler = BuildScheduler::start(1);
    let registry = PageRegistry::new(Engine::builder(config, scheduler.clone()).build());

    let result = if email {
        registry.render_email(&route, locals).await
    } else {
        registry.render(&route, locals).await
    };
    registry.close_all();
    scheduler.shutdown();

    let output = result.with_context(|| format!("Failed to render `{route}`"))?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
