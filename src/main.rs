//! pagewright - on-demand page build-and-render engine with live reload.

#![allow(dead_code)]

mod artifact;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod engine;
mod logger;
mod page;
mod reload;
mod render;
mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{EngineConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(EngineConfig::load(&cli)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let result = run(&cli, config, &runtime);

    // In-flight builds are abandoned rather than awaited
    runtime.shutdown_timeout(Duration::from_secs(2));
    result
}

fn run(cli: &Cli, config: Arc<EngineConfig>, runtime: &tokio::runtime::Runtime) -> Result<()> {
    match &cli.command {
        Commands::Serve { .. } => {
            let _guard = runtime.enter();
            cli::serve::serve(config, runtime.handle().clone())
        }
        Commands::Build => runtime.block_on(cli::build::build_pages(config)),
        Commands::Render {
            route,
            locals,
            email,
        } => runtime.block_on(cli::render::render_page(
            config,
            route,
            locals.as_deref(),
            *email,
        )),
    }
}
