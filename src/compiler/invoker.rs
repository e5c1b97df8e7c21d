//! External build step invocation.
//!
//! The build command receives one JSON argument:
//!
//! ```json
//! {"name": "blog_post", "path": "/blog/post", "buildPath": "/abs/.pagewright/blog_post.json", "config": {}}
//! ```
//!
//! and must write the artifact to `buildPath`, or exit non-zero.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::{
    config::EngineConfig,
    core::RoutePath,
    debug,
    utils::exec::{Cmd, NODE_FILTER},
};

/// Payload handed to the build step.
#[derive(Debug, Clone, Serialize)]
pub struct BuildRequest {
    pub name: String,
    pub path: RoutePath,
    #[serde(rename = "buildPath")]
    pub build_path: PathBuf,
    pub config: serde_json::Value,
}

/// Runs the build step for one page.
#[async_trait]
pub trait BuildInvoker: Send + Sync {
    /// Build one page. Success means the artifact has been written.
    async fn invoke(&self, request: &BuildRequest) -> Result<()>;
}

/// Invoker spawning `build.command` with the request as its last argument.
#[derive(Debug, Clone)]
pub struct ScriptInvoker {
    command: Vec<String>,
    root: PathBuf,
}

impl ScriptInvoker {
    pub fn new(command: Vec<String>, root: PathBuf) -> Self {
        Self { command, root }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.build.command.clone(), config.root.clone())
    }
}

#[async_trait]
impl BuildInvoker for ScriptInvoker {
    async fn invoke(&self, request: &BuildRequest) -> Result<()> {
        let payload = serde_json::to_string(request).context("Failed to encode build request")?;

        let cmd = Cmd::from_slice(&self.command)
            .arg(payload)
            .cwd(&self.root)
            .filter(&NODE_FILTER);
        cmd.ensure_available()?;

        debug!("build"; "{} -> {}", request.path, request.build_path.display());
        let output = cmd.run().await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("build"; "{}", stdout.trim());
        }
        Ok(())
    }
}
