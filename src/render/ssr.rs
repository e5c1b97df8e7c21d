//! Server-side rendering modules.
//!
//! A server component is loaded once per `init` into a [`Renderable`].
//! The shape of the loaded code (default export, `render` method, bare
//! function) is resolved at load time, never per render.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::RenderContext;
use crate::{
    config::EngineConfig,
    embed::serve::SSR_HARNESS,
    utils::exec::{Cmd, NODE_FILTER},
};

/// Output of one SSR call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub html: String,
    /// CSS of the components rendered by this call only
    #[serde(default)]
    pub css: Option<String>,
}

/// A loaded server component.
#[async_trait]
pub trait Renderable: Send + Sync {
    async fn render(&self, context: &RenderContext) -> Result<Rendered>;
}

/// Turns server component code into a [`Renderable`].
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load `code` for the page `name`, replacing any earlier module of that page.
    async fn load(&self, name: &str, code: &str) -> Result<Arc<dyn Renderable>>;
}

/// Loader writing modules to `<build.dir>/ssr/` and rendering them with
/// `render.ssr_command` through the embedded harness.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    command: Vec<String>,
    dir: PathBuf,
    root: PathBuf,
}

impl ScriptLoader {
    pub fn new(command: Vec<String>, dir: PathBuf, root: PathBuf) -> Self {
        Self { command, dir, root }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.render.ssr_command.clone(),
            config.build.dir.join("ssr"),
            config.root.clone(),
        )
    }

    fn harness_path(&self) -> PathBuf {
        self.dir.join("_harness.mjs")
    }
}

#[async_trait]
impl ModuleLoader for ScriptLoader {
    async fn load(&self, name: &str, code: &str) -> Result<Arc<dyn Renderable>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let harness = self.harness_path();
        write_if_changed(&harness, SSR_HARNESS).await?;

        let module = self.dir.join(format!("{name}.mjs"));
        tokio::fs::write(&module, code)
            .await
            .with_context(|| format!("Failed to write {}", module.display()))?;

        Ok(Arc::new(ScriptModule {
            command: self.command.clone(),
            harness,
            module,
            root: self.root.clone(),
        }))
    }
}

/// Server component rendered by spawning the SSR runtime.
#[derive(Debug)]
pub struct ScriptModule {
    command: Vec<String>,
    harness: PathBuf,
    module: PathBuf,
    root: PathBuf,
}

#[async_trait]
impl Renderable for ScriptModule {
    async fn render(&self, context: &RenderContext) -> Result<Rendered> {
        let output = Cmd::from_slice(&self.command)
            .arg(&self.harness)
            .arg(&self.module)
            .stdin(context.to_json())
            .cwd(&self.root)
            .filter(&NODE_FILTER)
            .run()
            .await?;

        serde_json::from_slice(&output.stdout).with_context(|| {
            format!(
                "SSR module {} printed invalid output",
                self.module.display()
            )
        })
    }
}

async fn write_if_changed(path: &Path, content: &str) -> Result<()> {
    if let Ok(existing) = tokio::fs::read_to_string(path).await
        && existing == content
    {
        return Ok(());
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tempfile::TempDir;

    #[test]
    fn test_rendered_defaults() {
        let rendered: Rendered = serde_json::from_str(r#"{"html": "<p>x</p>"}"#).unwrap();
        assert_eq!(rendered.html, "<p>x</p>");
        assert_eq!(rendered.head, "");
        assert!(rendered.css.is_none());
    }

    #[tokio::test]
    async fn test_load_writes_module_and_harness() {
        let dir = TempDir::new().unwrap();
        let loader = ScriptLoader::new(
            vec!["node".into()],
            dir.path().join("ssr"),
            dir.path().to_path_buf(),
        );

        loader.load("blog_post", "export default {}").await.unwrap();
        loader.load("blog_post", "export default 1").await.unwrap();

        let module = std::fs::read_to_string(dir.path().join("ssr/blog_post.mjs")).unwrap();
        assert_eq!(module, "export default 1");
        let harness = std::fs::read_to_string(dir.path().join("ssr/_harness.mjs")).unwrap();
        assert_eq!(harness, SSR_HARNESS);
    }

    #[tokio::test]
    async fn test_script_module_pipes_context() {
        let dir = TempDir::new().unwrap();
        // `sh -c <script> <harness> <module>`: echo stdin back inside the html field
        let script = r#"printf '{"head":"<title>t</title>","html":"%s"}' "$(cat | tr -d '"')""#;
        let loader = ScriptLoader::new(
            vec!["sh".into(), "-c".into(), script.into()],
            dir.path().join("ssr"),
            dir.path().to_path_buf(),
        );

        let module = loader.load("index", "").await.unwrap();
        let mut locals = Map::new();
        locals.insert("title".into(), "Hi".into());
        let rendered = module
            .render(&RenderContext::new(Map::new(), locals))
            .await
            .unwrap();

        assert_eq!(rendered.head, "<title>t</title>");
        assert_eq!(rendered.html, "{title:Hi}");
    }
}
