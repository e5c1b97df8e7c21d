//! `[render]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [render]
//! ssr_command = ["node"]            # Runtime executing SSR modules
//! dev_css = false                   # CSS from the render call instead of the artifact
//! props_template_literal = false    # Emit props as a JS template literal
//! exclude_locals = ["settings", "_locals", "cache"]
//! asset_prefix = "/_pages"          # URL prefix of client bundles
//! ```

use serde::{Deserialize, Serialize};

/// Render pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Runtime used to execute server components (program + leading arguments).
    pub ssr_command: Vec<String>,

    /// Development mode: take CSS from each render result.
    ///
    /// The artifact CSS covers every component the page ever imports,
    /// the per-render CSS only what was rendered this time.
    pub dev_css: bool,

    /// Wrap serialized props as a template-string literal.
    pub props_template_literal: bool,

    /// Caller locals dropped before rendering.
    pub exclude_locals: Vec<String>,

    /// URL prefix of client JS/CSS assets.
    pub asset_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ssr_command: vec!["node".into()],
            dev_css: false,
            props_template_literal: false,
            exclude_locals: ["settings", "_locals", "cache"]
                .into_iter()
                .map(String::from)
                .collect(),
            asset_prefix: "/_pages".into(),
        }
    }
}

impl RenderConfig {
    /// Asset prefix without trailing slash.
    pub fn asset_prefix(&self) -> &str {
        self.asset_prefix.trim_end_matches('/')
    }

    pub(in crate::config) fn validate(&self, errors: &mut Vec<String>) {
        if self.ssr_command.is_empty() || self.ssr_command[0].trim().is_empty() {
            errors.push("[render.ssr_command] must name a program".into());
        }
        if !self.asset_prefix.starts_with('/') {
            errors.push(format!(
                "[render.asset_prefix] must start with `/`, got `{}`",
                self.asset_prefix
            ));
        }
    }
}
