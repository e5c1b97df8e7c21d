//! Render pipeline of a page.
//!
//! ```text
//! locals ─▶ (forced build) ─▶ init if not ready ─▶ RenderContext
//!        ─▶ pre-render hook ─▶ SSR module ─▶ email: html
//!                                          └▶ document template
//! ```

use std::{borrow::Cow, sync::Arc};

use serde_json::{Map, Value};

use super::{Page, PageError, state::Loaded};
use crate::{
    core::Priority,
    embed::serve::{LIVERELOAD_JS, LiveReloadVars},
    render::{DocumentParts, RenderContext, Rendered},
    utils::html::{script_safe, template_literal},
};

/// Local requesting a full build before rendering.
pub const REBUILD_LOCAL: &str = "rebuild";

impl Page {
    /// Render the page with caller `locals`.
    ///
    /// `for_email` returns the bare SSR html: no document shell, no scripts.
    pub async fn render(
        &self,
        locals: Map<String, Value>,
        for_email: bool,
    ) -> Result<String, PageError> {
        if wants_rebuild(&locals) {
            self.build().await?;
        }
        if !self.is_ready() {
            self.init(Priority::Active).await?;
        }

        let loaded = self
            .state
            .read()
            .loaded()
            .ok_or_else(|| PageError::build(&self.route, "page has no loaded artifact"))?;

        let context = Arc::new(RenderContext::new(self.engine_fields(), locals));
        RenderContext::scope(
            Arc::clone(&context),
            self.render_loaded(&context, &loaded, for_email),
        )
        .await
    }

    async fn render_loaded(
        &self,
        context: &RenderContext,
        loaded: &Loaded,
        for_email: bool,
    ) -> Result<String, PageError> {
        if let Some(hook) = self.engine.pre_render() {
            hook(context);
        }

        let rendered = match &loaded.module {
            Some(module) => module
                .render(context)
                .await
                .map_err(|e| PageError::render(&self.route, e))?,
            None => Rendered::default(),
        };

        if for_email {
            return Ok(rendered.html);
        }

        let config = &self.engine.config().render;
        let css = if config.dev_css {
            rendered.css.as_deref().unwrap_or_default()
        } else {
            loaded.server_css()
        };

        let mut head = rendered.head;
        if let Some(port) = self.engine.live_reload_port()
            && context.claim_head()
        {
            head.push_str("<script>");
            head.push_str(&LIVERELOAD_JS.render(&LiveReloadVars { port }));
            head.push_str("</script>");
        }

        let json = context.to_json();
        let props = match script_safe(&json) {
            safe if config.props_template_literal => Cow::Owned(template_literal(&safe)),
            safe => safe,
        };

        self.engine
            .template()
            .assemble(&DocumentParts {
                head: &head,
                html: &rendered.html,
                css,
                js: &loaded.client.code,
                js_path: &self.js_path,
                css_path: &self.css_path,
                js_hash: &loaded.hashes.js,
                css_hash: &loaded.hashes.css,
                name: &self.name,
                props: &props,
            })
            .map_err(|e| PageError::render(&self.route, e))
    }

    /// Fields the engine sets on every context; caller locals never override them.
    fn engine_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("path".into(), self.route.as_str().into());
        fields.insert("name".into(), self.name.clone().into());
        fields.insert("jsPath".into(), self.js_path.clone().into());
        fields.insert("cssPath".into(), self.css_path.clone().into());
        if let Some(port) = self.engine.live_reload_port() {
            fields.insert("liveReloadPort".into(), port.into());
        }
        fields
    }
}

/// `rebuild` set to `true`, `1`, `"1"` or `"true"`.
fn wants_rebuild(locals: &Map<String, Value>) -> bool {
    match locals.get(REBUILD_LOCAL) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    }
}
