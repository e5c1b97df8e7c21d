//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Document shell, live-reload client and SSR harness
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{LIVERELOAD_JS, LiveReloadVars};
//!
//! let script = LIVERELOAD_JS.render(&LiveReloadVars { port: 35730 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use std::borrow::Cow;

    use super::{Template, TemplateVars};

    /// Variables for livereload.js.
    pub struct LiveReloadVars {
        pub port: u16,
    }

    impl TemplateVars for LiveReloadVars {
        fn pairs(&self) -> Vec<(&'static str, Cow<'_, str>)> {
            vec![("__PAGEWRIGHT_WS_PORT__", Cow::Owned(self.port.to_string()))]
        }
    }

    /// Live-reload client, inlined into the document head.
    pub const LIVERELOAD_JS: Template<LiveReloadVars> =
        Template::new(include_str!("serve/livereload.js"));

    /// Variables for document.html.
    pub struct DocumentVars<'a> {
        pub head: &'a str,
        pub html: &'a str,
        pub css: &'a str,
        pub css_href: &'a str,
        pub js_src: &'a str,
        pub name: &'a str,
        pub props: &'a str,
    }

    impl TemplateVars for DocumentVars<'_> {
        fn pairs(&self) -> Vec<(&'static str, Cow<'_, str>)> {
            vec![
                ("__HEAD__", Cow::Borrowed(self.head)),
                ("__HTML__", Cow::Borrowed(self.html)),
                ("__CSS__", Cow::Borrowed(self.css)),
                ("__CSS_HREF__", Cow::Borrowed(self.css_href)),
                ("__JS_SRC__", Cow::Borrowed(self.js_src)),
                ("__NAME__", Cow::Borrowed(self.name)),
                ("__PROPS__", Cow::Borrowed(self.props)),
            ]
        }
    }

    /// Default document shell.
    pub const DOCUMENT_HTML: Template<DocumentVars<'static>> =
        Template::new(include_str!("serve/document.html"));

    /// Node harness executing one SSR module: `node ssr.mjs <module.mjs>`.
    pub const SSR_HARNESS: &str = include_str!("serve/ssr.mjs");
}
