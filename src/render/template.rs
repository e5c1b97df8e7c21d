//! Final document assembly.

use anyhow::Result;

use crate::embed::serve::{DOCUMENT_HTML, DocumentVars};

/// Everything a template needs to produce one document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentParts<'a> {
    pub head: &'a str,
    pub html: &'a str,
    pub css: &'a str,
    /// Client bundle code
    pub js: &'a str,
    pub js_path: &'a str,
    pub css_path: &'a str,
    pub js_hash: &'a str,
    pub css_hash: &'a str,
    pub name: &'a str,
    /// Serialized render context, ready to inline as a script expression
    pub props: &'a str,
}

/// Turns rendered parts into a complete document.
pub trait DocumentTemplate: Send + Sync {
    fn assemble(&self, parts: &DocumentParts<'_>) -> Result<String>;
}

/// The embedded HTML shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellTemplate;

impl DocumentTemplate for ShellTemplate {
    fn assemble(&self, parts: &DocumentParts<'_>) -> Result<String> {
        let css_href = versioned(parts.css_path, parts.css_hash);
        let js_src = versioned(parts.js_path, parts.js_hash);

        Ok(DOCUMENT_HTML.render(&DocumentVars {
            head: parts.head,
            html: parts.html,
            css: parts.css,
            css_href: &css_href,
            js_src: &js_src,
            name: parts.name,
            props: parts.props,
        }))
    }
}

/// `path?v=hash`, or the bare path without a hash.
fn versioned(path: &str, hash: &str) -> String {
    if hash.is_empty() {
        path.to_string()
    } else {
        format!("{path}?v={hash}")
    }
}
