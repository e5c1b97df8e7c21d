//! Persisted build artifacts.
//!
//! The build step writes one JSON file per page:
//!
//! ```json
//! {
//!   "client": { "code": "...", "watchFiles": ["/abs/src/page.tsx"] },
//!   "server": { "code": "...", "css": { "code": ".a{}" } },
//!   "hashes": { "js": "h1", "css": "h2" }
//! }
//! ```
//!
//! `server` may be `null` for client-only pages.

mod store;

pub use store::ArtifactStore;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Full artifact as written by the build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub client: ClientComponent,
    #[serde(default)]
    pub server: Option<ServerComponent>,
    #[serde(default)]
    pub hashes: ContentHashes,
}

/// Browser bundle plus the source files it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientComponent {
    pub code: String,
    #[serde(rename = "watchFiles", default)]
    pub watch_files: Vec<PathBuf>,
}

/// Server-renderable module code and the CSS of every component it imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerComponent {
    pub code: String,
    #[serde(default)]
    pub css: CssPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssPayload {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHashes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

impl BuildArtifact {
    /// Server CSS, empty for client-only pages.
    pub fn server_css(&self) -> &str {
        self.server.as_ref().map_or("", |s| s.css.code.as_str())
    }
}
