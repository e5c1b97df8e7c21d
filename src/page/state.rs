//! Page lifecycle and cached artifact state.

use std::sync::Arc;

use crate::{
    artifact::{ClientComponent, ServerComponent},
    render::Renderable,
};

/// Where a page is in its build lifecycle.
///
/// ```text
/// Unbuilt ──init──▶ Building ──load ok──▶ Ready ──source change──▶ Stale
///    ▲                  │                                            │
///    └──build failed────┘◀──────────────rebuild requested────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    /// No artifact loaded
    #[default]
    Unbuilt,
    /// A build was requested and has not finished
    Building,
    /// Artifact loaded, SSR module consistent with it
    Ready,
    /// Loaded artifact is outdated: a watched dependency changed
    Stale,
}

impl Lifecycle {
    #[inline]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Unbuilt => "unbuilt",
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Stale => "stale",
        }
    }
}

/// Hashes used to version asset URLs, always present once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedHashes {
    pub js: String,
    pub css: String,
}

/// Mutable part of a page, guarded by one lock that is never held across `.await`.
#[derive(Default)]
pub(super) struct PageState {
    pub lifecycle: Lifecycle,
    pub client: Option<Arc<ClientComponent>>,
    pub server: Option<Arc<ServerComponent>>,
    pub hashes: ResolvedHashes,
    pub module: Option<Arc<dyn Renderable>>,
}

/// What one render needs, cloned out of [`PageState`].
pub(super) struct Loaded {
    pub client: Arc<ClientComponent>,
    pub server: Option<Arc<ServerComponent>>,
    pub hashes: ResolvedHashes,
    pub module: Option<Arc<dyn Renderable>>,
}

impl PageState {
    pub fn loaded(&self) -> Option<Loaded> {
        Some(Loaded {
            client: Arc::clone(self.client.as_ref()?),
            server: self.server.clone(),
            hashes: self.hashes.clone(),
            module: self.module.clone(),
        })
    }
}

impl Loaded {
    pub fn server_css(&self) -> &str {
        self.server.as_ref().map_or("", |s| s.css.code.as_str())
    }
}
