//! Page failure taxonomy.

use std::{io, path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::core::RoutePath;

/// Errors surfaced by page build, load and render.
///
/// `Clone` so one build outcome can be delivered to every waiter.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// The external build step failed or produced no artifact.
    #[error("build failed for `{route}`: {message}")]
    Build { route: RoutePath, message: String },

    /// The persisted artifact could not be parsed. The file has been deleted.
    #[error("corrupt artifact `{}`: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    /// SSR module or template assembly failed during render.
    #[error("render failed for `{route}`: {message}")]
    Render { route: RoutePath, message: String },

    /// The server component could not be loaded into an SSR module.
    #[error("cannot load SSR module for `{route}`: {message}")]
    Module { route: RoutePath, message: String },

    #[error("cannot watch dependencies of `{route}`: {message}")]
    Watch { route: RoutePath, message: String },

    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The scheduler dropped the request before the build ran.
    #[error("build request for `{0}` was cancelled")]
    Cancelled(RoutePath),
}

impl PageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn build(route: &RoutePath, err: impl std::fmt::Display) -> Self {
        Self::Build {
            route: route.clone(),
            message: format!("{err:#}"),
        }
    }

    pub fn render(route: &RoutePath, err: impl std::fmt::Display) -> Self {
        Self::Render {
            route: route.clone(),
            message: format!("{err:#}"),
        }
    }

    pub fn module(route: &RoutePath, err: impl std::fmt::Display) -> Self {
        Self::Module {
            route: route.clone(),
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_keeps_anyhow_chain() {
        let err = anyhow::anyhow!("exit status 1").context("Command `node` failed");
        let page_err = PageError::build(&RoutePath::new("/about"), err);
        let msg = page_err.to_string();
        assert!(msg.contains("/about"));
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn test_io_error_is_clone() {
        let err = PageError::io("/tmp/x.json", io::Error::other("disk"));
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
