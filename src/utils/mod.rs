//! Shared helpers with no engine state.
//!
//! - [`exec`]: async subprocess builder used by the build step and SSR modules
//! - [`hash`]: short content hashes for cache-busting asset URLs
//! - [`html`]: escaping for error pages and inline props
//! - [`path`]: filesystem path normalization and page source discovery

pub mod exec;
pub mod hash;
pub mod html;
pub mod path;
