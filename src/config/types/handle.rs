//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from request handlers and worker tasks.

use crate::config::EngineConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<EngineConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(EngineConfig::default()));

#[inline]
pub fn cfg() -> Arc<EngineConfig> {
    CONFIG.load_full()
}

/// Install the loaded config as the global one.
#[inline]
pub fn init_config(config: EngineConfig) -> Arc<EngineConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
