//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5290                 # HTTP port number
//! watch = true                # Rebuild pages when their sources change
//! live_reload = true          # Reload browsers after a rebuild
//! live_reload_port = 35730    # WebSocket port of the live-reload channel
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Attach watchers to each page's declared dependency files.
    pub watch: bool,

    /// Inject the live-reload client and push reload notices.
    pub live_reload: bool,

    /// WebSocket port of the live-reload channel.
    pub live_reload_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5290,
            watch: true,
            live_reload: true,
            live_reload_port: 35730,
        }
    }
}

impl ServeConfig {
    pub(in crate::config) fn validate(&self, errors: &mut Vec<String>) {
        if self.live_reload && self.port == self.live_reload_port {
            errors.push(format!(
                "[serve.live_reload_port] must differ from [serve.port] ({})",
                self.port
            ));
        }
    }
}
