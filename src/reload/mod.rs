//! Live reload and page activity.
//!
//! - [`activity`]: per-page heartbeat tracking with a 15s idle window
//! - [`server`]: WebSocket channel carrying heartbeats in and reload notices out
//! - [`notifier`]: socket or desktop-window reload delivery

pub mod activity;
pub mod notifier;
pub mod server;

pub use activity::{Activity, IDLE_WINDOW};
pub use notifier::{DesktopShell, ReloadNotifier, ShellWindow};
pub use server::LiveReloadChannel;
