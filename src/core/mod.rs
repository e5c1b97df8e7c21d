//! Core types - pure abstractions shared across the codebase.

mod priority;
mod route;
mod state;

pub use priority::Priority;
pub use route::RoutePath;
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
