//! Page compilation: the external build step and its scheduler.
//!
//! - [`invoker`]: runs the build command for one page
//! - [`scheduler`]: priority queue guaranteeing one build per page at a time

pub mod invoker;
pub mod scheduler;

pub use invoker::{BuildInvoker, BuildRequest, ScriptInvoker};
pub use scheduler::{BuildQueue, BuildScheduler, BuildTarget};
