//! Configuration section definitions.
//!
//! | Section    | Purpose                                         |
//! |------------|-------------------------------------------------|
//! | `[build]`  | Build script, artifact dir, page sources        |
//! | `[serve]`  | Development server, watch mode, live reload     |
//! | `[render]` | SSR runtime, CSS source, props, locals filter   |

mod build;
mod render;
mod serve;

pub use build::BuildConfig;
pub use render::RenderConfig;
pub use serve::ServeConfig;
