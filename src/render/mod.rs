//! Per-render collaborators.
//!
//! - [`context`]: the render context handed to SSR modules and templates
//! - [`ssr`]: loading server components and invoking them
//! - [`template`]: assembling the final document

pub mod context;
pub mod ssr;
pub mod template;

pub use context::{PreRenderHook, RenderContext, current};
pub use ssr::{ModuleLoader, Renderable, Rendered, ScriptLoader};
pub use template::{DocumentParts, DocumentTemplate, ShellTemplate};
