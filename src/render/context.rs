//! Render context.
//!
//! Created once per render call. Caller locals are merged under the
//! engine's own fields, so a local named like an engine field never wins.
//!
//! Templating code that cannot take the context as a parameter reads it
//! through [`current`], which is only set while a render is in progress on
//! the current task.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde_json::{Map, Value};

/// Hook invoked with the context right before SSR.
pub type PreRenderHook = Arc<dyn Fn(&RenderContext) + Send + Sync>;

tokio::task_local! {
    static CURRENT: Arc<RenderContext>;
}

#[derive(Debug)]
pub struct RenderContext {
    locals: Map<String, Value>,
    /// One-shot: set by the first `claim_head` of this render
    head_emitted: AtomicBool,
}

impl RenderContext {
    /// Merge `engine` fields over caller `locals`.
    pub fn new(engine: Map<String, Value>, locals: Map<String, Value>) -> Self {
        let mut merged = locals;
        for (key, value) in engine {
            merged.insert(key, value);
        }
        Self {
            locals: merged,
            head_emitted: AtomicBool::new(false),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.locals.get(key)
    }

    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    /// Serialized context, as handed to SSR modules and exposed as props.
    pub fn to_json(&self) -> String {
        Value::Object(self.locals.clone()).to_string()
    }

    /// Claim the head slot. Returns `true` exactly once per render.
    pub fn claim_head(&self) -> bool {
        !self.head_emitted.swap(true, Ordering::SeqCst)
    }

    pub fn head_emitted(&self) -> bool {
        self.head_emitted.load(Ordering::SeqCst)
    }

    /// Run `fut` with `context` installed as the task's current render.
    pub async fn scope<F: Future>(context: Arc<Self>, fut: F) -> F::Output {
        CURRENT.scope(context, fut).await
    }
}

/// The render in progress on this task, if any.
pub fn current() -> Option<Arc<RenderContext>> {
    CURRENT.try_with(Arc::clone).ok()
}
