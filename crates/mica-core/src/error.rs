//! Error surface of the lifecycle core.
//!
//! Callback failures and contract violations are propagated to the tree
//! driver, which owns recovery policy. Stale event/trigger dispatch is
//! deliberately *not* represented here: an unknown handler id degrades to a
//! no-op because the originating platform element may already be recycled.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A required prop was never set before `build()`. Raised at the
    /// construction boundary, before the node can reach measure or mount.
    #[error("{component}: missing required prop(s) {missing:?}")]
    MissingRequiredProp {
        component: &'static str,
        missing: Vec<&'static str>,
    },

    /// A lifecycle phase ran out of the fixed order (e.g. bounds-defined
    /// before measure).
    #[error("phase {attempted} attempted while in {current}")]
    PhaseOutOfOrder {
        attempted: &'static str,
        current: &'static str,
    },

    /// Second write into an output slot that already holds a value. The
    /// first value wins; callers that need a fresh slot must release and
    /// re-acquire.
    #[error("output slot already written")]
    SlotAlreadyWritten,

    /// Two distinct handlers registered the same dispatch id for one
    /// component type. Detected eagerly so a collision cannot silently
    /// misroute events.
    #[error("handler id {id} registered by both `{existing}` and `{incoming}`")]
    HandlerIdCollision {
        id: i32,
        existing: &'static str,
        incoming: &'static str,
    },

    /// A component callback failed. Never swallowed by the core; the hosting
    /// application's error channel decides whether to abort the pass.
    #[error("{phase} callback failed: {message}")]
    CallbackFailure {
        phase: &'static str,
        message: String,
    },

    /// A state container or mount content had an unexpected concrete type.
    #[error("expected content of type {expected}")]
    ContentTypeMismatch { expected: &'static str },

    /// A render pass was superseded by a newer one before commit. Its
    /// measure/bounds results must be discarded, never mounted.
    #[error("render pass generation {generation} superseded")]
    SupersededRender { generation: u64 },
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
