//! Ready-made mount components for Mica trees.
//!
//! Widgets in this crate own no platform handles. Each one renders into
//! an abstract view surface supplied by the host through a factory prop,
//! so the same component runs against a real toolkit view in production
//! and against an in-memory fake in tests.

mod text_input;
mod text_view;

pub use text_input::{
    dispatch_text_changed, TextChangedEvent, TextInput, TextInputBuilder, TextInputState,
    TextMetricsRequest, ATTR_TEXT, ATTR_TEXT_SIZE, REQUEST_FOCUS_TRIGGER, TEXT_CHANGED_HANDLER,
};
pub use text_view::{TextViewContent, TextViewFactory, TextViewOps};
