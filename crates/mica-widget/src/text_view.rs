//! Host-side text view abstraction.

use std::any::Any;
use std::rc::Rc;

use mica_core::EventHandler;

/// Operations a mounted text surface must support.
///
/// Hosts implement this for their real toolkit view; tests implement it
/// with a plain struct that records calls.
pub trait TextViewOps: Any {
    fn set_text(&mut self, text: &str);
    fn text(&self) -> String;
    fn set_hint(&mut self, hint: &str);
    fn set_text_size_px(&mut self, px: i32);
    fn set_editable(&mut self, editable: bool);
    /// Installs or removes the change listener. The view is expected to
    /// call [`EventHandler::dispatch`] with a [`crate::TextChangedEvent`]
    /// whenever its text changes.
    fn set_text_changed_listener(&mut self, listener: Option<EventHandler>);
    fn request_focus(&mut self) -> bool;
    fn clear_focus(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creates fresh view surfaces for the mount-content pool.
pub trait TextViewFactory {
    fn create(&self) -> Box<dyn TextViewOps>;
}

impl<F> TextViewFactory for F
where
    F: Fn() -> Box<dyn TextViewOps>,
{
    fn create(&self) -> Box<dyn TextViewOps> {
        (self)()
    }
}

/// Concrete mount content wrapping a host view.
///
/// Mount content travels through the pool as `Box<dyn Any>`, so widgets
/// need one concrete type to downcast back to.
pub struct TextViewContent {
    pub view: Box<dyn TextViewOps>,
}

impl TextViewContent {
    pub fn new(factory: &Rc<dyn TextViewFactory>) -> Self {
        Self {
            view: factory.create(),
        }
    }
}
