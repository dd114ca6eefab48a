//! Directly-addressed (non-bubbling) event delivery.
//!
//! A trigger is resolved by explicit `(key, id)` lookup against the
//! tree-scoped [`EventTriggersContainer`] and invoked synchronously by the
//! caller, independent of tree traversal. A lookup miss is a no-op, not an
//! error: triggers are published at mount time and the addressed component
//! may simply not be mounted yet, or already gone.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::collections::map::HashMap;
use crate::events::DispatchResult;

/// Stable 32-bit id derived from the trigger method's declared name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriggerId(pub i32);

/// A target capable of receiving directly-invoked trigger events.
pub trait TriggerTarget {
    fn accept_trigger_event(
        &mut self,
        trigger: &EventTrigger,
        event: &mut dyn Any,
        params: &[Box<dyn Any>],
    ) -> DispatchResult {
        let _ = (trigger, event, params);
        DispatchResult::Unhandled
    }
}

/// One publishable trigger: a caller-supplied string key, the method id, and
/// (once mounted) the live target.
#[derive(Clone)]
pub struct EventTrigger {
    key: Rc<str>,
    id: TriggerId,
    target: Option<Weak<RefCell<dyn TriggerTarget>>>,
}

impl EventTrigger {
    pub fn new(key: impl Into<Rc<str>>, id: TriggerId) -> Self {
        Self {
            key: key.into(),
            id,
            target: None,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub(crate) fn shared_key(&self) -> Rc<str> {
        Rc::clone(&self.key)
    }

    /// Points the trigger at the instance that will consume it. Called by the
    /// mount path right before the trigger is recorded.
    pub fn set_target(&mut self, target: Weak<RefCell<dyn TriggerTarget>>) {
        self.target = Some(target);
    }

    /// Points the trigger at a concrete `Rc`-held target. The intermediate
    /// binding fixes the weak's unsized type on an already typed value.
    pub fn set_target_from<T: TriggerTarget + 'static>(&mut self, target: &Rc<RefCell<T>>) {
        let target = Rc::downgrade(target);
        let target: Weak<RefCell<dyn TriggerTarget>> = target;
        self.target = Some(target);
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Invokes the trigger against its live target. An unset or dead target
    /// resolves as the no-op sentinel.
    pub fn dispatch_on_trigger(
        &self,
        event: &mut dyn Any,
        params: &[Box<dyn Any>],
    ) -> DispatchResult {
        let live = self.target.as_ref().and_then(Weak::upgrade);
        match live {
            Some(target) => target.borrow_mut().accept_trigger_event(self, event, params),
            None => {
                log::debug!(
                    "trigger {} for key {:?} has no live target",
                    self.id.0,
                    self.key
                );
                DispatchResult::Unhandled
            }
        }
    }
}

/// Tree-wide registry of published triggers, keyed by `(key, id)`.
#[derive(Default)]
pub struct EventTriggersContainer {
    triggers: HashMap<(Rc<str>, i32), EventTrigger>,
}

impl EventTriggersContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a trigger. Re-recording under the same `(key, id)` replaces
    /// the previous entry, which is what a re-mount wants.
    pub fn record_event_trigger(&mut self, trigger: EventTrigger) {
        self.triggers
            .insert((Rc::clone(&trigger.key), trigger.id.0), trigger);
    }

    pub fn get(&self, key: &str, id: TriggerId) -> Option<&EventTrigger> {
        self.triggers.get(&(Rc::from(key), id.0))
    }

    /// Looks up and invokes in one step; an unregistered key is a no-op.
    pub fn invoke(
        &self,
        key: &str,
        id: TriggerId,
        event: &mut dyn Any,
        params: &[Box<dyn Any>],
    ) -> DispatchResult {
        match self.get(key, id) {
            Some(trigger) => trigger.dispatch_on_trigger(event, params),
            None => DispatchResult::Unhandled,
        }
    }

    /// Unpublishes one trigger; called per recorded `(key, id)` when the
    /// owning component unmounts.
    pub fn remove(&mut self, key: &str, id: TriggerId) -> Option<EventTrigger> {
        self.triggers.remove(&(Rc::from(key), id.0))
    }

    /// Drains every published trigger, in no particular order. The mount path
    /// records into a scratch container first so it can learn which keys a
    /// node published, then moves them into the tree-wide registry.
    pub fn drain(&mut self) -> Vec<EventTrigger> {
        self.triggers.drain().map(|(_, trigger)| trigger).collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
