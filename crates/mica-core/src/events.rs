//! Event dispatch by stable numeric handler id.
//!
//! A component type declares its handlers as compile-time [`HandlerId`]
//! constants. An [`EventHandler`] closes over the captured parameters and a
//! weak reference to the dispatch target; dispatch routes back into the
//! target's `dispatch_on_event` match. Unknown ids and dead targets degrade
//! to a no-op sentinel, since the originating platform element may have been
//! recycled after the handler reference was taken.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::collections::map::{Entry, HashMap};
use crate::error::{LifecycleError, Result};

/// Stable 32-bit id derived from a handler's declared name. Distinctness
/// across one component type is a correctness invariant; see
/// [`DispatchTable`] for the registration-time check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(pub i32);

/// Outcome of a dispatch or trigger invocation.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchResult {
    Handled,
    /// The no-op sentinel: unknown id, dead target, or unregistered trigger
    /// key. Never an error.
    Unhandled,
}

/// A target capable of receiving dispatched events.
///
/// The default implementation handles nothing, so component types only spell
/// out the ids they actually declare.
pub trait EventDispatcher {
    fn dispatch_on_event(&mut self, handler: &EventHandler, event: &mut dyn Any) -> DispatchResult {
        let _ = (handler, event);
        DispatchResult::Unhandled
    }
}

/// Closure of captured parameters plus a weak reference to the dispatch
/// target.
///
/// Parameters are immutable once the handler is created. Payload objects are
/// pooled and cleared after dispatch completes, so a handler must not retain
/// the payload past the call.
#[derive(Clone)]
pub struct EventHandler {
    id: HandlerId,
    params: Rc<[Box<dyn Any>]>,
    target: Weak<RefCell<dyn EventDispatcher>>,
}

impl EventHandler {
    pub fn new(
        id: HandlerId,
        params: Vec<Box<dyn Any>>,
        target: Weak<RefCell<dyn EventDispatcher>>,
    ) -> Self {
        Self {
            id,
            params: params.into(),
            target,
        }
    }

    /// Handler targeting a concrete dispatcher held in an `Rc<RefCell<..>>`.
    ///
    /// The intermediate binding fixes the weak's unsized type on an already
    /// typed value; annotating the `downgrade` call itself pins its type
    /// parameter to the trait object and fails to unify with the argument.
    pub fn for_target<D: EventDispatcher + 'static>(
        id: HandlerId,
        params: Vec<Box<dyn Any>>,
        target: &Rc<RefCell<D>>,
    ) -> Self {
        let target = Rc::downgrade(target);
        let target: Weak<RefCell<dyn EventDispatcher>> = target;
        Self::new(id, params, target)
    }

    /// Handler with no live target; every dispatch resolves to the no-op
    /// sentinel.
    pub fn detached(id: HandlerId, params: Vec<Box<dyn Any>>) -> Self {
        struct NoTarget;
        impl EventDispatcher for NoTarget {}
        let target = Weak::<RefCell<NoTarget>>::new();
        let target: Weak<RefCell<dyn EventDispatcher>> = target;
        Self::new(id, params, target)
    }

    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Typed access to a captured parameter.
    pub fn param<T: Any>(&self, index: usize) -> Option<&T> {
        self.params.get(index).and_then(|p| p.downcast_ref())
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Routes the event into the target. A dead target is a stale dispatch:
    /// logged, then resolved as [`DispatchResult::Unhandled`].
    pub fn dispatch(&self, event: &mut dyn Any) -> DispatchResult {
        match self.target.upgrade() {
            Some(target) => target.borrow_mut().dispatch_on_event(self, event),
            None => {
                log::warn!("stale dispatch for handler id {}", self.id.0);
                DispatchResult::Unhandled
            }
        }
    }
}

/// Per-component-type registry of handler ids, with collision detection at
/// registration time.
///
/// The dispatch switch itself lives in each component's `dispatch_on_event`;
/// this table exists so a colliding id fails the build of the declaring type
/// instead of silently misrouting events at runtime.
#[derive(Debug, Default)]
pub struct DispatchTable {
    names: HashMap<i32, &'static str>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: HandlerId, name: &'static str) -> Result<()> {
        match self.names.entry(id.0) {
            Entry::Occupied(existing) if *existing.get() != name => {
                Err(LifecycleError::HandlerIdCollision {
                    id: id.0,
                    existing: existing.get(),
                    incoming: name,
                })
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(name);
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.names.contains_key(&id.0)
    }

    pub fn name_of(&self, id: HandlerId) -> Option<&'static str> {
        self.names.get(&id.0).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Bounded pool of event payload objects.
///
/// Dispatch sites acquire a payload, fill it, dispatch, clear the fields and
/// release. Past-capacity releases are dropped.
pub struct EventPool<E> {
    free: Vec<E>,
    capacity: usize,
}

impl<E: Default> EventPool<E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn acquire(&mut self) -> E {
        self.free.pop().unwrap_or_default()
    }

    /// The caller clears payload fields before release; the pool stores the
    /// object as-is.
    pub fn release(&mut self, event: E) {
        if self.free.len() < self.capacity {
            self.free.push(event);
        }
    }

    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ON_LAYOUT: HandlerId = HandlerId(1328162206);
    const ON_ERROR: HandlerId = HandlerId(-1048037474);

    struct Recorder {
        seen: Vec<i32>,
    }

    impl EventDispatcher for Recorder {
        fn dispatch_on_event(
            &mut self,
            handler: &EventHandler,
            _event: &mut dyn Any,
        ) -> DispatchResult {
            match handler.id() {
                ON_LAYOUT | ON_ERROR => {
                    self.seen.push(handler.id().0);
                    DispatchResult::Handled
                }
                _ => DispatchResult::Unhandled,
            }
        }
    }

    fn recorder_handler(target: &Rc<RefCell<Recorder>>, id: HandlerId) -> EventHandler {
        EventHandler::for_target(id, vec![Box::new(17u32)], target)
    }

    #[test]
    fn known_ids_route_unknown_id_is_noop() {
        let target = Rc::new(RefCell::new(Recorder { seen: Vec::new() }));
        let mut payload = ();

        assert_eq!(
            recorder_handler(&target, ON_LAYOUT).dispatch(&mut payload),
            DispatchResult::Handled
        );
        assert_eq!(
            recorder_handler(&target, ON_ERROR).dispatch(&mut payload),
            DispatchResult::Handled
        );
        // Unknown id 0 must degrade gracefully, never raise.
        assert_eq!(
            recorder_handler(&target, HandlerId(0)).dispatch(&mut payload),
            DispatchResult::Unhandled
        );
        assert_eq!(target.borrow().seen, vec![ON_LAYOUT.0, ON_ERROR.0]);
    }

    #[test]
    fn detached_handler_is_always_noop() {
        let handler = EventHandler::detached(ON_LAYOUT, Vec::new());
        assert_eq!(handler.dispatch(&mut ()), DispatchResult::Unhandled);
        assert_eq!(handler.id(), ON_LAYOUT);
    }

    #[test]
    fn dead_target_is_stale_dispatch_noop() {
        let handler = {
            let target = Rc::new(RefCell::new(Recorder { seen: Vec::new() }));
            recorder_handler(&target, ON_LAYOUT)
        };
        assert_eq!(handler.dispatch(&mut ()), DispatchResult::Unhandled);
    }

    #[test]
    fn captured_params_are_readable_by_type() {
        let target = Rc::new(RefCell::new(Recorder { seen: Vec::new() }));
        let handler = recorder_handler(&target, ON_LAYOUT);
        assert_eq!(handler.param::<u32>(0), Some(&17));
        assert_eq!(handler.param::<i64>(0), None);
        assert_eq!(handler.param::<u32>(1), None);
    }

    #[test]
    fn dispatch_table_rejects_collisions() {
        let mut table = DispatchTable::new();
        table.register(ON_LAYOUT, "on_layout").unwrap();
        table.register(ON_ERROR, "on_error").unwrap();
        // Re-registering the same pair is fine.
        table.register(ON_LAYOUT, "on_layout").unwrap();

        let err = table.register(ON_LAYOUT, "on_click").unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::HandlerIdCollision { id, .. } if id == ON_LAYOUT.0
        ));
    }

    #[test]
    fn event_pool_is_bounded() {
        let mut pool: EventPool<String> = EventPool::new(2);
        pool.release("a".into());
        pool.release("b".into());
        pool.release("c".into());
        assert_eq!(pool.pooled(), 2);
        pool.acquire();
        pool.acquire();
        // Drained past the free list: acquire falls back to Default.
        assert_eq!(pool.acquire(), String::new());
    }
}
