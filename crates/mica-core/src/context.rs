//! Tree scope and per-component context.
//!
//! A [`TreeScope`] owns the shared services of one component tree: the state
//! handler and update queue, the trigger registry, the mount content pool,
//! the output slot pool, and the boundary services (theme, measurement). It
//! is confined to the UI-owning thread; the update queue is the only handle
//! that crosses threads.
//!
//! A [`ComponentContext`] is a cheap handle over the scope plus the current
//! component scope (the global key of the component a callback belongs to).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::output::{OutputPool, OutputSlot};
use crate::platform::{AttrId, AttrValue, MeasureBackend, NoTheme, ThemeResolver};
use crate::pool::MountContentPool;
use crate::state::{GlobalKey, RenderRequest, StateContainer, StateHandler, StateUpdateQueue, UpdateMode};
use crate::tree_props::TreeProps;
use crate::trigger::{EventTrigger, EventTriggersContainer, TriggerId};
use crate::events::DispatchResult;

const OUTPUT_POOL_CAPACITY: usize = 8;

pub struct TreeScope {
    state: RefCell<StateHandler>,
    updates: StateUpdateQueue,
    triggers: RefCell<EventTriggersContainer>,
    mount_pool: RefCell<MountContentPool>,
    outputs: RefCell<OutputPool>,
    theme: Rc<dyn ThemeResolver>,
    measure: Option<Rc<dyn MeasureBackend>>,
    generation: Cell<u64>,
}

impl Default for TreeScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeScope {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(StateHandler::new()),
            updates: StateUpdateQueue::new(),
            triggers: RefCell::new(EventTriggersContainer::new()),
            mount_pool: RefCell::new(MountContentPool::new()),
            outputs: RefCell::new(OutputPool::new(OUTPUT_POOL_CAPACITY)),
            theme: Rc::new(NoTheme),
            measure: None,
            generation: Cell::new(0),
        }
    }

    pub fn with_theme(mut self, theme: Rc<dyn ThemeResolver>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_measure_backend(mut self, backend: Rc<dyn MeasureBackend>) -> Self {
        self.measure = Some(backend);
        self
    }

    pub fn update_queue(&self) -> &StateUpdateQueue {
        &self.updates
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&StateHandler) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn with_state_mut<R>(&self, f: impl FnOnce(&mut StateHandler) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    pub fn with_triggers<R>(&self, f: impl FnOnce(&EventTriggersContainer) -> R) -> R {
        f(&self.triggers.borrow())
    }

    pub fn with_triggers_mut<R>(&self, f: impl FnOnce(&mut EventTriggersContainer) -> R) -> R {
        f(&mut self.triggers.borrow_mut())
    }

    pub fn with_mount_pool<R>(&self, f: impl FnOnce(&mut MountContentPool) -> R) -> R {
        f(&mut self.mount_pool.borrow_mut())
    }

    pub fn theme(&self) -> &Rc<dyn ThemeResolver> {
        &self.theme
    }

    pub fn measure_backend(&self) -> Option<Rc<dyn MeasureBackend>> {
        self.measure.clone()
    }

    /// Starts a new render generation, superseding any in-flight pass.
    pub fn advance_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.get()
    }

    /// Tears the scope down: containers, triggers and pooled content are
    /// dropped together with the tree.
    pub fn destroy(&self) {
        self.with_mount_pool(|pool| pool.clear());
        self.with_triggers_mut(|triggers| *triggers = EventTriggersContainer::new());
        self.with_state_mut(|state| *state = StateHandler::new());
    }
}

/// Handle passed into every lifecycle callback.
#[derive(Clone)]
pub struct ComponentContext {
    scope: Rc<TreeScope>,
    component_scope: Option<GlobalKey>,
    tree_props: TreeProps,
}

impl ComponentContext {
    pub fn new(scope: Rc<TreeScope>) -> Self {
        Self {
            scope,
            component_scope: None,
            tree_props: TreeProps::new(),
        }
    }

    /// A copy of this context scoped to the given component.
    pub fn with_component_scope(&self, key: GlobalKey) -> Self {
        Self {
            scope: Rc::clone(&self.scope),
            component_scope: Some(key),
            tree_props: self.tree_props.clone(),
        }
    }

    pub fn with_tree_props(&self, tree_props: TreeProps) -> Self {
        Self {
            scope: Rc::clone(&self.scope),
            component_scope: self.component_scope.clone(),
            tree_props,
        }
    }

    pub fn tree_scope(&self) -> &Rc<TreeScope> {
        &self.scope
    }

    pub fn component_scope(&self) -> Option<&GlobalKey> {
        self.component_scope.as_ref()
    }

    pub fn tree_props(&self) -> &TreeProps {
        &self.tree_props
    }

    // --- state updates --------------------------------------------------

    /// Records a synchronous update: coalesced, applied before the next
    /// render. Outside a component scope this is a logged no-op, matching
    /// the recycled-element dispatch policy.
    pub fn update_state_sync(&self, apply: impl Fn(&mut dyn StateContainer) + Send + 'static) {
        self.enqueue_update(UpdateMode::Sync, apply);
    }

    /// Records an asynchronous update, applied on a later flush.
    pub fn update_state_async(&self, apply: impl Fn(&mut dyn StateContainer) + Send + 'static) {
        self.enqueue_update(UpdateMode::Async, apply);
    }

    fn enqueue_update(
        &self,
        mode: UpdateMode,
        apply: impl Fn(&mut dyn StateContainer) + Send + 'static,
    ) {
        match &self.component_scope {
            Some(key) => self.scope.update_queue().enqueue(key.clone(), mode, apply),
            None => log::warn!("state update outside a component scope dropped"),
        }
    }

    /// Applies an update immediately to the live container, without
    /// requesting a render. For reads that must observe the value right away.
    pub fn update_state_lazy(&self, apply: impl FnOnce(&mut dyn StateContainer)) {
        match &self.component_scope {
            Some(key) => self.scope.with_state_mut(|state| state.apply_lazy(key, apply)),
            None => log::warn!("lazy state update outside a component scope dropped"),
        }
    }

    pub fn render_request(&self) -> RenderRequest {
        self.scope.update_queue().render_request()
    }

    // --- boundary services ---------------------------------------------

    /// Resolves a theme attribute; `None` when the theme does not define it.
    pub fn resolve_attr(&self, attr: AttrId) -> Option<AttrValue> {
        self.scope.theme().resolve(attr)
    }

    pub fn measure_backend(&self) -> Option<Rc<dyn MeasureBackend>> {
        self.scope.measure_backend()
    }

    // --- output slots ---------------------------------------------------

    pub fn acquire_output(&self) -> OutputSlot {
        self.scope.outputs.borrow_mut().acquire()
    }

    pub fn release_output(&self, slot: OutputSlot) {
        self.scope.outputs.borrow_mut().release(slot);
    }

    pub fn pooled_outputs(&self) -> usize {
        self.scope.outputs.borrow().pooled()
    }

    // --- triggers -------------------------------------------------------

    /// Creates an unbound trigger for the given key; the mount path binds the
    /// live target and records it.
    pub fn new_event_trigger(&self, key: &str, id: TriggerId) -> EventTrigger {
        EventTrigger::new(key, id)
    }

    pub fn event_trigger(&self, key: &str, id: TriggerId) -> Option<EventTrigger> {
        self.scope.with_triggers(|triggers| triggers.get(key, id).cloned())
    }

    /// Looks up and synchronously invokes a published trigger; a miss is a
    /// no-op.
    pub fn invoke_trigger(
        &self,
        key: &str,
        id: TriggerId,
        event: &mut dyn std::any::Any,
        params: &[Box<dyn std::any::Any>],
    ) -> DispatchResult {
        // Clone out of the registry first so a handler that records or
        // clears triggers does not re-enter the borrow.
        match self.event_trigger(key, id) {
            Some(trigger) => trigger.dispatch_on_trigger(event, params),
            None => DispatchResult::Unhandled,
        }
    }
}
