//! State containers and the update queue.
//!
//! A [`StateContainer`] holds the mutable state fields of one component
//! instance. Containers are owned by the tree's [`StateHandler`], keyed by the
//! component's global key, and survive re-renders: a new node produced by a
//! render pass receives the previous values through `transfer_state`, never by
//! aliasing the old container.
//!
//! Mutation goes through the [`StateUpdateQueue`] as recorded update
//! functions, applied in submission order before the next render. The queue is
//! the only channel through which background-thread-computed updates may reach
//! a container; the containers themselves never leave the UI thread.

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::collections::map::{Entry, HashMap};

/// Mutable state fields for one component instance.
///
/// Implemented by per-component state structs; the core only needs to move
/// containers around and hand them back to the owning component for typed
/// access.
pub trait StateContainer: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Write-through cell used by `on_create_initial_state` and update functions.
///
/// Mirrors the output-slot shape but is not pooled: a `StateValue` lives only
/// for the duration of one update function.
pub struct StateValue<T> {
    value: Option<T>,
}

impl<T> StateValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Some(initial),
        }
    }

    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

/// Identifies one logical component instance across render passes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalKey(pub Arc<str>);

impl GlobalKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How an update wants to be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// Coalesced and applied before the very next render.
    Sync,
    /// Applied on a later scheduled flush.
    Async,
    /// Applied immediately to the live container without requesting a
    /// render; used for reads that must observe the new value right away.
    Lazy,
}

/// What the queue currently asks of the tree driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderRequest {
    None,
    /// At least one async update is pending.
    Scheduled,
    /// At least one sync update is pending; render before the next frame.
    Immediate,
}

type UpdateFn = Box<dyn Fn(&mut dyn StateContainer) + Send>;

/// A recorded, replayable state mutation.
///
/// Applying the same ordered sequence of updates to the same starting
/// container is deterministic; the functions themselves must be pure in
/// everything but the container they receive.
pub struct StateUpdate {
    pub key: GlobalKey,
    pub mode: UpdateMode,
    apply: UpdateFn,
}

impl StateUpdate {
    pub fn apply_to(&self, container: &mut dyn StateContainer) {
        (self.apply)(container);
    }
}

struct QueueInner {
    pending: Vec<StateUpdate>,
    request: RenderRequest,
}

/// Deferred mutations to state containers, drained by the tree driver before
/// a render pass.
///
/// Cloning the queue shares the underlying buffer, so background work can
/// hold a handle while the driver owns the flush.
#[derive(Clone)]
pub struct StateUpdateQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl Default for StateUpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl StateUpdateQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner {
                pending: Vec::new(),
                request: RenderRequest::None,
            })),
        }
    }

    /// Records an update. `mode` must be [`UpdateMode::Sync`] or
    /// [`UpdateMode::Async`]; lazy updates bypass the queue via
    /// [`StateHandler::apply_lazy`] because they touch the live container.
    pub fn enqueue(
        &self,
        key: GlobalKey,
        mode: UpdateMode,
        apply: impl Fn(&mut dyn StateContainer) + Send + 'static,
    ) {
        debug_assert!(mode != UpdateMode::Lazy, "lazy updates bypass the queue");
        let mut inner = self.inner.lock().expect("state update queue poisoned");
        let wanted = match mode {
            UpdateMode::Sync => RenderRequest::Immediate,
            _ => RenderRequest::Scheduled,
        };
        inner.request = inner.request.max(wanted);
        inner.pending.push(StateUpdate {
            key,
            mode,
            apply: Box::new(apply),
        });
    }

    /// Drains all pending updates in submission order and clears the render
    /// request.
    pub fn take_pending(&self) -> Vec<StateUpdate> {
        let mut inner = self.inner.lock().expect("state update queue poisoned");
        inner.request = RenderRequest::None;
        std::mem::take(&mut inner.pending)
    }

    pub fn render_request(&self) -> RenderRequest {
        self.inner
            .lock()
            .expect("state update queue poisoned")
            .request
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .expect("state update queue poisoned")
            .pending
            .is_empty()
    }
}

/// Owns the state containers of every component currently in the tree.
pub struct StateHandler {
    containers: HashMap<GlobalKey, Box<dyn StateContainer>>,
}

impl Default for StateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandler {
    pub fn new() -> Self {
        Self {
            containers: HashMap::default(),
        }
    }

    /// Seeds the container for `key` on first appearance. Returns `true` when
    /// the container was created by this call; subsequent renders of the same
    /// logical instance leave the existing container untouched, so the
    /// component's `on_create_initial_state` runs exactly once.
    pub fn ensure_initial(
        &mut self,
        key: &GlobalKey,
        init: impl FnOnce() -> Box<dyn StateContainer>,
    ) -> bool {
        match self.containers.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(init());
                true
            }
        }
    }

    pub fn contains(&self, key: &GlobalKey) -> bool {
        self.containers.contains_key(key)
    }

    pub fn container(&self, key: &GlobalKey) -> Option<&dyn StateContainer> {
        self.containers.get(key).map(|boxed| boxed.as_ref())
    }

    pub fn container_mut(&mut self, key: &GlobalKey) -> Option<&mut (dyn StateContainer + 'static)> {
        self.containers.get_mut(key).map(|boxed| boxed.as_mut())
    }

    /// Applies drained queue records in submission order. Updates addressed
    /// to keys that already left the tree are dropped silently, mirroring the
    /// stale-dispatch policy.
    pub fn apply_updates(&mut self, updates: &[StateUpdate]) {
        for update in updates {
            match self.containers.get_mut(&update.key) {
                Some(container) => update.apply_to(container.as_mut()),
                None => {
                    log::debug!(
                        "dropping state update for departed key {:?}",
                        update.key.as_str()
                    );
                }
            }
        }
    }

    /// Applies a lazy update immediately to the live container. No render is
    /// requested; the mutation is visible to the next read and carried
    /// forward by state transfer like any other value.
    pub fn apply_lazy(&mut self, key: &GlobalKey, apply: impl FnOnce(&mut dyn StateContainer)) {
        if let Some(container) = self.containers.get_mut(key) {
            apply(container.as_mut());
        }
    }

    /// Drops the container when the component leaves the tree.
    pub fn remove(&mut self, key: &GlobalKey) {
        self.containers.remove(key);
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CounterState {
        count: i64,
    }

    impl StateContainer for CounterState {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn count_of(handler: &StateHandler, key: &GlobalKey) -> i64 {
        handler
            .container(key)
            .and_then(|c| c.as_any().downcast_ref::<CounterState>())
            .map(|c| c.count)
            .unwrap()
    }

    #[test]
    fn ensure_initial_runs_once_per_key() {
        let mut handler = StateHandler::new();
        let key = GlobalKey::new("root/counter:0");

        assert!(handler.ensure_initial(&key, || Box::new(CounterState { count: 1 })));
        assert!(!handler.ensure_initial(&key, || Box::new(CounterState { count: 99 })));
        assert_eq!(count_of(&handler, &key), 1);
    }

    #[test]
    fn updates_apply_in_submission_order() {
        let mut handler = StateHandler::new();
        let key = GlobalKey::new("root/counter:0");
        handler.ensure_initial(&key, || Box::new(CounterState { count: 0 }));

        let queue = StateUpdateQueue::new();
        queue.enqueue(key.clone(), UpdateMode::Sync, |c| {
            c.as_any_mut().downcast_mut::<CounterState>().unwrap().count += 1;
        });
        queue.enqueue(key.clone(), UpdateMode::Async, |c| {
            c.as_any_mut().downcast_mut::<CounterState>().unwrap().count *= 10;
        });

        assert_eq!(queue.render_request(), RenderRequest::Immediate);
        let pending = queue.take_pending();
        handler.apply_updates(&pending);

        // (0 + 1) * 10, not 0 * 10 + 1: submission order.
        assert_eq!(count_of(&handler, &key), 10);
        assert_eq!(queue.render_request(), RenderRequest::None);
    }

    #[test]
    fn replay_from_same_snapshot_is_deterministic() {
        let key = GlobalKey::new("root/counter:0");
        let queue = StateUpdateQueue::new();
        queue.enqueue(key.clone(), UpdateMode::Sync, |c| {
            c.as_any_mut().downcast_mut::<CounterState>().unwrap().count += 5;
        });
        let pending = queue.take_pending();

        for _ in 0..2 {
            let mut handler = StateHandler::new();
            handler.ensure_initial(&key, || Box::new(CounterState { count: 2 }));
            handler.apply_updates(&pending);
            handler.apply_updates(&pending);
            // Two applications from the same snapshot, same result each run.
            assert_eq!(count_of(&handler, &key), 12);
        }
    }

    #[test]
    fn lazy_update_mutates_without_render_request() {
        let mut handler = StateHandler::new();
        let key = GlobalKey::new("root/counter:0");
        handler.ensure_initial(&key, || Box::new(CounterState { count: 0 }));

        let queue = StateUpdateQueue::new();
        handler.apply_lazy(&key, |c| {
            c.as_any_mut().downcast_mut::<CounterState>().unwrap().count = 42;
        });

        assert_eq!(count_of(&handler, &key), 42);
        assert_eq!(queue.render_request(), RenderRequest::None);
    }

    #[test]
    fn updates_for_departed_keys_are_dropped() {
        let mut handler = StateHandler::new();
        let key = GlobalKey::new("root/counter:0");
        handler.ensure_initial(&key, || Box::new(CounterState { count: 0 }));
        handler.remove(&key);

        let queue = StateUpdateQueue::new();
        queue.enqueue(key.clone(), UpdateMode::Sync, |c| {
            c.as_any_mut().downcast_mut::<CounterState>().unwrap().count = 7;
        });
        handler.apply_updates(&queue.take_pending());
        assert!(handler.is_empty());
    }
}
