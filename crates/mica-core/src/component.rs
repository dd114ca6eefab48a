//! The component lifecycle contract.
//!
//! A component is an immutable-props, possibly-stateful unit of UI
//! description. Concrete types implement [`Component`] by overriding only the
//! hooks and capability queries they need; everything else keeps its default.
//! The orchestration in [`crate::lifecycle`] queries capabilities rather than
//! relying on any inheritance structure.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::ComponentContext;
use crate::error::Result;
use crate::events::EventDispatcher;
use crate::geometry::{Rect, Size, SizeConstraints};
use crate::pool::MountContent;
use crate::state::StateContainer;
use crate::tree_props::TreeProps;
use crate::trigger::{EventTriggersContainer, TriggerTarget};

/// Stable per-instance identity. Two nodes with the same id are the same
/// logical node and trivially equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentId(pub u64);

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

impl ComponentId {
    /// Allocates a fresh id. A shallow copy must allocate its own.
    pub fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What kind of platform object a component mounts, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MountType {
    #[default]
    None,
    View,
    Drawable,
}

/// Semantic fields handed to the platform accessibility delegate.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AccessibilityNode {
    pub content_description: Option<String>,
    pub class_name: Option<&'static str>,
    pub bounds: Rect,
    pub clickable: bool,
}

/// The ordered set of phase callbacks a component may implement, plus the
/// capability queries the orchestrator uses to decide which phases apply.
///
/// Contract highlights (the orchestrator relies on these):
/// - `is_equivalent_to` is reflexive and symmetric, short-circuits on
///   reference/id identity, and is total and side-effect-free.
/// - `make_shallow_copy` clones prop fields verbatim, allocates a fresh
///   (empty) state container to be filled by `transfer_state`, and clears all
///   inter-stage output fields to unset.
/// - `on_measure` is a pure function of props/state/constraints and must not
///   mutate state; inter-stage values it records are consumed by
///   `on_bounds_defined` and the mount phases of the *same* render pass.
/// - `on_unmount` detaches every reference the mount phase installed, so the
///   content object is inert before it returns to the pool.
pub trait Component: EventDispatcher + TriggerTarget {
    /// Unique per component type; also the mount-content pool key.
    fn type_name(&self) -> &'static str;

    fn id(&self) -> ComponentId;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Structural equivalence: same concrete type AND (same id OR all props,
    /// state fields and inherited tree props pairwise equal). Equivalence
    /// lets the pipeline reuse prior outputs without re-invoking
    /// measure/bounds/mount.
    fn is_equivalent_to(&self, other: &dyn Component) -> bool;

    fn make_shallow_copy(&self) -> Box<dyn Component>;

    // --- tree props -----------------------------------------------------

    /// Reads inherited tree props into the node's own fields.
    fn populate_tree_props(&mut self, _tree_props: &TreeProps) {}

    /// Augments the inherited map for descendants; copy-on-write, so the
    /// parent's map is never mutated in place.
    fn tree_props_for_children(&self, _ctx: &ComponentContext, parent: &TreeProps) -> TreeProps {
        parent.clone()
    }

    // --- style ----------------------------------------------------------

    /// Overrides *unset* optional props from platform theme attributes. Must
    /// not overwrite a prop the caller explicitly set: apply only when the
    /// resolved attribute is present AND the prop's output is unset.
    fn on_load_style(&mut self, _ctx: &ComponentContext) -> Result<()> {
        Ok(())
    }

    // --- state ----------------------------------------------------------

    fn has_state(&self) -> bool {
        false
    }

    /// Seeds the state container from props on the component's first
    /// appearance. Executed exactly once per component lifetime; never again
    /// on re-renders, even when equivalence fails.
    fn on_create_initial_state(&self, _ctx: &ComponentContext) -> Option<Box<dyn StateContainer>> {
        None
    }

    /// Copies the previous committed state values into this node's own
    /// container. Invoked whenever the node persists across a render, even if
    /// props changed.
    fn transfer_state(&mut self, _prev: &dyn StateContainer) {}

    // --- measure / bounds ----------------------------------------------

    fn can_measure(&self) -> bool {
        false
    }

    fn on_measure(&mut self, _ctx: &ComponentContext, constraints: SizeConstraints) -> Result<Size> {
        Ok(constraints.constrain(Size::ZERO))
    }

    /// Only components declaring this receive `on_bounds_defined`.
    fn is_mount_size_dependent(&self) -> bool {
        false
    }

    /// Consumes measure-phase outputs plus finalized bounds; may record
    /// further values consumed at mount time.
    fn on_bounds_defined(&mut self, _ctx: &ComponentContext, _bounds: Rect) -> Result<()> {
        Ok(())
    }

    // --- mount ----------------------------------------------------------

    fn mount_type(&self) -> MountType {
        MountType::None
    }

    /// Factory for the pooled platform object. Stateless with respect to
    /// props: the object is reused across many different prop sets.
    fn on_create_mount_content(&self, _ctx: &ComponentContext) -> MountContent {
        Box::new(())
    }

    /// Free-list capacity for this type's mount content.
    fn pool_size(&self) -> usize {
        3
    }

    /// Hint that pool entries may be constructed before first use.
    fn can_preallocate(&self) -> bool {
        false
    }

    fn on_mount(&mut self, _ctx: &ComponentContext, _content: &mut MountContent) -> Result<()> {
        Ok(())
    }

    fn on_bind(&mut self, _ctx: &ComponentContext, _content: &mut MountContent) -> Result<()> {
        Ok(())
    }

    fn on_unbind(&mut self, _ctx: &ComponentContext, _content: &mut MountContent) -> Result<()> {
        Ok(())
    }

    fn on_unmount(&mut self, _ctx: &ComponentContext, _content: &mut MountContent) -> Result<()> {
        Ok(())
    }

    /// Publishes this instance's trigger(s) into the tree-wide registry.
    /// Called once per mount with a weak reference to the mounted instance.
    fn record_event_trigger(
        &mut self,
        _container: &mut EventTriggersContainer,
        _target: Weak<RefCell<dyn TriggerTarget>>,
    ) {
    }

    // --- update fast path ----------------------------------------------

    fn calls_should_update_on_mount(&self) -> bool {
        false
    }

    fn is_pure_render(&self) -> bool {
        false
    }

    /// Pairwise prop diff consulted by the mount fast path; see
    /// [`crate::lifecycle`] for when it applies.
    fn should_update(&self, prev: &dyn Component) -> bool {
        !self.is_equivalent_to(prev)
    }

    // --- accessibility --------------------------------------------------

    fn implements_accessibility(&self) -> bool {
        false
    }

    fn populate_accessibility_node(&self, _node: &mut AccessibilityNode) {}

    fn extra_accessibility_nodes_count(&self) -> usize {
        0
    }

    /// Index of the virtual accessibility node at `(x, y)`, stable for a
    /// given bounds snapshot.
    fn extra_accessibility_node_at(&self, _x: i32, _y: i32) -> Option<usize> {
        None
    }
}

// The lifecycle host stores nodes as `Rc<RefCell<Box<dyn Component>>>` and
// hands out weak references as dispatch/trigger targets, so the boxed node
// itself must satisfy both target traits.

impl EventDispatcher for Box<dyn Component> {
    fn dispatch_on_event(
        &mut self,
        handler: &crate::events::EventHandler,
        event: &mut dyn Any,
    ) -> crate::events::DispatchResult {
        (**self).dispatch_on_event(handler, event)
    }
}

impl TriggerTarget for Box<dyn Component> {
    fn accept_trigger_event(
        &mut self,
        trigger: &crate::trigger::EventTrigger,
        event: &mut dyn Any,
        params: &[Box<dyn Any>],
    ) -> crate::events::DispatchResult {
        (**self).accept_trigger_event(trigger, event, params)
    }
}

/// Downcast helper for concrete `is_equivalent_to` implementations.
pub fn downcast_component<T: Any>(other: &dyn Component) -> Option<&T> {
    other.as_any().downcast_ref::<T>()
}
