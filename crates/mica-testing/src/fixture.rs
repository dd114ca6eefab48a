//! Fixture mount component exercising every lifecycle phase.
//!
//! `FixtureMount` is the workhorse of the integration tests: eight props
//! across several types, two state fields, inter-stage outputs, an event
//! handler pair, a click trigger and a probe that counts every callback.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use mica_core::{
    downcast_component, AccessibilityNode, Component, ComponentContext, ComponentId,
    DispatchResult, DispatchTable, EventDispatcher, EventHandler, EventPool, EventTrigger,
    EventTriggersContainer, HandlerId, LifecycleError, MountContent, MountType, Rect, Result,
    Size, SizeConstraints, StateContainer, TreeProps, TriggerId, TriggerTarget,
};

/// Dispatch id of the fixture's layout-output event handler.
pub const LAYOUT_EVENT_HANDLER: HandlerId = HandlerId(1_328_162_206);

/// Dispatch id of the fixture's error event handler.
pub const ERROR_HANDLER: HandlerId = HandlerId(-1_048_037_474);

/// Trigger id of the fixture's click trigger.
pub const CLICK_TRIGGER: TriggerId = TriggerId(-830_639_048);

const REQUIRED_PROPS: [&str; 7] = [
    "prop1", "prop3", "prop4", "prop5", "prop6", "prop7", "prop8",
];

/// Payload for both fixture handlers.
#[derive(Default)]
pub struct FixtureEvent {
    pub value: i32,
}

/// Pools the payload around a single dispatch.
pub fn dispatch_fixture_event(
    pool: &mut EventPool<FixtureEvent>,
    handler: &EventHandler,
    value: i32,
) -> DispatchResult {
    let mut event = pool.acquire();
    event.value = value;
    let result = handler.dispatch(&mut event);
    event.value = 0;
    pool.release(event);
    result
}

/// Tree prop published by the fixture for its children, carrying `prop6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixtureTreeProp(pub i64);

#[derive(Debug, Default)]
struct ProbeCounters {
    initial_states: Cell<usize>,
    styles: Cell<usize>,
    measures: Cell<usize>,
    bounds: Cell<usize>,
    mounts: Cell<usize>,
    binds: Cell<usize>,
    unbinds: Cell<usize>,
    unmounts: Cell<usize>,
    triggers: Cell<usize>,
    events: RefCell<Vec<i32>>,
}

/// Shared counter block observing a fixture's lifecycle from the outside.
///
/// Cloning shares the counters; shallow copies of the component keep
/// reporting into the same probe.
#[derive(Clone, Debug, Default)]
pub struct LifecycleProbe {
    counters: Rc<ProbeCounters>,
}

impl LifecycleProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_states(&self) -> usize {
        self.counters.initial_states.get()
    }

    pub fn styles(&self) -> usize {
        self.counters.styles.get()
    }

    pub fn measures(&self) -> usize {
        self.counters.measures.get()
    }

    pub fn bounds(&self) -> usize {
        self.counters.bounds.get()
    }

    pub fn mounts(&self) -> usize {
        self.counters.mounts.get()
    }

    pub fn binds(&self) -> usize {
        self.counters.binds.get()
    }

    pub fn unbinds(&self) -> usize {
        self.counters.unbinds.get()
    }

    pub fn unmounts(&self) -> usize {
        self.counters.unmounts.get()
    }

    pub fn triggers(&self) -> usize {
        self.counters.triggers.get()
    }

    /// Handler ids dispatched into the fixture, in order.
    pub fn events(&self) -> Vec<i32> {
        self.counters.events.borrow().clone()
    }

    fn bump(cell: &Cell<usize>) {
        cell.set(cell.get() + 1);
    }
}

#[derive(Debug, Default)]
pub struct FixtureState {
    pub state1: i64,
    pub state2: String,
}

impl StateContainer for FixtureState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Mount content for the fixture. Fields are installed on mount and cleared
/// again on unmount so pooled reuse starts from an inert object.
#[derive(Default)]
pub struct FixtureDrawable {
    pub mounted_prop1: Option<i32>,
    pub bound: bool,
}

#[derive(Debug)]
pub struct FixtureMount {
    id: ComponentId,
    trigger_key: Rc<str>,
    probe: LifecycleProbe,
    prop1: i32,
    prop2: bool,
    prop3: String,
    prop4: Vec<char>,
    prop5: char,
    prop6: i64,
    prop7: String,
    prop8: i64,
    state: FixtureState,
    dispatch_table: Rc<DispatchTable>,
    // Inter-stage outputs; unset until the producing phase runs.
    measure_output: Option<u64>,
    bounds_output: Option<i32>,
    received_tree_prop: Option<i64>,
}

impl FixtureMount {
    pub fn builder() -> FixtureMountBuilder {
        FixtureMountBuilder::default()
    }

    // Declares the ids this type dispatches; a collision surfaces at build.
    fn dispatch_table() -> Result<DispatchTable> {
        let mut table = DispatchTable::new();
        table.register(LAYOUT_EVENT_HANDLER, "on_layout_output")?;
        table.register(ERROR_HANDLER, "on_error")?;
        Ok(table)
    }

    pub fn prop1(&self) -> i32 {
        self.prop1
    }

    pub fn prop2(&self) -> bool {
        self.prop2
    }

    pub fn state1(&self) -> i64 {
        self.state.state1
    }

    pub fn state2(&self) -> &str {
        &self.state.state2
    }

    pub fn measure_output(&self) -> Option<u64> {
        self.measure_output
    }

    pub fn bounds_output(&self) -> Option<i32> {
        self.bounds_output
    }

    pub fn received_tree_prop(&self) -> Option<i64> {
        self.received_tree_prop
    }
}

#[derive(Default)]
pub struct FixtureMountBuilder {
    required: u8,
    trigger_key: Option<Rc<str>>,
    probe: Option<LifecycleProbe>,
    prop1: Option<i32>,
    prop2: Option<bool>,
    prop3: Option<String>,
    prop4: Option<Vec<char>>,
    prop5: Option<char>,
    prop6: Option<i64>,
    prop7: Option<String>,
    prop8: Option<i64>,
}

impl FixtureMountBuilder {
    pub fn key(mut self, key: impl Into<Rc<str>>) -> Self {
        self.trigger_key = Some(key.into());
        self
    }

    pub fn probe(mut self, probe: LifecycleProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn prop1(mut self, value: i32) -> Self {
        self.prop1 = Some(value);
        self.required |= 1 << 0;
        self
    }

    pub fn prop2(mut self, value: bool) -> Self {
        self.prop2 = Some(value);
        self
    }

    pub fn prop3(mut self, value: impl Into<String>) -> Self {
        self.prop3 = Some(value.into());
        self.required |= 1 << 1;
        self
    }

    pub fn prop4(mut self, value: Vec<char>) -> Self {
        self.prop4 = Some(value);
        self.required |= 1 << 2;
        self
    }

    pub fn prop5(mut self, value: char) -> Self {
        self.prop5 = Some(value);
        self.required |= 1 << 3;
        self
    }

    pub fn prop6(mut self, value: i64) -> Self {
        self.prop6 = Some(value);
        self.required |= 1 << 4;
        self
    }

    pub fn prop7(mut self, value: impl Into<String>) -> Self {
        self.prop7 = Some(value.into());
        self.required |= 1 << 5;
        self
    }

    pub fn prop8(mut self, value: i64) -> Self {
        self.prop8 = Some(value);
        self.required |= 1 << 6;
        self
    }

    pub fn build(self) -> Result<FixtureMount> {
        if self.required != (1 << REQUIRED_PROPS.len()) - 1 {
            let missing = REQUIRED_PROPS
                .iter()
                .enumerate()
                .filter(|(bit, _)| self.required & (1 << bit) == 0)
                .map(|(_, name)| *name)
                .collect();
            return Err(LifecycleError::MissingRequiredProp {
                component: "FixtureMount",
                missing,
            });
        }
        Ok(FixtureMount {
            id: ComponentId::next(),
            trigger_key: self.trigger_key.unwrap_or_else(|| Rc::from("fixture")),
            probe: self.probe.unwrap_or_default(),
            prop1: self.prop1.unwrap_or_default(),
            prop2: self.prop2.unwrap_or_default(),
            prop3: self.prop3.unwrap_or_default(),
            prop4: self.prop4.unwrap_or_default(),
            prop5: self.prop5.unwrap_or_default(),
            prop6: self.prop6.unwrap_or_default(),
            prop7: self.prop7.unwrap_or_default(),
            prop8: self.prop8.unwrap_or_default(),
            state: FixtureState::default(),
            dispatch_table: Rc::new(FixtureMount::dispatch_table()?),
            measure_output: None,
            bounds_output: None,
            received_tree_prop: None,
        })
    }
}

impl Component for FixtureMount {
    fn type_name(&self) -> &'static str {
        "FixtureMount"
    }

    fn id(&self) -> ComponentId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_equivalent_to(&self, other: &dyn Component) -> bool {
        if self.id == other.id() {
            return true;
        }
        let Some(other) = downcast_component::<FixtureMount>(other) else {
            return false;
        };
        self.prop1 == other.prop1
            && self.prop2 == other.prop2
            && self.prop3 == other.prop3
            && self.prop4 == other.prop4
            && self.prop5 == other.prop5
            && self.prop6 == other.prop6
            && self.prop7 == other.prop7
            && self.prop8 == other.prop8
            && self.state.state1 == other.state.state1
            && self.state.state2 == other.state.state2
    }

    fn make_shallow_copy(&self) -> Box<dyn Component> {
        Box::new(FixtureMount {
            id: self.id,
            trigger_key: Rc::clone(&self.trigger_key),
            probe: self.probe.clone(),
            prop1: self.prop1,
            prop2: self.prop2,
            prop3: self.prop3.clone(),
            prop4: self.prop4.clone(),
            prop5: self.prop5,
            prop6: self.prop6,
            prop7: self.prop7.clone(),
            prop8: self.prop8,
            state: FixtureState::default(),
            dispatch_table: Rc::clone(&self.dispatch_table),
            measure_output: None,
            bounds_output: None,
            received_tree_prop: None,
        })
    }

    fn populate_tree_props(&mut self, tree_props: &TreeProps) {
        self.received_tree_prop = tree_props.get::<FixtureTreeProp>().map(|p| p.0);
    }

    fn tree_props_for_children(&self, _ctx: &ComponentContext, parent: &TreeProps) -> TreeProps {
        parent.put(FixtureTreeProp(self.prop6))
    }

    fn on_load_style(&mut self, _ctx: &ComponentContext) -> Result<()> {
        LifecycleProbe::bump(&self.probe.counters.styles);
        Ok(())
    }

    fn has_state(&self) -> bool {
        true
    }

    fn on_create_initial_state(&self, _ctx: &ComponentContext) -> Option<Box<dyn StateContainer>> {
        LifecycleProbe::bump(&self.probe.counters.initial_states);
        Some(Box::new(FixtureState {
            state1: 0,
            state2: self.prop3.clone(),
        }))
    }

    fn transfer_state(&mut self, prev: &dyn StateContainer) {
        if let Some(prev) = prev.as_any().downcast_ref::<FixtureState>() {
            self.state.state1 = prev.state1;
            self.state.state2 = prev.state2.clone();
        }
    }

    fn can_measure(&self) -> bool {
        true
    }

    fn on_measure(&mut self, ctx: &ComponentContext, constraints: SizeConstraints) -> Result<Size> {
        LifecycleProbe::bump(&self.probe.counters.measures);
        let size = match ctx.measure_backend() {
            Some(backend) => backend.measure(constraints, &self.prop3),
            None => constraints.constrain(Size::new(self.prop1.max(1) * 10, 10)),
        };
        let mut slot = ctx.acquire_output();
        slot.set(((size.width as u64) << 32) | size.height as u64)?;
        self.measure_output = slot.take::<u64>();
        ctx.release_output(slot);
        Ok(size)
    }

    fn is_mount_size_dependent(&self) -> bool {
        true
    }

    fn on_bounds_defined(&mut self, ctx: &ComponentContext, bounds: Rect) -> Result<()> {
        LifecycleProbe::bump(&self.probe.counters.bounds);
        let mut slot = ctx.acquire_output();
        slot.set(bounds.width * bounds.height)?;
        self.bounds_output = slot.take::<i32>();
        ctx.release_output(slot);
        Ok(())
    }

    fn mount_type(&self) -> MountType {
        MountType::Drawable
    }

    fn on_create_mount_content(&self, _ctx: &ComponentContext) -> MountContent {
        Box::new(FixtureDrawable::default())
    }

    fn pool_size(&self) -> usize {
        3
    }

    fn can_preallocate(&self) -> bool {
        true
    }

    fn on_mount(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        LifecycleProbe::bump(&self.probe.counters.mounts);
        let drawable = content.downcast_mut::<FixtureDrawable>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "FixtureDrawable",
            },
        )?;
        drawable.mounted_prop1 = Some(self.prop1);
        Ok(())
    }

    fn on_bind(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        LifecycleProbe::bump(&self.probe.counters.binds);
        let drawable = content.downcast_mut::<FixtureDrawable>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "FixtureDrawable",
            },
        )?;
        drawable.bound = true;
        Ok(())
    }

    fn on_unbind(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        LifecycleProbe::bump(&self.probe.counters.unbinds);
        let drawable = content.downcast_mut::<FixtureDrawable>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "FixtureDrawable",
            },
        )?;
        drawable.bound = false;
        Ok(())
    }

    fn on_unmount(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        LifecycleProbe::bump(&self.probe.counters.unmounts);
        let drawable = content.downcast_mut::<FixtureDrawable>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "FixtureDrawable",
            },
        )?;
        drawable.mounted_prop1 = None;
        drawable.bound = false;
        Ok(())
    }

    fn record_event_trigger(
        &mut self,
        container: &mut EventTriggersContainer,
        target: Weak<RefCell<dyn TriggerTarget>>,
    ) {
        let mut trigger = EventTrigger::new(Rc::clone(&self.trigger_key), CLICK_TRIGGER);
        trigger.set_target(target);
        container.record_event_trigger(trigger);
    }

    fn calls_should_update_on_mount(&self) -> bool {
        true
    }

    fn is_pure_render(&self) -> bool {
        true
    }

    // Deliberately narrower than equivalence: only `prop1` forces a remount.
    fn should_update(&self, prev: &dyn Component) -> bool {
        match downcast_component::<FixtureMount>(prev) {
            Some(prev) => self.prop1 != prev.prop1,
            None => true,
        }
    }

    fn implements_accessibility(&self) -> bool {
        true
    }

    fn populate_accessibility_node(&self, node: &mut AccessibilityNode) {
        node.content_description = Some(self.prop3.clone());
        node.class_name = Some("FixtureMount");
        node.clickable = true;
    }
}

impl EventDispatcher for FixtureMount {
    fn dispatch_on_event(&mut self, handler: &EventHandler, event: &mut dyn Any) -> DispatchResult {
        if !self.dispatch_table.contains(handler.id()) {
            return DispatchResult::Unhandled;
        }
        if event.downcast_ref::<FixtureEvent>().is_none() {
            return DispatchResult::Unhandled;
        }
        self.probe.counters.events.borrow_mut().push(handler.id().0);
        DispatchResult::Handled
    }
}

impl TriggerTarget for FixtureMount {
    fn accept_trigger_event(
        &mut self,
        trigger: &EventTrigger,
        _event: &mut dyn Any,
        _params: &[Box<dyn Any>],
    ) -> DispatchResult {
        if trigger.id() != CLICK_TRIGGER {
            return DispatchResult::Unhandled;
        }
        LifecycleProbe::bump(&self.probe.counters.triggers);
        DispatchResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_builder() -> FixtureMountBuilder {
        FixtureMount::builder()
            .prop1(5)
            .prop3("propval")
            .prop4(vec!['a', 'b'])
            .prop5('z')
            .prop6(48)
            .prop7("seven")
            .prop8(20)
    }

    #[test]
    fn builder_reports_every_missing_prop() {
        let err = FixtureMount::builder().prop1(1).prop5('x').build().unwrap_err();
        match err {
            LifecycleError::MissingRequiredProp { component, missing } => {
                assert_eq!(component, "FixtureMount");
                assert_eq!(missing, vec!["prop3", "prop4", "prop6", "prop7", "prop8"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn equivalence_is_reflexive_and_prop_sensitive() {
        let a = full_builder().build().unwrap();
        let b = full_builder().build().unwrap();
        assert!(a.is_equivalent_to(&a as &dyn Component));
        assert!(a.is_equivalent_to(&b as &dyn Component));
        assert!(b.is_equivalent_to(&a as &dyn Component));

        let c = full_builder().prop2(true).build().unwrap();
        assert!(!a.is_equivalent_to(&c as &dyn Component));
    }

    #[test]
    fn shallow_copy_clears_outputs_and_state() {
        let mut original = full_builder().build().unwrap();
        original.measure_output = Some(7);
        original.bounds_output = Some(9);
        original.state.state1 = 42;

        let copy = original.make_shallow_copy();
        let copy = downcast_component::<FixtureMount>(&*copy).unwrap();
        assert_eq!(copy.measure_output, None);
        assert_eq!(copy.bounds_output, None);
        assert_eq!(copy.state.state1, 0);
        assert_eq!(copy.prop1, original.prop1);
    }

    #[test]
    fn dispatch_ids_route_and_unknown_is_noop() {
        let probe = LifecycleProbe::new();
        let mut fixture = full_builder().probe(probe.clone()).build().unwrap();
        let mut event = FixtureEvent { value: 3 };

        let layout = EventHandler::detached(LAYOUT_EVENT_HANDLER, Vec::new());
        let error = EventHandler::detached(ERROR_HANDLER, Vec::new());
        let unknown = EventHandler::detached(HandlerId(0), Vec::new());

        assert_eq!(
            fixture.dispatch_on_event(&layout, &mut event),
            DispatchResult::Handled
        );
        assert_eq!(
            fixture.dispatch_on_event(&error, &mut event),
            DispatchResult::Handled
        );
        assert_eq!(
            fixture.dispatch_on_event(&unknown, &mut event),
            DispatchResult::Unhandled
        );
        assert_eq!(probe.events(), vec![1_328_162_206, -1_048_037_474]);
    }

    #[test]
    fn build_registers_both_dispatch_ids() {
        let fixture = full_builder().build().unwrap();
        assert_eq!(fixture.dispatch_table.len(), 2);
        assert_eq!(
            fixture.dispatch_table.name_of(LAYOUT_EVENT_HANDLER),
            Some("on_layout_output")
        );
        assert_eq!(
            fixture.dispatch_table.name_of(ERROR_HANDLER),
            Some("on_error")
        );
    }

    #[test]
    fn tree_prop_round_trips_through_children() {
        let scope = Rc::new(mica_core::TreeScope::new());
        let ctx = mica_core::ComponentContext::new(scope);
        let parent = full_builder().prop6(77).build().unwrap();
        let published = parent.tree_props_for_children(&ctx, &TreeProps::new());

        let mut child = full_builder().build().unwrap();
        child.populate_tree_props(&published);
        assert_eq!(child.received_tree_prop(), Some(77));
    }

    #[test]
    fn unmount_leaves_content_inert() {
        let scope = Rc::new(mica_core::TreeScope::new());
        let ctx = mica_core::ComponentContext::new(scope);
        let mut fixture = full_builder().build().unwrap();
        let mut content = fixture.on_create_mount_content(&ctx);

        fixture.on_mount(&ctx, &mut content).unwrap();
        fixture.on_bind(&ctx, &mut content).unwrap();
        fixture.on_unbind(&ctx, &mut content).unwrap();
        fixture.on_unmount(&ctx, &mut content).unwrap();

        let drawable = content.downcast_ref::<FixtureDrawable>().unwrap();
        assert_eq!(drawable.mounted_prop1, None);
        assert!(!drawable.bound);
    }
}
