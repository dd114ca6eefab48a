//! End-to-end lifecycle coverage driving `FixtureMount` through a
//! `MountHost`.

use std::rc::Rc;

use mica_core::{
    ComponentContext, DispatchResult, EventPool, GlobalKey, LifecycleError, LifecyclePhase,
    MountHost, Rect, Size, SizeConstraints, StateContainer, TreeProps, TreeScope,
};
use mica_testing::fixture::{
    dispatch_fixture_event, FixtureDrawable, FixtureEvent, FixtureMount, FixtureMountBuilder,
    FixtureState, LifecycleProbe, CLICK_TRIGGER, LAYOUT_EVENT_HANDLER,
};

fn builder(probe: &LifecycleProbe) -> FixtureMountBuilder {
    FixtureMount::builder()
        .probe(probe.clone())
        .prop1(5)
        .prop2(true)
        .prop3("propval")
        .prop4(vec!['p', '4'])
        .prop5('5')
        .prop6(48)
        .prop7("seven")
        .prop8(20)
}

fn key() -> GlobalKey {
    GlobalKey::new("fixture")
}

#[test]
fn full_lifecycle_mounts_and_binds() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let root = Box::new(builder(&probe).build().unwrap());
    let mut pass = host.begin_pass(root, key(), TreeProps::new()).unwrap();
    assert!(!pass.is_equivalent());

    let size = host
        .measure(&mut pass, SizeConstraints::loose(200, 200))
        .unwrap();
    assert_eq!(size, Size::new(50, 10));
    host.bounds_defined(&mut pass, Rect::new(0, 0, 50, 10)).unwrap();
    host.commit(pass).unwrap();

    assert!(host.is_mounted());
    assert_eq!(host.phase(), Some(LifecyclePhase::Bound));
    assert_eq!(host.committed_size(), Some(Size::new(50, 10)));
    assert_eq!(probe.measures(), 1);
    assert_eq!(probe.bounds(), 1);
    assert_eq!(probe.mounts(), 1);
    assert_eq!(probe.binds(), 1);

    // Inter-stage outputs landed on the committed node.
    let outputs = host
        .with_committed_node(|node| {
            let fixture = node.as_any().downcast_ref::<FixtureMount>().unwrap();
            (fixture.measure_output(), fixture.bounds_output())
        })
        .unwrap();
    assert_eq!(outputs.0, Some((50u64 << 32) | 10));
    assert_eq!(outputs.1, Some(500));

    // Each producing phase returned its ferrying slot to the pool.
    let ctx = ComponentContext::new(Rc::clone(&scope));
    assert_eq!(ctx.pooled_outputs(), 1);

    // The content records the mount.
    let mounted_prop1 = host
        .with_mounted_content(|content| {
            content.downcast_ref::<FixtureDrawable>().unwrap().mounted_prop1
        })
        .unwrap();
    assert_eq!(mounted_prop1, Some(5));
}

#[test]
fn bounds_before_measure_is_rejected() {
    let scope = Rc::new(TreeScope::new());
    let host = MountHost::new(scope);
    let probe = LifecycleProbe::new();

    let root = Box::new(builder(&probe).build().unwrap());
    let mut pass = host.begin_pass(root, key(), TreeProps::new()).unwrap();
    let err = host
        .bounds_defined(&mut pass, Rect::new(0, 0, 10, 10))
        .unwrap_err();
    assert!(matches!(err, LifecycleError::PhaseOutOfOrder { .. }));
    assert_eq!(probe.bounds(), 0);
}

#[test]
fn equivalent_pass_skips_measure_and_mount() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.bounds_defined(&mut pass, Rect::new(0, 0, 50, 10)).unwrap();
    host.commit(pass).unwrap();

    // Same props, fresh instance: equivalence short-circuits the phases.
    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    assert!(pass.is_equivalent());
    let size = host
        .measure(&mut pass, SizeConstraints::loose(200, 200))
        .unwrap();
    assert_eq!(size, Size::new(50, 10));
    host.bounds_defined(&mut pass, Rect::new(0, 0, 50, 10)).unwrap();
    host.commit(pass).unwrap();

    assert_eq!(probe.measures(), 1);
    assert_eq!(probe.bounds(), 1);
    assert_eq!(probe.mounts(), 1);
    assert_eq!(probe.unmounts(), 0);
}

#[test]
fn state_initializes_once_across_renders() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    for _ in 0..3 {
        let mut pass = host
            .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
            .unwrap();
        host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
        host.commit(pass).unwrap();
    }
    assert_eq!(probe.initial_states(), 1);
}

#[test]
fn sync_update_transfers_into_next_pass_without_reinit() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();
    assert_eq!(
        host.with_committed_node(|node| node
            .as_any()
            .downcast_ref::<FixtureMount>()
            .unwrap()
            .state1()),
        Some(0)
    );

    let ctx = ComponentContext::new(Rc::clone(&scope)).with_component_scope(key());
    ctx.update_state_sync(|container: &mut dyn StateContainer| {
        if let Some(state) = container.as_any_mut().downcast_mut::<FixtureState>() {
            state.state1 = 42;
        }
    });

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    assert_eq!(
        host.with_committed_node(|node| node
            .as_any()
            .downcast_ref::<FixtureMount>()
            .unwrap()
            .state1()),
        Some(42)
    );
    assert_eq!(probe.initial_states(), 1);
}

#[test]
fn shallow_copy_converges_after_state_transfer() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    let ctx = ComponentContext::new(Rc::clone(&scope)).with_component_scope(key());
    ctx.update_state_sync(|container: &mut dyn StateContainer| {
        if let Some(state) = container.as_any_mut().downcast_mut::<FixtureState>() {
            state.state1 = 7;
        }
    });
    host.flush_updates();

    let mut copy = host
        .with_committed_node(|node| node.make_shallow_copy())
        .unwrap();
    // Fresh copy starts from empty state and converges through transfer.
    assert_eq!(
        copy.as_any().downcast_ref::<FixtureMount>().unwrap().state1(),
        0
    );
    scope.with_state(|state| {
        copy.transfer_state(state.container(&key()).unwrap());
    });
    assert_eq!(
        copy.as_any().downcast_ref::<FixtureMount>().unwrap().state1(),
        7
    );
}

#[test]
fn superseded_pass_never_commits() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut stale = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut stale, SizeConstraints::loose(200, 200)).unwrap();

    let mut fresh = host
        .begin_pass(
            Box::new(builder(&probe).prop1(9).build().unwrap()),
            key(),
            TreeProps::new(),
        )
        .unwrap();

    let err = host.commit(stale).unwrap_err();
    assert!(matches!(err, LifecycleError::SupersededRender { .. }));
    assert!(!host.is_mounted());
    assert_eq!(probe.mounts(), 0);

    host.measure(&mut fresh, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(fresh).unwrap();
    assert!(host.is_mounted());
    assert_eq!(
        host.with_committed_node(|node| node
            .as_any()
            .downcast_ref::<FixtureMount>()
            .unwrap()
            .prop1()),
        Some(9)
    );
}

#[test]
fn pure_render_diff_preserves_mounted_content() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    // prop3 changed, prop1 did not: not equivalent, but the diff vetoes the
    // remount and the content stays bound.
    let mut pass = host
        .begin_pass(
            Box::new(builder(&probe).prop3("changed").build().unwrap()),
            key(),
            TreeProps::new(),
        )
        .unwrap();
    assert!(!pass.is_equivalent());
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();
    assert_eq!(probe.mounts(), 1);
    assert_eq!(probe.unmounts(), 0);

    // prop1 changed: full remount.
    let mut pass = host
        .begin_pass(
            Box::new(builder(&probe).prop1(6).build().unwrap()),
            key(),
            TreeProps::new(),
        )
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();
    assert_eq!(probe.unmounts(), 1);
    assert_eq!(probe.mounts(), 2);
}

#[test]
fn unmount_recycles_content_through_the_pool() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    host.unmount().unwrap();
    assert_eq!(probe.unbinds(), 1);
    assert_eq!(probe.unmounts(), 1);
    assert_eq!(
        scope.with_mount_pool(|pool| pool.pooled("FixtureMount")),
        1
    );

    // Remount draws the recycled object back out.
    let mut pass = host
        .begin_pass(
            Box::new(builder(&probe).prop1(6).build().unwrap()),
            key(),
            TreeProps::new(),
        )
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();
    assert_eq!(
        scope.with_mount_pool(|pool| pool.pooled("FixtureMount")),
        0
    );
}

#[test]
fn preallocation_warms_the_pool_to_capacity() {
    let scope = Rc::new(TreeScope::new());
    let host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let fixture = builder(&probe).build().unwrap();
    host.preallocate_mount_content(&fixture);
    assert_eq!(
        scope.with_mount_pool(|pool| pool.pooled("FixtureMount")),
        3
    );
}

#[test]
fn triggers_live_only_while_mounted() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    let ctx = ComponentContext::new(Rc::clone(&scope));
    assert_eq!(
        ctx.invoke_trigger("fixture", CLICK_TRIGGER, &mut (), &[]),
        DispatchResult::Handled
    );
    assert_eq!(probe.triggers(), 1);

    host.unmount().unwrap();
    assert_eq!(
        ctx.invoke_trigger("fixture", CLICK_TRIGGER, &mut (), &[]),
        DispatchResult::Unhandled
    );
    assert_eq!(probe.triggers(), 1);
}

#[test]
fn unmount_unpublishes_the_caller_chosen_trigger_key() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    // The trigger key diverges from the global key on purpose.
    let mut pass = host
        .begin_pass(
            Box::new(builder(&probe).key("header").build().unwrap()),
            key(),
            TreeProps::new(),
        )
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    let ctx = ComponentContext::new(Rc::clone(&scope));
    assert_eq!(
        ctx.invoke_trigger("header", CLICK_TRIGGER, &mut (), &[]),
        DispatchResult::Handled
    );
    assert_eq!(
        ctx.invoke_trigger("fixture", CLICK_TRIGGER, &mut (), &[]),
        DispatchResult::Unhandled
    );

    host.unmount().unwrap();
    assert_eq!(
        ctx.invoke_trigger("header", CLICK_TRIGGER, &mut (), &[]),
        DispatchResult::Unhandled
    );
    assert_eq!(probe.triggers(), 1);
}

#[test]
fn host_handlers_route_into_the_committed_node() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();

    let handler = host.event_handler(LAYOUT_EVENT_HANDLER, Vec::new()).unwrap();
    let mut pool = EventPool::<FixtureEvent>::new(4);
    assert_eq!(
        dispatch_fixture_event(&mut pool, &handler, 11),
        DispatchResult::Handled
    );
    assert_eq!(probe.events(), vec![LAYOUT_EVENT_HANDLER.0]);
    assert_eq!(pool.pooled(), 1);
}

#[test]
fn detach_drops_the_state_container() {
    let scope = Rc::new(TreeScope::new());
    let mut host = MountHost::new(Rc::clone(&scope));
    let probe = LifecycleProbe::new();

    let mut pass = host
        .begin_pass(Box::new(builder(&probe).build().unwrap()), key(), TreeProps::new())
        .unwrap();
    host.measure(&mut pass, SizeConstraints::loose(200, 200)).unwrap();
    host.commit(pass).unwrap();
    assert!(scope.with_state(|state| state.contains(&key())));

    host.detach().unwrap();
    assert!(!host.is_mounted());
    assert!(!scope.with_state(|state| state.contains(&key())));
}
