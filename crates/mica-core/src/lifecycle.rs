//! Lifecycle orchestration.
//!
//! [`MountHost`] drives one component through the fixed phase order on behalf
//! of the tree driver:
//!
//! ```text
//! Created -> StateInitialized -> {Measured <-> BoundsDefined}
//!         -> Mounted <-> Bound -> Unbound -> Unmounted -> (Removed | re-measure)
//! ```
//!
//! Render computation (measure/bounds/equivalence) is pure per component and
//! may run across independent subtrees concurrently at the tree level; the
//! mount phases require exclusive sequential access to the platform object
//! and are confined to the UI-owning thread. The `Rc`/`RefCell` types here
//! make that structural rather than advisory.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::component::{AccessibilityNode, Component, MountType};
use crate::context::{ComponentContext, TreeScope};
use crate::error::{LifecycleError, Result};
use crate::events::{EventDispatcher, EventHandler, HandlerId};
use crate::geometry::{Rect, Size, SizeConstraints};
use crate::pool::MountContent;
use crate::state::GlobalKey;
use crate::tree_props::TreeProps;
use crate::trigger::{EventTriggersContainer, TriggerId, TriggerTarget};

/// Where one component instance stands in its tree lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Created,
    StateInitialized,
    Measured,
    BoundsDefined,
    Mounted,
    Bound,
    Unbound,
    Unmounted,
    Removed,
}

impl LifecyclePhase {
    pub fn name(self) -> &'static str {
        match self {
            LifecyclePhase::Created => "created",
            LifecyclePhase::StateInitialized => "state_initialized",
            LifecyclePhase::Measured => "measured",
            LifecyclePhase::BoundsDefined => "bounds_defined",
            LifecyclePhase::Mounted => "mounted",
            LifecyclePhase::Bound => "bound",
            LifecyclePhase::Unbound => "unbound",
            LifecyclePhase::Unmounted => "unmounted",
            LifecyclePhase::Removed => "removed",
        }
    }
}

type SharedNode = Rc<RefCell<Box<dyn Component>>>;

// The boxed node unsizes to either target trait behind the cell. The
// intermediate binding fixes the unsized type on an already typed value;
// annotating the `downgrade` call itself pins its type parameter to the
// trait object and fails to unify with the argument.

fn trigger_target(node: &SharedNode) -> Weak<RefCell<dyn TriggerTarget>> {
    let strong = Rc::clone(node);
    let strong: Rc<RefCell<dyn TriggerTarget>> = strong;
    Rc::downgrade(&strong)
}

fn dispatch_target(node: &SharedNode) -> Weak<RefCell<dyn EventDispatcher>> {
    let strong = Rc::clone(node);
    let strong: Rc<RefCell<dyn EventDispatcher>> = strong;
    Rc::downgrade(&strong)
}

/// One in-flight render pass. Superseded passes are rejected at commit; their
/// results never reach the mounted content.
pub struct RenderPass {
    generation: u64,
    key: GlobalKey,
    node: SharedNode,
    ctx: ComponentContext,
    equivalent: bool,
    measured: Option<Size>,
    bounds: Option<Rect>,
}

impl RenderPass {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when the new node is structurally equivalent to the committed
    /// one, so measure/bounds/mount may be skipped.
    pub fn is_equivalent(&self) -> bool {
        self.equivalent
    }

    pub fn measured(&self) -> Option<Size> {
        self.measured
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

struct Committed {
    node: SharedNode,
    key: GlobalKey,
    ctx: ComponentContext,
    phase: LifecyclePhase,
    measured: Option<Size>,
    bounds: Option<Rect>,
    content: Option<MountContent>,
    // The (key, id) pairs this node published at mount. Trigger keys are
    // caller-chosen and may differ from the global key, so unmount must
    // unpublish exactly these.
    trigger_keys: Vec<(Rc<str>, TriggerId)>,
}

/// Drives one component's lifecycle against a shared [`TreeScope`].
pub struct MountHost {
    scope: Rc<TreeScope>,
    committed: Option<Committed>,
}

impl MountHost {
    pub fn new(scope: Rc<TreeScope>) -> Self {
        Self {
            scope,
            committed: None,
        }
    }

    pub fn scope(&self) -> &Rc<TreeScope> {
        &self.scope
    }

    /// Applies all pending state updates in submission order. Called at the
    /// head of every render pass; also callable by the driver on its own
    /// schedule for async updates.
    pub fn flush_updates(&self) {
        let pending = self.scope.update_queue().take_pending();
        if !pending.is_empty() {
            self.scope
                .with_state_mut(|state| state.apply_updates(&pending));
        }
    }

    /// Starts a render pass for `root`, superseding any in-flight pass.
    ///
    /// Order within the pass head: pending updates flush, tree props
    /// populate, initial state seeds (first appearance only), previous state
    /// transfers in, style loads, then the equivalence check against the
    /// committed node.
    pub fn begin_pass(
        &self,
        mut root: Box<dyn Component>,
        key: GlobalKey,
        tree_props: TreeProps,
    ) -> Result<RenderPass> {
        let generation = self.scope.advance_generation();
        self.flush_updates();

        let ctx = ComponentContext::new(Rc::clone(&self.scope))
            .with_component_scope(key.clone())
            .with_tree_props(tree_props.clone());

        root.populate_tree_props(&tree_props);

        if root.has_state() {
            let needs_init = self.scope.with_state(|state| !state.contains(&key));
            if needs_init {
                if let Some(container) = root.on_create_initial_state(&ctx) {
                    self.scope
                        .with_state_mut(|state| state.ensure_initial(&key, || container));
                }
            }
            self.scope.with_state(|state| {
                if let Some(prev) = state.container(&key) {
                    root.transfer_state(prev);
                }
            });
        }

        root.on_load_style(&ctx)?;

        let equivalent = match &self.committed {
            Some(committed) if committed.key == key => {
                let prev = committed.node.borrow();
                root.is_equivalent_to(&**prev)
            }
            _ => false,
        };

        log::trace!(
            "render pass {generation} for {} ({}equivalent)",
            root.type_name(),
            if equivalent { "" } else { "not " }
        );

        Ok(RenderPass {
            generation,
            key,
            node: Rc::new(RefCell::new(root)),
            ctx,
            equivalent,
            measured: None,
            bounds: None,
        })
    }

    /// Runs the measure phase. For an equivalent node the committed measure
    /// output is reused without re-invoking the callback.
    pub fn measure(&self, pass: &mut RenderPass, constraints: SizeConstraints) -> Result<Size> {
        if pass.equivalent {
            if let Some(prior) = self.committed.as_ref().and_then(|c| c.measured) {
                pass.measured = Some(prior);
                return Ok(prior);
            }
        }
        let size = pass.node.borrow_mut().on_measure(&pass.ctx, constraints)?;
        pass.measured = Some(size);
        Ok(size)
    }

    /// Assigns finalized bounds. Measure is a hard precondition; components
    /// declaring `is_mount_size_dependent` get their `on_bounds_defined`
    /// callback (skipped for equivalent nodes, whose outputs are reused).
    pub fn bounds_defined(&self, pass: &mut RenderPass, bounds: Rect) -> Result<()> {
        if pass.measured.is_none() {
            return Err(LifecycleError::PhaseOutOfOrder {
                attempted: LifecyclePhase::BoundsDefined.name(),
                current: LifecyclePhase::Created.name(),
            });
        }
        pass.bounds = Some(bounds);
        let mut node = pass.node.borrow_mut();
        if node.is_mount_size_dependent() && !pass.equivalent {
            node.on_bounds_defined(&pass.ctx, bounds)?;
        }
        Ok(())
    }

    /// Commits the pass: decides between skip, content-preserving node swap,
    /// and full remount, then runs the mount phases as needed.
    ///
    /// A pass whose generation was superseded is rejected and discarded; its
    /// measure/bounds results never reach the mounted content.
    pub fn commit(&mut self, pass: RenderPass) -> Result<()> {
        if pass.generation != self.scope.current_generation() {
            log::debug!("discarding superseded render pass {}", pass.generation);
            return Err(LifecycleError::SupersededRender {
                generation: pass.generation,
            });
        }

        match self.committed.take() {
            None => self.mount_fresh(pass),
            Some(committed) => {
                if pass.equivalent {
                    // Structural equivalence: keep the mounted node and its
                    // content untouched.
                    self.committed = Some(committed);
                    return Ok(());
                }

                let skip_remount = {
                    let next = pass.node.borrow();
                    // Fast path only when the type opts into both flags;
                    // equivalence above remains the primary skip test.
                    if next.calls_should_update_on_mount() && next.is_pure_render() {
                        let prev = committed.node.borrow();
                        !next.should_update(&**prev)
                    } else {
                        false
                    }
                };

                if skip_remount && committed.content.is_some() {
                    // Props changed but the diff vetoed the re-mount: adopt
                    // the new node while the old content stays bound. The
                    // published triggers must follow the live node.
                    self.unpublish_triggers(&committed.trigger_keys);
                    let trigger_keys = self.publish_triggers(&pass.node);
                    self.committed = Some(Committed {
                        node: pass.node,
                        key: pass.key,
                        ctx: pass.ctx,
                        phase: committed.phase,
                        measured: pass.measured.or(committed.measured),
                        bounds: pass.bounds.or(committed.bounds),
                        content: committed.content,
                        trigger_keys,
                    });
                    return Ok(());
                }

                self.committed = Some(committed);
                self.unmount()?;
                self.committed = None;
                self.mount_fresh(pass)
            }
        }
    }

    fn mount_fresh(&mut self, pass: RenderPass) -> Result<()> {
        let RenderPass {
            key,
            node,
            ctx,
            measured,
            bounds,
            ..
        } = pass;

        let mount_type = node.borrow().mount_type();
        if mount_type == MountType::None {
            // Nothing to mount; the pass still commits its layout results.
            self.committed = Some(Committed {
                node,
                key,
                ctx,
                phase: LifecyclePhase::StateInitialized,
                measured,
                bounds,
                content: None,
                trigger_keys: Vec::new(),
            });
            return Ok(());
        }

        let (type_name, pool_size) = {
            let node = node.borrow();
            (node.type_name(), node.pool_size())
        };
        self.scope
            .with_mount_pool(|pool| pool.register(type_name, pool_size));

        let recycled = self.scope.with_mount_pool(|pool| pool.acquire(type_name));
        let mut content = match recycled {
            Some(content) => content,
            None => node.borrow().on_create_mount_content(&ctx),
        };

        node.borrow_mut().on_mount(&ctx, &mut content)?;
        let trigger_keys = self.publish_triggers(&node);
        node.borrow_mut().on_bind(&ctx, &mut content)?;

        self.committed = Some(Committed {
            node,
            key,
            ctx,
            phase: LifecyclePhase::Bound,
            measured,
            bounds,
            content: Some(content),
            trigger_keys,
        });
        Ok(())
    }

    /// Records the node's triggers into a scratch container first so the
    /// exact published `(key, id)` pairs are known. Trigger keys are
    /// caller-chosen and may differ from the global key.
    fn publish_triggers(&self, node: &SharedNode) -> Vec<(Rc<str>, TriggerId)> {
        let mut scratch = EventTriggersContainer::new();
        node.borrow_mut()
            .record_event_trigger(&mut scratch, trigger_target(node));
        let published = scratch.drain();
        let keys: Vec<(Rc<str>, TriggerId)> = published
            .iter()
            .map(|trigger| (trigger.shared_key(), trigger.id()))
            .collect();
        self.scope.with_triggers_mut(|triggers| {
            for trigger in published {
                triggers.record_event_trigger(trigger);
            }
        });
        keys
    }

    fn unpublish_triggers(&self, keys: &[(Rc<str>, TriggerId)]) {
        self.scope.with_triggers_mut(|triggers| {
            for (key, id) in keys {
                triggers.remove(key, *id);
            }
        });
    }

    /// Warms the mount content pool for a type that declares
    /// `can_preallocate`. An optimization hint only; correctness never
    /// depends on it.
    pub fn preallocate_mount_content(&self, component: &dyn Component) {
        if !component.can_preallocate() || component.mount_type() == MountType::None {
            return;
        }
        let ctx = ComponentContext::new(Rc::clone(&self.scope));
        self.scope.with_mount_pool(|pool| {
            pool.register(component.type_name(), component.pool_size());
            pool.preallocate(component.type_name(), || {
                component.on_create_mount_content(&ctx)
            });
        });
    }

    /// Re-binds mounted content after an `unbind` (content scrolling back on
    /// screen). No-op when already bound or nothing is mounted.
    pub fn bind(&mut self) -> Result<()> {
        if let Some(committed) = &mut self.committed {
            if committed.phase == LifecyclePhase::Bound {
                return Ok(());
            }
            if let Some(content) = &mut committed.content {
                committed
                    .node
                    .borrow_mut()
                    .on_bind(&committed.ctx, content)?;
                committed.phase = LifecyclePhase::Bound;
            }
        }
        Ok(())
    }

    /// Detaches dynamic wiring while keeping the content mounted. No-op when
    /// not bound.
    pub fn unbind(&mut self) -> Result<()> {
        if let Some(committed) = &mut self.committed {
            if committed.phase != LifecyclePhase::Bound {
                return Ok(());
            }
            if let Some(content) = &mut committed.content {
                committed
                    .node
                    .borrow_mut()
                    .on_unbind(&committed.ctx, content)?;
                committed.phase = LifecyclePhase::Unbound;
            }
        }
        Ok(())
    }

    /// Tears the mounted content down and returns it to the pool. Idempotent
    /// and safe to call on a never-mounted host.
    pub fn unmount(&mut self) -> Result<()> {
        let Some(committed) = &mut self.committed else {
            return Ok(());
        };
        if committed.content.is_none() {
            return Ok(());
        }

        if committed.phase == LifecyclePhase::Bound {
            self.unbind()?;
        }

        let committed = self.committed.as_mut().expect("checked above");
        if let Some(mut content) = committed.content.take() {
            let type_name = {
                let mut node = committed.node.borrow_mut();
                node.on_unmount(&committed.ctx, &mut content)?;
                node.type_name()
            };
            let trigger_keys = std::mem::take(&mut committed.trigger_keys);
            self.scope.with_triggers_mut(|triggers| {
                for (key, id) in &trigger_keys {
                    triggers.remove(key, *id);
                }
            });
            self.scope
                .with_mount_pool(|pool| pool.release(type_name, content));
            committed.phase = LifecyclePhase::Unmounted;
        }
        Ok(())
    }

    /// Removes the component from the tree: unmounts and destroys its state
    /// container.
    pub fn detach(&mut self) -> Result<()> {
        self.unmount()?;
        if let Some(committed) = self.committed.take() {
            self.scope
                .with_state_mut(|state| state.remove(&committed.key));
        }
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.committed
            .as_ref()
            .is_some_and(|c| c.content.is_some())
    }

    pub fn phase(&self) -> Option<LifecyclePhase> {
        self.committed.as_ref().map(|c| c.phase)
    }

    pub fn committed_size(&self) -> Option<Size> {
        self.committed.as_ref().and_then(|c| c.measured)
    }

    pub fn committed_bounds(&self) -> Option<Rect> {
        self.committed.as_ref().and_then(|c| c.bounds)
    }

    /// Runs `f` against the mounted platform object, if any.
    pub fn with_mounted_content<R>(&mut self, f: impl FnOnce(&mut MountContent) -> R) -> Option<R> {
        self.committed
            .as_mut()
            .and_then(|c| c.content.as_mut())
            .map(f)
    }

    /// Runs `f` against the committed component node, if any.
    pub fn with_committed_node<R>(&self, f: impl FnOnce(&dyn Component) -> R) -> Option<R> {
        self.committed.as_ref().map(|c| {
            let node = c.node.borrow();
            f(&**node)
        })
    }

    /// Creates an event handler whose target is the committed node.
    pub fn event_handler(&self, id: HandlerId, params: Vec<Box<dyn std::any::Any>>) -> Option<EventHandler> {
        self.committed
            .as_ref()
            .map(|c| EventHandler::new(id, params, dispatch_target(&c.node)))
    }

    /// Delegates to the committed node's accessibility hooks. Returns `false`
    /// when nothing is committed or the type opts out.
    pub fn populate_accessibility(&self, out: &mut AccessibilityNode) -> bool {
        self.with_committed_node(|node| {
            if node.implements_accessibility() {
                node.populate_accessibility_node(out);
                true
            } else {
                false
            }
        })
        .unwrap_or(false)
    }
}
