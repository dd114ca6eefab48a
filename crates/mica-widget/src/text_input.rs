//! Editable text component.
//!
//! `TextInput` mounts a host text surface, mirrors the latest typed text
//! into component state, and exposes a focus trigger. The typed text lives
//! in state so a re-render with unchanged props does not wipe what the
//! user entered.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use mica_core::{
    downcast_component, AttrId, Component, ComponentContext, ComponentId, DispatchResult,
    DispatchTable, EventDispatcher, EventHandler, EventPool, EventTrigger,
    EventTriggersContainer, HandlerId, LifecycleError, MountContent, MountType, Result, Size,
    SizeConstraints, StateContainer, TriggerId, TriggerTarget,
};

use crate::text_view::{TextViewContent, TextViewFactory};

/// Dispatch id for [`TextChangedEvent`].
pub const TEXT_CHANGED_HANDLER: HandlerId = HandlerId(322_437_726);

/// Trigger id for the focus request.
pub const REQUEST_FOCUS_TRIGGER: TriggerId = TriggerId(-1_151_482_200);

/// Theme attribute carrying the default text.
pub const ATTR_TEXT: AttrId = AttrId(1);

/// Theme attribute carrying the default text size in pixels.
pub const ATTR_TEXT_SIZE: AttrId = AttrId(2);

const DEFAULT_TEXT_SIZE_PX: i32 = 13;

/// Payload dispatched whenever the mounted surface's text changes.
///
/// Instances come out of an [`EventPool`] and are cleared after dispatch,
/// so handlers must copy the text out rather than hold the payload.
#[derive(Default)]
pub struct TextChangedEvent {
    pub text: String,
}

/// Pools the payload around a single change dispatch.
pub fn dispatch_text_changed(
    pool: &mut EventPool<TextChangedEvent>,
    handler: &EventHandler,
    text: &str,
) -> DispatchResult {
    let mut event = pool.acquire();
    event.text.clear();
    event.text.push_str(text);
    let result = handler.dispatch(&mut event);
    event.text.clear();
    pool.release(event);
    result
}

/// Measurement request handed to the host's measure backend.
pub struct TextMetricsRequest {
    pub text: String,
    pub text_size_px: i32,
}

#[derive(Default)]
pub struct TextInputState {
    pub input: String,
}

impl StateContainer for TextInputState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct TextInput {
    id: ComponentId,
    trigger_key: Rc<str>,
    factory: Rc<dyn TextViewFactory>,
    text: Option<String>,
    hint: String,
    text_size_px: i32,
    text_size_explicit: bool,
    editable: bool,
    text_changed: Option<EventHandler>,
    dispatch_table: Rc<DispatchTable>,
    state: TextInputState,
    // Mount-scoped context; present only between mount and unmount.
    scoped_ctx: Option<ComponentContext>,
    focus_pending: bool,
}

impl TextInput {
    // Declares the ids this type dispatches; a collision surfaces at build.
    fn dispatch_table() -> Result<DispatchTable> {
        let mut table = DispatchTable::new();
        table.register(TEXT_CHANGED_HANDLER, "on_text_changed")?;
        Ok(table)
    }

    pub fn builder(factory: Rc<dyn TextViewFactory>) -> TextInputBuilder {
        TextInputBuilder {
            trigger_key: None,
            factory: Some(factory),
            text: None,
            hint: None,
            text_size_px: None,
            editable: None,
            text_changed: None,
        }
    }

    /// The text the surface should currently show: typed input once any
    /// exists, the text prop otherwise.
    fn display_text(&self) -> &str {
        if self.state.input.is_empty() {
            self.text.as_deref().unwrap_or("")
        } else {
            &self.state.input
        }
    }
}

pub struct TextInputBuilder {
    trigger_key: Option<Rc<str>>,
    factory: Option<Rc<dyn TextViewFactory>>,
    text: Option<String>,
    hint: Option<String>,
    text_size_px: Option<i32>,
    editable: Option<bool>,
    text_changed: Option<EventHandler>,
}

impl TextInputBuilder {
    pub fn key(mut self, key: impl Into<Rc<str>>) -> Self {
        self.trigger_key = Some(key.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn text_size_px(mut self, px: i32) -> Self {
        self.text_size_px = Some(px);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn text_changed(mut self, handler: EventHandler) -> Self {
        self.text_changed = Some(handler);
        self
    }

    pub fn build(self) -> Result<TextInput> {
        let factory = self.factory.ok_or(LifecycleError::MissingRequiredProp {
            component: "TextInput",
            missing: vec!["factory"],
        })?;
        Ok(TextInput {
            id: ComponentId::next(),
            trigger_key: self.trigger_key.unwrap_or_else(|| Rc::from("text_input")),
            factory,
            text: self.text,
            hint: self.hint.unwrap_or_default(),
            text_size_px: self.text_size_px.unwrap_or(DEFAULT_TEXT_SIZE_PX),
            text_size_explicit: self.text_size_px.is_some(),
            editable: self.editable.unwrap_or(true),
            text_changed: self.text_changed,
            dispatch_table: Rc::new(TextInput::dispatch_table()?),
            state: TextInputState::default(),
            scoped_ctx: None,
            focus_pending: false,
        })
    }
}

impl Component for TextInput {
    fn type_name(&self) -> &'static str {
        "TextInput"
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

    // Event handler props are identity, not content; they stay out of the
    // equivalence check so a freshly captured closure does not defeat skips.
    fn is_equivalent_to(&self, other: &dyn Component) -> bool {
        let Some(other) = downcast_component::<TextInput>(other) else {
            return false;
        };
        self.trigger_key == other.trigger_key
            && Rc::ptr_eq(&self.factory, &other.factory)
            && self.text == other.text
            && self.hint == other.hint
            && self.text_size_px == other.text_size_px
            && self.editable == other.editable
            && self.state.input == other.state.input
    }

    fn make_shallow_copy(&self) -> Box<dyn Component> {
        Box::new(TextInput {
            id: self.id,
            trigger_key: Rc::clone(&self.trigger_key),
            factory: Rc::clone(&self.factory),
            text: self.text.clone(),
            hint: self.hint.clone(),
            text_size_px: self.text_size_px,
            text_size_explicit: self.text_size_explicit,
            editable: self.editable,
            text_changed: self.text_changed.clone(),
            dispatch_table: Rc::clone(&self.dispatch_table),
            state: TextInputState::default(),
            scoped_ctx: None,
            focus_pending: false,
        })
    }

    // Theme values fill only the props the caller left unset. Each resolved
    // value rides a pooled output slot so resolution and assignment stay
    // separate steps.
    fn on_load_style(&mut self, ctx: &ComponentContext) -> Result<()> {
        if self.text.is_none() {
            if let Some(text) = ctx
                .resolve_attr(ATTR_TEXT)
                .and_then(|v| v.as_text().map(str::to_owned))
            {
                let mut slot = ctx.acquire_output();
                slot.set(text)?;
                self.text = slot.take::<String>();
                ctx.release_output(slot);
            }
        }
        if !self.text_size_explicit {
            if let Some(px) = ctx.resolve_attr(ATTR_TEXT_SIZE).and_then(|v| v.as_px()) {
                let mut slot = ctx.acquire_output();
                slot.set(px)?;
                if let Some(px) = slot.take::<i32>() {
                    self.text_size_px = px;
                }
                ctx.release_output(slot);
            }
        }
        Ok(())
    }

    fn has_state(&self) -> bool {
        true
    }

    fn on_create_initial_state(&self, _ctx: &ComponentContext) -> Option<Box<dyn StateContainer>> {
        Some(Box::new(TextInputState {
            input: self.text.clone().unwrap_or_default(),
        }))
    }

    fn transfer_state(&mut self, prev: &dyn StateContainer) {
        if let Some(prev) = prev.as_any().downcast_ref::<TextInputState>() {
            self.state.input = prev.input.clone();
        }
    }

    fn can_measure(&self) -> bool {
        true
    }

    fn on_measure(&mut self, ctx: &ComponentContext, constraints: SizeConstraints) -> Result<Size> {
        let request = TextMetricsRequest {
            text: self.display_text().to_owned(),
            text_size_px: self.text_size_px,
        };
        if let Some(backend) = ctx.measure_backend() {
            return Ok(backend.measure(constraints, &request));
        }
        // Crude monospace estimate when the host provides no backend.
        let width = request.text.chars().count() as i32 * (self.text_size_px / 2).max(1);
        let height = self.text_size_px + 4;
        Ok(constraints.constrain(Size::new(width, height)))
    }

    fn mount_type(&self) -> MountType {
        MountType::View
    }

    fn on_create_mount_content(&self, _ctx: &ComponentContext) -> MountContent {
        Box::new(TextViewContent::new(&self.factory))
    }

    fn pool_size(&self) -> usize {
        3
    }

    fn can_preallocate(&self) -> bool {
        true
    }

    fn on_mount(&mut self, ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        let content = content.downcast_mut::<TextViewContent>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "TextViewContent",
            },
        )?;
        let view = &mut content.view;
        // Re-setting identical text would reset the surface's caret.
        let display = if self.state.input.is_empty() {
            self.text.clone().unwrap_or_default()
        } else {
            self.state.input.clone()
        };
        if view.text() != display {
            view.set_text(&display);
        }
        view.set_hint(&self.hint);
        view.set_text_size_px(self.text_size_px);
        view.set_editable(self.editable);
        self.scoped_ctx = Some(ctx.clone());
        Ok(())
    }

    fn on_bind(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        let content = content.downcast_mut::<TextViewContent>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "TextViewContent",
            },
        )?;
        content
            .view
            .set_text_changed_listener(self.text_changed.clone());
        if self.focus_pending {
            self.focus_pending = false;
            if !content.view.request_focus() {
                log::debug!("text input `{}` declined focus", self.trigger_key);
            }
        }
        Ok(())
    }

    fn on_unbind(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        let content = content.downcast_mut::<TextViewContent>().ok_or(
            LifecycleError::ContentTypeMismatch {
                expected: "TextViewContent",
            },
        )?;
        content.view.set_text_changed_listener(None);
        Ok(())
    }

    fn on_unmount(&mut self, _ctx: &ComponentContext, content: &mut MountContent) -> Result<()> {
        if let Some(content) = content.downcast_mut::<TextViewContent>() {
            content.view.clear_focus();
        }
        self.scoped_ctx = None;
        Ok(())
    }

    fn record_event_trigger(
        &mut self,
        container: &mut EventTriggersContainer,
        target: Weak<RefCell<dyn TriggerTarget>>,
    ) {
        let mut trigger = EventTrigger::new(Rc::clone(&self.trigger_key), REQUEST_FOCUS_TRIGGER);
        trigger.set_target(target);
        container.record_event_trigger(trigger);
    }
}

impl EventDispatcher for TextInput {
    fn dispatch_on_event(&mut self, handler: &EventHandler, event: &mut dyn Any) -> DispatchResult {
        if !self.dispatch_table.contains(handler.id()) {
            return DispatchResult::Unhandled;
        }
        let Some(changed) = event.downcast_ref::<TextChangedEvent>() else {
            return DispatchResult::Unhandled;
        };
        // Mirror the surface's text into state without scheduling a render;
        // the surface already shows it.
        let text = changed.text.clone();
        self.state.input = text.clone();
        if let Some(ctx) = &self.scoped_ctx {
            ctx.update_state_lazy(move |container| {
                if let Some(state) = container.as_any_mut().downcast_mut::<TextInputState>() {
                    state.input = text;
                }
            });
        }
        DispatchResult::Handled
    }
}

impl TriggerTarget for TextInput {
    fn accept_trigger_event(
        &mut self,
        trigger: &EventTrigger,
        _event: &mut dyn Any,
        _params: &[Box<dyn Any>],
    ) -> DispatchResult {
        if trigger.id() != REQUEST_FOCUS_TRIGGER {
            return DispatchResult::Unhandled;
        }
        // The mounted surface is owned by the host; the request is applied
        // at the next bind.
        self.focus_pending = true;
        DispatchResult::Handled
    }
}
