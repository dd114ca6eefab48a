//! Component lifecycle and incremental-update core for Mica.
//!
//! Mica components are immutable-props, possibly-stateful units of UI
//! description. This crate provides the substrate every component type
//! conforms to: equivalence-based skip detection, state containers with a
//! three-mode update queue, event and trigger dispatch by stable numeric id,
//! pooled inter-stage output slots, mount content recycling, and the
//! [`lifecycle::MountHost`] that sequences the phases.
//!
//! The platform toolkit (view mutation, text measurement, theme attributes,
//! accessibility delegation) is consumed only through the narrow traits in
//! [`platform`] and the hooks on [`component::Component`].

pub mod collections;
mod component;
mod context;
mod error;
mod events;
mod geometry;
mod lifecycle;
mod output;
mod platform;
mod pool;
mod state;
mod tree_props;
mod trigger;

pub use component::{
    downcast_component, AccessibilityNode, Component, ComponentId, MountType,
};
pub use context::{ComponentContext, TreeScope};
pub use error::{LifecycleError, Result};
pub use events::{DispatchResult, DispatchTable, EventDispatcher, EventHandler, EventPool, HandlerId};
pub use geometry::{Rect, Size, SizeConstraints};
pub use lifecycle::{LifecyclePhase, MountHost, RenderPass};
pub use output::{OutputPool, OutputSlot};
pub use platform::{AttrId, AttrValue, MeasureBackend, NoTheme, ThemeResolver};
pub use pool::{MountContent, MountContentPool, RecyclePool};
pub use state::{
    GlobalKey, RenderRequest, StateContainer, StateHandler, StateUpdate, StateUpdateQueue,
    StateValue, UpdateMode,
};
pub use tree_props::TreeProps;
pub use trigger::{EventTrigger, EventTriggersContainer, TriggerId, TriggerTarget};

pub mod prelude {
    pub use crate::component::{Component, ComponentId, MountType};
    pub use crate::context::{ComponentContext, TreeScope};
    pub use crate::events::{DispatchResult, EventHandler, HandlerId};
    pub use crate::geometry::{Rect, Size, SizeConstraints};
    pub use crate::lifecycle::MountHost;
    pub use crate::state::{GlobalKey, StateContainer, StateValue};
    pub use crate::trigger::{EventTrigger, TriggerId};
}
