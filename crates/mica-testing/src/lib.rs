//! Test doubles and fixture components for Mica

pub mod fakes;
pub mod fixture;

pub use fakes::{FixedMeasureBackend, MapThemeResolver};
pub use fixture::{
    dispatch_fixture_event, FixtureDrawable, FixtureEvent, FixtureMount, FixtureMountBuilder,
    FixtureState, FixtureTreeProp, LifecycleProbe, CLICK_TRIGGER, ERROR_HANDLER,
    LAYOUT_EVENT_HANDLER,
};

pub mod prelude {
    pub use crate::fakes::{FixedMeasureBackend, MapThemeResolver};
    pub use crate::fixture::{FixtureMount, FixtureState, LifecycleProbe};
}
