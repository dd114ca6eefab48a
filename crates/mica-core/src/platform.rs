//! Boundary traits toward the host platform.
//!
//! The core consumes the platform toolkit only through these narrow
//! interfaces; their implementations live with the embedding application (or
//! in the testing crate's fakes).

use std::any::Any;

use crate::geometry::{Size, SizeConstraints};

/// A platform theme attribute id, as resolved by the host's styling system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttrId(pub u32);

/// Values a theme attribute can resolve to.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    /// A dimension in whole pixels.
    Px(i32),
    Text(String),
    /// Packed ARGB.
    Color(u32),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_px(&self) -> Option<i32> {
        match self {
            AttrValue::Px(value) | AttrValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// Theme/attribute resolution, consumed only by `on_load_style`.
pub trait ThemeResolver {
    fn resolve(&self, attr: AttrId) -> Option<AttrValue>;
}

/// Resolver that resolves nothing; trees without a theme use this.
pub struct NoTheme;

impl ThemeResolver for NoTheme {
    fn resolve(&self, _attr: AttrId) -> Option<AttrValue> {
        None
    }
}

/// Measurement backend: a black box turning opaque sizing input into two
/// non-negative pixel dimensions.
pub trait MeasureBackend {
    fn measure(&self, constraints: SizeConstraints, content: &dyn Any) -> Size;
}
