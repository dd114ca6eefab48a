//! Fakes for the platform boundary traits.

use std::any::Any;
use std::cell::Cell;

use mica_core::collections::map::HashMap;
use mica_core::{AttrId, AttrValue, MeasureBackend, Size, SizeConstraints, ThemeResolver};

/// Measure backend that reports one fixed size, clamped to the constraints.
pub struct FixedMeasureBackend {
    size: Size,
    calls: Cell<usize>,
}

impl FixedMeasureBackend {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            calls: Cell::new(0),
        }
    }

    /// Number of measure calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MeasureBackend for FixedMeasureBackend {
    fn measure(&self, constraints: SizeConstraints, _content: &dyn Any) -> Size {
        self.calls.set(self.calls.get() + 1);
        constraints.constrain(self.size)
    }
}

/// Theme resolver backed by a plain attribute map.
#[derive(Default)]
pub struct MapThemeResolver {
    attrs: HashMap<AttrId, AttrValue>,
}

impl MapThemeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attr: AttrId, value: AttrValue) -> Self {
        self.attrs.insert(attr, value);
        self
    }
}

impl ThemeResolver for MapThemeResolver {
    fn resolve(&self, attr: AttrId) -> Option<AttrValue> {
        self.attrs.get(&attr).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backend_clamps_and_counts() {
        let backend = FixedMeasureBackend::new(Size::new(100, 50));
        let measured = backend.measure(SizeConstraints::loose(60, 60), &());
        assert_eq!(measured, Size::new(60, 50));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn map_theme_resolves_only_known_attrs() {
        let theme = MapThemeResolver::new().with(AttrId(7), AttrValue::Px(21));
        assert_eq!(theme.resolve(AttrId(7)), Some(AttrValue::Px(21)));
        assert_eq!(theme.resolve(AttrId(8)), None);
    }
}
