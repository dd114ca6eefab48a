//! Integer pixel geometry used at the measure and bounds boundaries.

/// A measured size in whole pixels. Components never produce negative sizes;
/// constructors clamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }
}

/// Finalized layout bounds assigned by the tree's layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Sizing constraints handed to `on_measure`. `i32::MAX` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeConstraints {
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl SizeConstraints {
    pub const UNBOUNDED: i32 = i32::MAX;

    /// Constraints with exact width and height.
    pub fn tight(width: i32, height: i32) -> Self {
        Self {
            min_width: width,
            max_width: width,
            min_height: height,
            max_height: height,
        }
    }

    /// Constraints with loose bounds (min = 0, max = given values).
    pub fn loose(max_width: i32, max_height: i32) -> Self {
        Self {
            min_width: 0,
            max_width,
            min_height: 0,
            max_height,
        }
    }

    pub fn is_tight(&self) -> bool {
        self.min_width == self.max_width && self.min_height == self.max_height
    }

    pub fn has_bounded_width(&self) -> bool {
        self.max_width != Self::UNBOUNDED
    }

    pub fn has_bounded_height(&self) -> bool {
        self.max_height != Self::UNBOUNDED
    }

    /// Clamps the given size into these constraints.
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(
            size.width.clamp(self.min_width, self.max_width),
            size.height.clamp(self.min_height, self.max_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrain_clamps_both_axes() {
        let constraints = SizeConstraints::loose(100, 50);
        assert_eq!(
            constraints.constrain(Size::new(200, 20)),
            Size::new(100, 20)
        );
        let tight = SizeConstraints::tight(30, 40);
        assert!(tight.is_tight());
        assert_eq!(tight.constrain(Size::ZERO), Size::new(30, 40));
    }

    #[test]
    fn sizes_never_go_negative() {
        assert_eq!(Size::new(-5, 10), Size::new(0, 10));
        assert_eq!(Rect::new(0, 0, -1, -1).size(), Size::ZERO);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(10, 10, 5, 5);
        assert!(rect.contains(10, 10));
        assert!(rect.contains(14, 14));
        assert!(!rect.contains(15, 10));
    }
}
