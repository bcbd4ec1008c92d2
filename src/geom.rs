//! Small geometry types shared across the document: pixel extents and
//! placement positions.

/// A pixel extent. Both dimensions are kept `>= 1` - a zero-area cel or
/// animation frame is never representable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Size {
    width: u32,
    height: u32,
}
impl Size {
    /// Smallest legal extent.
    pub const MIN: Self = Self {
        width: 1,
        height: 1,
    };
    /// Build an extent, clamping each dimension up to 1.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
    #[must_use]
    pub fn width(self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(self) -> u32 {
        self.height
    }
}
impl Default for Size {
    fn default() -> Self {
        Self::MIN
    }
}
impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A position on the frame canvas, in pixels from the top-left corner.
/// Fractional positions are allowed; compositing rounds to whole pixels.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}
impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    /// Offset by a delta.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}
impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn size_clamps_to_one() {
        assert_eq!(Size::new(0, 0), Size::MIN);
        assert_eq!(Size::new(0, 5), Size::new(1, 5));
        assert_eq!(Size::new(640, 0).height(), 1);
    }
    #[test]
    fn offset_adds() {
        let p = Vec2::new(1.5, -2.0).offset(0.5, 2.0);
        assert_eq!(p, Vec2::new(2.0, 0.0));
    }
}
