use std::fmt;

/// Axis-aligned rectangle in screen pixels. `x`/`y` may be negative on
/// multi-monitor layouts where a display sits left of or above the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScreenRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenRect {
    /// Create a rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Too small to be a meaningful capture (under 2px on either side).
    pub fn is_degenerate(&self) -> bool {
        self.width < 2 || self.height < 2
    }

    /// Whether `(px, py)` lies inside.
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        let (px, py) = (i64::from(px), i64::from(py));
        px >= i64::from(self.x) && px < self.right() && py >= i64::from(self.y) && py < self.bottom()
    }

    /// Area of the overlap with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &ScreenRect) -> u64 {
        let left = i64::from(self.x).max(i64::from(other.x));
        let top = i64::from(self.y).max(i64::from(other.y));
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return 0;
        }
        ((right - left) as u64) * ((bottom - top) as u64)
    }

    /// The same rectangle expressed relative to `origin`'s top-left corner.
    pub fn relative_to(&self, origin: &ScreenRect) -> ScreenRect {
        ScreenRect {
            x: self.x.saturating_sub(origin.x),
            y: self.y.saturating_sub(origin.y),
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Display for ScreenRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}
