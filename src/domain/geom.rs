/// Axis-aligned boxes and points in world units.
///
/// World space is screen space: origin top-left, x grows right, y grows down.
/// All boxes are half-open on their far edges, so two boxes that merely
/// touch do not intersect.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Square box of side `size` with its top-left corner at `at`.
    pub const fn square(at: Point, size: f32) -> Self {
        Rect { x: at.x, y: at.y, w: size, h: size }
    }

    #[inline]
    pub fn right(&self) -> f32 { self.x + self.w }

    #[inline]
    pub fn bottom(&self) -> f32 { self.y + self.h }

    #[inline]
    pub fn top_left(&self) -> Point { Point::new(self.x, self.y) }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Corners in the order top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.x, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }

    /// Strict overlap test. Shared edges are not an intersection.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Move the box the least amount needed to fit inside `bounds`.
    /// A box larger than `bounds` is aligned to the bounds' top-left.
    pub fn clamp_within(&self, bounds: &Rect) -> Rect {
        let x = if self.w >= bounds.w {
            bounds.x
        } else {
            self.x.max(bounds.x).min(bounds.right() - self.w)
        };
        let y = if self.h >= bounds.h {
            bounds.y
        } else {
            self.y.max(bounds.y).min(bounds.bottom() - self.h)
        };
        Rect { x, y, ..*self }
    }
}
