use super::Vec2;

/// Axis-aligned rectangle (top-left origin).
///
/// Used for both logical and device space; which one is meant is carried by
/// the field or parameter name (`logical_box`, `device_clip`, ...).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    /// The zero-area rectangle an empty clip intersection collapses to.
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::from_origin_size(min, max - min)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// True when `other` lies entirely inside `self` (edges inclusive).
    #[inline]
    pub fn contains_rect(self, other: Rect) -> bool {
        let (a0, a1) = (self.min(), self.max());
        let (b0, b1) = (other.min(), other.max());
        b0.x >= a0.x && b0.y >= a0.y && b1.x <= a1.x && b1.y <= a1.y
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = (a.origin.x + a.size.x).min(b.origin.x + b.size.x);
        let y1 = (a.origin.y + a.size.y).min(b.origin.y + b.size.y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }

    /// Shrinks the rectangle to whole pixels: ceil on min, floor on max.
    ///
    /// Snapping inward keeps neighbouring clip regions from sharing a
    /// partially covered pixel column.
    #[inline]
    pub fn snapped_inward(self) -> Rect {
        let r = self.normalized();
        let min = Vec2::new(r.origin.x.ceil(), r.origin.y.ceil());
        let max = r.max();
        let max = Vec2::new(max.x.floor(), max.y.floor());
        Rect::from_min_max(min, max.max(min))
    }

    /// Intersects `self` with `clip` after snapping the clip inward.
    ///
    /// Returns `None` when nothing is left to draw.
    #[inline]
    pub fn clip_snapped(self, clip: Rect) -> Option<Rect> {
        self.intersect(clip.snapped_inward())
    }

    #[inline]
    pub fn scale(self, factor: f32) -> Rect {
        Rect::from_origin_size(self.origin * factor, self.size * factor)
    }

    #[inline]
    pub fn translate(self, delta: Vec2) -> Rect {
        Rect::from_origin_size(self.origin + delta, self.size)
    }

    /// Grows the rectangle by `amount` on every side.
    #[inline]
    pub fn expand(self, amount: f32) -> Rect {
        Rect::new(
            self.origin.x - amount,
            self.origin.y - amount,
            self.size.x + amount * 2.0,
            self.size.y + amount * 2.0,
        )
    }

    /// Shrinks the rectangle by `amount` on every side, clamping at zero size.
    #[inline]
    pub fn inset(self, amount: f32) -> Rect {
        Rect::new(
            self.origin.x + amount,
            self.origin.y + amount,
            (self.size.x - amount * 2.0).max(0.0),
            (self.size.y - amount * 2.0).max(0.0),
        )
    }

    /// Component-wise comparison within `eps`.
    #[inline]
    pub fn approx_eq(self, other: Rect, eps: f32) -> bool {
        (self.origin.x - other.origin.x).abs() <= eps
            && (self.origin.y - other.origin.y).abs() <= eps
            && (self.size.x - other.size.x).abs() <= eps
            && (self.size.y - other.size.y).abs() <= eps
    }
}
