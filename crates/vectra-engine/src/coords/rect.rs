use super::Vec2;

/// Axis-aligned rectangle stored as its two extreme corners.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    /// Rectangle spanned by two opposite corners, in any order.
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Square of side `size` centered on `center`.
    #[inline]
    pub fn centered(center: Vec2, size: f32) -> Self {
        let half = Vec2::new(size * 0.5, size * 0.5);
        Self { min: center - half, max: center + half }
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Corners in order: `min`, `(max.x, min.y)`, `max`, `(min.x, max.y)`.
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes() {
        let r = Rect::from_corners(Vec2::new(5.0, -1.0), Vec2::new(1.0, 3.0));
        assert_eq!(r.min, Vec2::new(1.0, -1.0));
        assert_eq!(r.max, Vec2::new(5.0, 3.0));
        assert_eq!(r.width(), 4.0);
        assert_eq!(r.height(), 4.0);
    }

    #[test]
    fn centered_square() {
        let r = Rect::centered(Vec2::new(2.0, 2.0), 2.0);
        assert_eq!(r, Rect::new(1.0, 1.0, 2.0, 2.0));
    }

    #[test]
    fn degenerate_is_empty() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn corners_wind_around() {
        let [a, b, c, d] = Rect::new(0.0, 0.0, 2.0, 1.0).corners();
        assert_eq!(a, Vec2::new(0.0, 0.0));
        assert_eq!(b, Vec2::new(2.0, 0.0));
        assert_eq!(c, Vec2::new(2.0, 1.0));
        assert_eq!(d, Vec2::new(0.0, 1.0));
    }
}
