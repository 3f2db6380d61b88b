use super::{CanvasSize, Vec2};

/// Smallest scale `zoom_about` will produce.
pub const MIN_SCALE: f32 = 1e-4;
/// Largest scale `zoom_about` will produce.
pub const MAX_SCALE: f32 = 1e4;

/// Camera state: world units to logical screen pixels.
///
/// World space is Y-up, screen space Y-down:
///
/// ```text
/// screen.x =  world.x * scale + translate.x
/// screen.y = -world.y * scale + translate.y
/// ```
///
/// This is the CPU mirror of the vertex stage in every pass. `scale` must be
/// finite and non-zero.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self { translate: Vec2::zero(), scale: 1.0 };

    #[inline]
    pub const fn new(translate_x: f32, translate_y: f32, scale: f32) -> Self {
        Self { translate: Vec2::new(translate_x, translate_y), scale }
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            world.x * self.scale + self.translate.x,
            -world.y * self.scale + self.translate.y,
        )
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            (screen.x - self.translate.x) / self.scale,
            -(screen.y - self.translate.y) / self.scale,
        )
    }

    /// World position to clip space for a canvas of `canvas` device pixels.
    pub fn world_to_clip(&self, world: Vec2, canvas: CanvasSize, pixel_ratio: f32) -> Vec2 {
        let device = self.world_to_screen(world) * pixel_ratio;
        Vec2::new(
            (device.x / canvas.width) * 2.0 - 1.0,
            1.0 - (device.y / canvas.height) * 2.0,
        )
    }

    /// Multiplies the scale by `factor`, keeping the world point under
    /// `anchor` (screen pixels) fixed.
    pub fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let pinned = self.screen_to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = Vec2::new(
            anchor.x - pinned.x * self.scale,
            anchor.y + pinned.y * self.scale,
        );
    }

    /// Moves the view by a screen-space delta.
    #[inline]
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.translate = self.translate + Vec2::new(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() <= EPS * (1.0 + b.x.abs()) && (a.y - b.y).abs() <= EPS * (1.0 + b.y.abs())
    }

    // ── world <-> screen ──────────────────────────────────────────────────

    #[test]
    fn y_axis_is_inverted() {
        let t = ViewTransform::new(100.0, 50.0, 2.0);
        assert_eq!(t.world_to_screen(Vec2::new(3.0, 4.0)), Vec2::new(106.0, 42.0));
    }

    #[test]
    fn screen_world_round_trip() {
        let transforms = [
            ViewTransform::IDENTITY,
            ViewTransform::new(-320.5, 812.0, 0.125),
            ViewTransform::new(12.0, -7.0, 37.5),
            ViewTransform::new(0.0, 0.0, -2.0),
        ];
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(640.0, 480.0),
            Vec2::new(-13.25, 9001.0),
            Vec2::new(0.5, -0.5),
        ];
        for t in transforms {
            for p in points {
                let back = t.world_to_screen(t.screen_to_world(p));
                assert!(approx(back, p), "{t:?} {p:?} -> {back:?}");
            }
        }
    }

    // ── clip space ────────────────────────────────────────────────────────

    #[test]
    fn canvas_corners_map_to_clip_corners() {
        let canvas = CanvasSize::new(800.0, 600.0);
        let t = ViewTransform::new(0.0, 300.0, 1.0);
        let top_left = t.world_to_clip(Vec2::new(0.0, 300.0), canvas, 1.0);
        let bottom_right = t.world_to_clip(Vec2::new(800.0, -300.0), canvas, 1.0);
        assert!(approx(top_left, Vec2::new(-1.0, 1.0)));
        assert!(approx(bottom_right, Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn pixel_ratio_applies_before_clip() {
        let canvas = CanvasSize::new(200.0, 200.0);
        let t = ViewTransform::IDENTITY;
        let clip = t.world_to_clip(Vec2::new(50.0, -50.0), canvas, 2.0);
        assert!(approx(clip, Vec2::new(0.0, 0.0)));
    }

    // ── camera edits ──────────────────────────────────────────────────────

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut t = ViewTransform::new(40.0, 60.0, 1.5);
        let anchor = Vec2::new(123.0, 77.0);
        let before = t.screen_to_world(anchor);

        t.zoom_about(anchor, 2.0);

        assert!((t.scale - 3.0).abs() < 1e-6);
        assert!(approx(t.world_to_screen(before), anchor));
    }

    #[test]
    fn zoom_clamps_and_ignores_bad_factors() {
        let mut t = ViewTransform::IDENTITY;
        t.zoom_about(Vec2::zero(), 0.0);
        t.zoom_about(Vec2::zero(), f32::NAN);
        assert_eq!(t, ViewTransform::IDENTITY);

        t.zoom_about(Vec2::zero(), 1e9);
        assert_eq!(t.scale, MAX_SCALE);
    }

    #[test]
    fn pan_moves_translation() {
        let mut t = ViewTransform::IDENTITY;
        t.pan_by(5.0, -3.0);
        assert_eq!(t.translate, Vec2::new(5.0, -3.0));
    }
}
