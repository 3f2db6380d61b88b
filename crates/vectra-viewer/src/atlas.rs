//! Procedural glyph atlas.
//!
//! Bakes a handful of shapes as distance fields into an RGBA8 atlas. Every
//! channel carries the same true distance, which is a valid (if corner-rounding)
//! MSDF: the median of three equal values is the value itself.

use vectra_engine::coords::{Rect, Vec2};
use vectra_engine::msdf::DEFAULT_PX_RANGE;

/// Texels per atlas cell edge.
pub const CELL: u32 = 64;
/// Cells per atlas row and column.
pub const CELLS: u32 = 2;
pub const ATLAS_SIZE: u32 = CELL * CELLS;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Shape {
    Disk,
    Ring,
    Square,
    Plus,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Disk, Shape::Ring, Shape::Square, Shape::Plus];

    fn cell(self) -> (u32, u32) {
        match self {
            Shape::Disk => (0, 0),
            Shape::Ring => (1, 0),
            Shape::Square => (0, 1),
            Shape::Plus => (1, 1),
        }
    }

    /// Normalized atlas rectangle of this shape's cell.
    pub fn uv(self) -> Rect {
        let (cx, cy) = self.cell();
        let step = 1.0 / CELLS as f32;
        Rect::new(cx as f32 * step, cy as f32 * step, step, step)
    }

    /// Signed distance in texels from `p` (relative to the cell center).
    /// Positive inside.
    fn distance(self, p: Vec2) -> f32 {
        match self {
            Shape::Disk => 20.0 - p.length(),
            Shape::Ring => 6.0 - (p.length() - 18.0).abs(),
            Shape::Square => -box_distance(p, Vec2::new(18.0, 18.0)),
            Shape::Plus => {
                let bar = -box_distance(p, Vec2::new(22.0, 6.0));
                let post = -box_distance(p, Vec2::new(6.0, 22.0));
                bar.max(post)
            }
        }
    }
}

/// Exact box distance, positive outside.
fn box_distance(p: Vec2, half: Vec2) -> f32 {
    let qx = p.x.abs() - half.x;
    let qy = p.y.abs() - half.y;
    let outside = Vec2::new(qx.max(0.0), qy.max(0.0)).length();
    let inside = qx.max(qy).min(0.0);
    outside + inside
}

/// Encodes a texel distance the way the glyph shader decodes it.
fn encode(distance: f32) -> u8 {
    let sd = (distance / DEFAULT_PX_RANGE + 0.5).clamp(0.0, 1.0);
    (sd * 255.0).round() as u8
}

/// Bakes every [`Shape`] into a square RGBA8 atlas of [`ATLAS_SIZE`] texels.
pub fn bake() -> Vec<u8> {
    let mut rgba = vec![0u8; (ATLAS_SIZE * ATLAS_SIZE * 4) as usize];
    let half = CELL as f32 * 0.5;
    for shape in Shape::ALL {
        let (cx, cy) = shape.cell();
        for y in 0..CELL {
            for x in 0..CELL {
                let p = Vec2::new(x as f32 + 0.5 - half, y as f32 + 0.5 - half);
                let v = encode(shape.distance(p));
                let tx = cx * CELL + x;
                let ty = cy * CELL + y;
                let at = ((ty * ATLAS_SIZE + tx) * 4) as usize;
                rgba[at..at + 4].copy_from_slice(&[v, v, v, 255]);
            }
        }
    }
    rgba
}
