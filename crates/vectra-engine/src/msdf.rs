//! Multi-channel signed distance field coverage.
//!
//! CPU mirror of the fragment stage in `render/shaders/glyph.wgsl`. The two
//! must stay in lock-step; the tests here pin the shared behavior.
//!
//! Coverage is computed in screen pixels: the atlas distance (in texels) is
//! divided by how many atlas texels one screen pixel spans, which comes from
//! the UV derivatives. That ratio cancels the zoom level, so edges stay about
//! one pixel wide at any scale.

use crate::coords::Vec2;

/// Distance range baked into the atlas, in texels.
pub const DEFAULT_PX_RANGE: f32 = 8.0;

/// Fragments with less coverage than this are discarded.
pub const DISCARD_THRESHOLD: f32 = 0.01;

/// Floor for the texel/pixel ratio so a degenerate derivative cannot divide by zero.
pub const MIN_TEXELS_PER_PIXEL: f32 = 1e-5;

/// Median of three channels. Reconstructs sharp corners from an MSDF sample.
#[inline]
pub fn median3(r: f32, g: f32, b: f32) -> f32 {
    r.min(g).max(r.max(g).min(b))
}

/// Signed distance in atlas texels. Positive inside the glyph.
#[inline]
pub fn distance_texels(sd: f32, px_range: f32) -> f32 {
    (sd - 0.5) * px_range
}

/// Atlas texels covered by one screen pixel.
///
/// `uv_fwidth` is `abs(dpdx(uv)) + abs(dpdy(uv))` and `atlas_size` the atlas
/// dimensions in texels.
#[inline]
pub fn texels_per_pixel(uv_fwidth: Vec2, atlas_size: Vec2) -> f32 {
    Vec2::new(uv_fwidth.x * atlas_size.x, uv_fwidth.y * atlas_size.y).length()
}

/// Antialiased coverage in `[0, 1]` for a median sample `sd`.
#[inline]
pub fn coverage(sd: f32, px_range: f32, texels_per_pixel: f32) -> f32 {
    let screen_px = distance_texels(sd, px_range) / texels_per_pixel.max(MIN_TEXELS_PER_PIXEL);
    (screen_px + 0.5).clamp(0.0, 1.0)
}

/// Full per-fragment result: text color with alpha scaled by coverage, or
/// `None` when the fragment is discarded.
pub fn shade(sample: [f32; 3], color: [f32; 4], px_range: f32, texels_per_pixel: f32) -> Option<[f32; 4]> {
    let sd = median3(sample[0], sample[1], sample[2]);
    let alpha = coverage(sd, px_range, texels_per_pixel);
    if alpha < DISCARD_THRESHOLD {
        return None;
    }
    Some([color[0], color[1], color[2], color[3] * alpha])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_picks_middle_channel() {
        assert_eq!(median3(0.1, 0.9, 0.5), 0.5);
        assert_eq!(median3(0.9, 0.1, 0.5), 0.5);
        assert_eq!(median3(0.5, 0.1, 0.9), 0.5);
        assert_eq!(median3(0.3, 0.3, 0.8), 0.3);
    }

    #[test]
    fn edge_is_half_covered_at_any_zoom() {
        for tpp in [0.01, 0.25, 1.0, 4.0, 64.0] {
            assert_eq!(coverage(0.5, DEFAULT_PX_RANGE, tpp), 0.5);
        }
    }

    #[test]
    fn coverage_ramp_is_one_pixel_wide() {
        // One texel per pixel: half a pixel inside the edge is fully covered.
        let inside = 0.5 + 0.5 / DEFAULT_PX_RANGE;
        let outside = 0.5 - 0.5 / DEFAULT_PX_RANGE;
        assert_eq!(coverage(inside, DEFAULT_PX_RANGE, 1.0), 1.0);
        assert_eq!(coverage(outside, DEFAULT_PX_RANGE, 1.0), 0.0);
    }

    #[test]
    fn minified_text_softens_edges() {
        let sd = 0.5 + 0.5 / DEFAULT_PX_RANGE;
        let sharp = coverage(sd, DEFAULT_PX_RANGE, 1.0);
        let soft = coverage(sd, DEFAULT_PX_RANGE, 4.0);
        assert!(soft < sharp);
        assert!(soft > 0.5);
    }

    #[test]
    fn texels_per_pixel_scales_with_atlas() {
        let fw = Vec2::new(1.0 / 2048.0, 0.0);
        let tpp = texels_per_pixel(fw, Vec2::new(2048.0, 2048.0));
        assert!((tpp - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shade_discards_far_outside() {
        assert_eq!(shade([0.0, 0.0, 0.0], [1.0; 4], DEFAULT_PX_RANGE, 1.0), None);
    }

    #[test]
    fn shade_scales_alpha_only() {
        let out = shade([0.5, 0.5, 0.5], [0.2, 0.4, 0.6, 0.8], DEFAULT_PX_RANGE, 1.0);
        assert_eq!(out, Some([0.2, 0.4, 0.6, 0.4]));
    }
}
