use crate::msdf::DEFAULT_PX_RANGE;
use crate::source::OverlayLayer;

/// Tuning knobs for the pass registry.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Distance range the atlas was baked with, in texels.
    pub px_range: f32,
    /// Linear RGBA for selection outlines.
    pub selection_outline_color: [f32; 4],
    /// Linear RGBA for selection grips.
    pub selection_handle_color: [f32; 4],
    /// Linear RGBA for snap guides.
    pub snap_guide_color: [f32; 4],
    /// Linear RGBA for overlay primitives flagged `ACCENT`.
    pub overlay_accent_color: [f32; 4],
    /// Side of the square drawn for `Point` primitives, in screen pixels.
    pub point_marker_px: f32,
    /// Smallest vertex buffer a pass allocates, in vertices.
    pub min_vertex_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            px_range: DEFAULT_PX_RANGE,
            selection_outline_color: [0.16, 0.55, 0.95, 1.0],
            selection_handle_color: [1.0, 1.0, 1.0, 1.0],
            snap_guide_color: [0.95, 0.2, 0.55, 1.0],
            overlay_accent_color: [1.0, 0.62, 0.1, 1.0],
            point_marker_px: 6.0,
            min_vertex_capacity: 64,
        }
    }
}

impl BridgeConfig {
    /// Base color of unflagged records on `layer`.
    pub fn overlay_color(&self, layer: OverlayLayer) -> [f32; 4] {
        match layer {
            OverlayLayer::SelectionOutline => self.selection_outline_color,
            OverlayLayer::SelectionHandles => self.selection_handle_color,
            OverlayLayer::SnapGuides => self.snap_guide_color,
        }
    }
}
