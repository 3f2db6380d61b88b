//! Overlay primitives (selection outlines, handles, snap guides).
//!
//! The engine publishes one record buffer per [`OverlayLayer`], each a list of
//! primitive records over a payload of 2-D points. Records are expanded on
//! the CPU into line-list vertices and drawn with the geometry program.

use crate::arena::MemoryView;
use crate::config::BridgeConfig;
use crate::coords::{Rect, Vec2};
use crate::decode::{DecodedPrimitives, decode_primitives};
use crate::error::PassError;
use crate::source::OverlayLayer;
use crate::upload::UploadCache;
use crate::wire::{OVERLAY_FLOATS_PER_POINT, OverlayMeta, PrimitiveFlags, PrimitiveKind};

use super::backend::{Backend, ProgramDesc};
use super::ctx::FrameParams;
use super::geometry::{GeometryVertex, SELECTION_HANDLES, SELECTION_OUTLINE, SNAP_GUIDES};
use super::pass::RenderPass;

/// Colors and marker size used when expanding overlay records.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OverlayStyle {
    pub color: [f32; 4],
    pub accent_color: [f32; 4],
    /// Point marker side in screen pixels.
    pub point_marker_px: f32,
}

impl OverlayStyle {
    pub fn for_layer(config: &BridgeConfig, layer: OverlayLayer) -> Self {
        Self {
            color: config.overlay_color(layer),
            accent_color: config.overlay_accent_color,
            point_marker_px: config.point_marker_px,
        }
    }
}

/// What [`expand_primitives`] skipped or produced.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ExpandReport {
    pub drawn: usize,
    pub hidden: usize,
    pub unknown: usize,
    pub out_of_range: usize,
    /// Point markers emitted. Their world size depends on the view scale.
    pub markers: usize,
}

/// Appends line-list vertices for every drawable record in `decoded`.
///
/// - `Segment`: consecutive point pairs.
/// - `Polyline`: open chain.
/// - `Polygon`: closed chain.
/// - `Rect`: each point pair is two opposite corners.
/// - `Point`: a square marker per point, `point_marker_px` wide on screen.
///
/// `HIDDEN` and unknown kinds are skipped, as are records whose point range
/// leaves the payload.
pub fn expand_primitives(
    decoded: DecodedPrimitives<'_>,
    style: &OverlayStyle,
    view_scale: f32,
    out: &mut Vec<GeometryVertex>,
) -> ExpandReport {
    let mut report = ExpandReport::default();
    let payload = decoded.payload();

    for record in decoded.records() {
        if record.flags.contains(PrimitiveFlags::HIDDEN) {
            report.hidden += 1;
            continue;
        }
        if let PrimitiveKind::Unknown(_) = record.kind {
            report.unknown += 1;
            continue;
        }
        let Some(floats) = record.floats(payload, OVERLAY_FLOATS_PER_POINT) else {
            report.out_of_range += 1;
            continue;
        };

        let color = if record.flags.contains(PrimitiveFlags::ACCENT) {
            style.accent_color
        } else {
            style.color
        };
        let point = |i: usize| Vec2::new(floats[i], floats[i + 1]);
        let mut edge = |a: Vec2, b: Vec2| {
            out.push(GeometryVertex::new(a.x, a.y, color));
            out.push(GeometryVertex::new(b.x, b.y, color));
        };
        let n = floats.len() / OVERLAY_FLOATS_PER_POINT;

        match record.kind {
            PrimitiveKind::Segment => {
                for i in (0..n / 2).map(|s| s * 4) {
                    edge(point(i), point(i + 2));
                }
            }
            PrimitiveKind::Polyline | PrimitiveKind::Polygon => {
                for i in 1..n {
                    edge(point((i - 1) * 2), point(i * 2));
                }
                if record.kind == PrimitiveKind::Polygon && n >= 3 {
                    edge(point((n - 1) * 2), point(0));
                }
            }
            PrimitiveKind::Rect => {
                for i in (0..n / 2).map(|r| r * 4) {
                    outline(&mut edge, Rect::from_corners(point(i), point(i + 2)));
                }
            }
            PrimitiveKind::Point => {
                let side = style.point_marker_px / view_scale.abs().max(f32::EPSILON);
                for i in 0..n {
                    outline(&mut edge, Rect::centered(point(i * 2), side));
                }
                report.markers += n;
            }
            PrimitiveKind::Unknown(_) => {}
        }
        report.drawn += 1;
    }
    report
}

fn outline(edge: &mut impl FnMut(Vec2, Vec2), rect: Rect) {
    let [a, b, c, d] = rect.corners();
    edge(a, b);
    edge(b, c);
    edge(c, d);
    edge(d, a);
}

fn program(layer: OverlayLayer) -> &'static ProgramDesc {
    match layer {
        OverlayLayer::SelectionOutline => &SELECTION_OUTLINE,
        OverlayLayer::SelectionHandles => &SELECTION_HANDLES,
        OverlayLayer::SnapGuides => &SNAP_GUIDES,
    }
}

/// Line pass fed from one overlay layer's record buffer instead of a vertex
/// buffer.
///
/// Re-expands when the record buffer changes, and when the zoom changes while
/// point markers are present.
pub struct OverlayPass<B: Backend> {
    layer: OverlayLayer,
    pass: RenderPass<B>,
    cache: UploadCache,
    style: OverlayStyle,
    scratch: Vec<GeometryVertex>,
    expanded_scale: Option<f32>,
    has_markers: bool,
    warned_unknown: bool,
    warned_read: bool,
    warned_out_of_range: bool,
}

impl<B: Backend> OverlayPass<B> {
    pub fn new(config: &BridgeConfig, layer: OverlayLayer) -> Self {
        Self {
            layer,
            pass: RenderPass::new(program(layer), config),
            cache: UploadCache::new(),
            style: OverlayStyle::for_layer(config, layer),
            scratch: Vec::new(),
            expanded_scale: None,
            has_markers: false,
            warned_unknown: false,
            warned_read: false,
            warned_out_of_range: false,
        }
    }

    #[inline]
    pub fn layer(&self) -> OverlayLayer {
        self.layer
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.pass.is_initialized()
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.pass.vertex_count()
    }

    pub fn initialize(&mut self, backend: &mut B) -> Result<(), PassError> {
        self.pass.initialize(backend)?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn dispose(&mut self, backend: &mut B) {
        self.pass.dispose(backend);
        self.cache.invalidate();
        self.expanded_scale = None;
        self.has_markers = false;
    }

    /// Re-expands and uploads when needed. Returns `true` on upload.
    pub fn sync(&mut self, backend: &mut B, view: &MemoryView<'_>, meta: &OverlayMeta, view_scale: f32) -> bool {
        if !self.pass.is_initialized() {
            return false;
        }

        let key = meta.upload_key();
        let rescale = self.has_markers && self.expanded_scale != Some(view_scale);
        if !rescale && !self.cache.should_reupload(view.block(), key) {
            return false;
        }

        let decoded = match decode_primitives(view, meta) {
            Ok(decoded) => decoded,
            Err(err) => {
                if !self.warned_read {
                    log::warn!("{}: {err}", self.pass.label());
                    self.warned_read = true;
                }
                self.cache.invalidate();
                self.has_markers = false;
                self.pass.upload::<GeometryVertex>(backend, &[]);
                return false;
            }
        };
        self.warned_read = false;

        self.scratch.clear();
        let report = expand_primitives(decoded, &self.style, view_scale, &mut self.scratch);
        if report.unknown > 0 && !self.warned_unknown {
            log::debug!("{}: skipped {} records of unknown kind", self.pass.label(), report.unknown);
            self.warned_unknown = true;
        }
        if report.out_of_range == 0 {
            self.warned_out_of_range = false;
        } else if !self.warned_out_of_range {
            log::warn!("{}: {} records point past the payload", self.pass.label(), report.out_of_range);
            self.warned_out_of_range = true;
        }

        self.has_markers = report.markers > 0;
        self.expanded_scale = Some(view_scale);
        self.cache.mark(view.block(), key);
        self.pass.upload(backend, &self.scratch)
    }

    pub fn draw(&mut self, backend: &mut B, target: &mut B::Target<'_>, frame: &FrameParams) {
        self.pass.draw(backend, target, frame, None);
    }
}
