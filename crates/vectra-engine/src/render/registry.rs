use crate::config::BridgeConfig;
use crate::error::PassError;
use crate::source::{EngineSource, GeometryBuffer, OverlayLayer};

use super::backend::Backend;
use super::ctx::FrameParams;
use super::geometry::{LINES, TRIANGLES};
use super::glyph::GlyphPass;
use super::overlay::OverlayPass;
use super::pass::RenderPass;

const KIND_COUNT: usize = 3 + OverlayLayer::ALL.len();

/// Primitive kinds with a dedicated pass, in draw order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PassKind {
    Triangles,
    Lines,
    Glyphs,
    Overlay(OverlayLayer),
}

impl PassKind {
    pub const ALL: [PassKind; KIND_COUNT] = [
        PassKind::Triangles,
        PassKind::Lines,
        PassKind::Glyphs,
        PassKind::Overlay(OverlayLayer::SelectionOutline),
        PassKind::Overlay(OverlayLayer::SelectionHandles),
        PassKind::Overlay(OverlayLayer::SnapGuides),
    ];

    #[inline]
    const fn index(self) -> usize {
        match self {
            PassKind::Triangles => 0,
            PassKind::Lines => 1,
            PassKind::Glyphs => 2,
            PassKind::Overlay(layer) => 3 + layer.index(),
        }
    }
}

/// What one `sync` call re-uploaded.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SyncReport {
    pub triangles: bool,
    pub lines: bool,
    pub glyphs: bool,
    pub atlas: bool,
    /// Indexed by [`OverlayLayer::index`].
    pub overlays: [bool; 3],
}

impl SyncReport {
    pub fn any(&self) -> bool {
        self.triangles || self.lines || self.glyphs || self.atlas || self.overlays.contains(&true)
    }
}

/// One pass per [`PassKind`], built once at startup.
///
/// A kind whose pass fails to initialize is disabled for the registry's
/// lifetime and skipped every frame.
pub struct PassRegistry<B: Backend> {
    triangles: RenderPass<B>,
    lines: RenderPass<B>,
    glyphs: GlyphPass<B>,
    overlays: [OverlayPass<B>; 3],
    disabled: [bool; KIND_COUNT],
}

impl<B: Backend> PassRegistry<B> {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            triangles: RenderPass::new(&TRIANGLES, config),
            lines: RenderPass::new(&LINES, config),
            glyphs: GlyphPass::new(config),
            overlays: OverlayLayer::ALL.map(|layer| OverlayPass::new(config, layer)),
            disabled: [false; KIND_COUNT],
        }
    }

    /// Initializes every enabled pass. Failures are logged, their kinds
    /// disabled, and returned to the caller.
    pub fn initialize(&mut self, backend: &mut B) -> Vec<(PassKind, PassError)> {
        let mut failures = Vec::new();
        for kind in PassKind::ALL {
            if !self.is_enabled(kind) {
                continue;
            }
            let result = match kind {
                PassKind::Triangles => self.triangles.initialize(backend),
                PassKind::Lines => self.lines.initialize(backend),
                PassKind::Glyphs => self.glyphs.initialize(backend),
                PassKind::Overlay(layer) => self.overlays[layer.index()].initialize(backend),
            };
            if let Err(err) = result {
                log::error!("{kind:?} pass disabled: {err}");
                self.disabled[kind.index()] = true;
                failures.push((kind, err));
            }
        }
        failures
    }

    #[inline]
    pub fn is_enabled(&self, kind: PassKind) -> bool {
        !self.disabled[kind.index()]
    }

    pub fn dispose(&mut self, backend: &mut B) {
        self.triangles.dispose(backend);
        self.lines.dispose(backend);
        self.glyphs.dispose(backend);
        for overlay in &mut self.overlays {
            overlay.dispose(backend);
        }
    }

    /// Pulls fresh metadata from `source` and re-uploads whatever changed.
    pub fn sync<S: EngineSource + ?Sized>(&mut self, backend: &mut B, source: &S, frame: &FrameParams) -> SyncReport {
        let view = source.memory_view();
        let mut report = SyncReport::default();

        if self.is_enabled(PassKind::Triangles) {
            report.triangles = self.triangles.sync(backend, &view, &source.buffer_meta(GeometryBuffer::Triangles));
        }
        if self.is_enabled(PassKind::Lines) {
            report.lines = self.lines.sync(backend, &view, &source.buffer_meta(GeometryBuffer::Lines));
        }
        if self.is_enabled(PassKind::Glyphs) {
            report.atlas = self.glyphs.sync_atlas(backend, &view, &source.atlas_meta());
            report.glyphs = self.glyphs.sync(backend, &view, &source.buffer_meta(GeometryBuffer::Glyphs));
        }
        for layer in OverlayLayer::ALL {
            if self.is_enabled(PassKind::Overlay(layer)) {
                let meta = source.overlay_meta(layer);
                report.overlays[layer.index()] =
                    self.overlays[layer.index()].sync(backend, &view, &meta, frame.view.scale);
            }
        }
        report
    }

    /// Draws every enabled kind in [`PassKind::ALL`] order.
    pub fn render(&mut self, backend: &mut B, target: &mut B::Target<'_>, frame: &FrameParams) {
        for kind in PassKind::ALL {
            if !self.is_enabled(kind) {
                continue;
            }
            match kind {
                PassKind::Triangles => self.triangles.draw(backend, target, frame, None),
                PassKind::Lines => self.lines.draw(backend, target, frame, None),
                PassKind::Glyphs => self.glyphs.draw(backend, target, frame),
                PassKind::Overlay(layer) => self.overlays[layer.index()].draw(backend, target, frame),
            }
        }
    }

    /// `sync` followed by `render`.
    pub fn draw_frame<S: EngineSource + ?Sized>(
        &mut self,
        backend: &mut B,
        target: &mut B::Target<'_>,
        source: &S,
        frame: &FrameParams,
    ) -> SyncReport {
        let report = self.sync(backend, source, frame);
        self.render(backend, target, frame);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{CanvasSize, Rect, ViewTransform};
    use crate::render::geometry::{GeometryVertex, SELECTION_HANDLES};
    use crate::render::glyph::{GLYPHS, GlyphVertex};
    use crate::render::testing::{FakeEngine, RecordingBackend};
    use crate::wire::{PrimitiveFlags, PrimitiveKind, PrimitiveRecord};

    fn frame() -> FrameParams {
        FrameParams::new(ViewTransform::new(0.0, 0.0, 1.0), CanvasSize::new(320.0, 240.0), 1.0)
    }

    fn populated_engine() -> FakeEngine {
        let mut engine = FakeEngine::new();
        let red = [1.0, 0.0, 0.0, 1.0];
        engine.set_triangles(&[
            GeometryVertex::new(0.0, 0.0, red),
            GeometryVertex::new(1.0, 0.0, red),
            GeometryVertex::new(0.0, 1.0, red),
        ]);
        engine.set_lines(&[GeometryVertex::new(0.0, 0.0, red), GeometryVertex::new(5.0, 5.0, red)]);
        engine.set_glyphs(&GlyphVertex::quad(Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(0.0, 0.0, 1.0, 1.0), red));
        engine.set_atlas(2, 2, &[128; 16]);
        let segment = |count| PrimitiveRecord { kind: PrimitiveKind::Segment, flags: PrimitiveFlags::empty(), count, offset: 0 };
        let grip = PrimitiveRecord { kind: PrimitiveKind::Point, flags: PrimitiveFlags::empty(), count: 1, offset: 0 };
        engine.set_overlay(OverlayLayer::SelectionOutline, &[segment(2)], &[0.0, 0.0, 3.0, 3.0]);
        engine.set_overlay(OverlayLayer::SelectionHandles, &[grip], &[3.0, 3.0]);
        engine.set_overlay(OverlayLayer::SnapGuides, &[segment(4)], &[0.0, 1.0, 9.0, 1.0, 1.0, 0.0, 1.0, 9.0]);
        engine
    }

    #[test]
    fn draws_every_kind_in_order() {
        let mut backend = RecordingBackend::default();
        let mut registry = PassRegistry::new(&BridgeConfig::default());
        assert!(registry.initialize(&mut backend).is_empty());

        let engine = populated_engine();
        let report = registry.draw_frame(&mut backend, &mut (), &engine, &frame());

        assert!(report.triangles && report.lines && report.glyphs && report.atlas);
        assert_eq!(report.overlays, [true; 3]);
        let drawn: Vec<(&str, u32)> = backend.draws.iter().map(|d| (d.label, d.vertex_count)).collect();
        assert_eq!(
            drawn,
            [
                ("vectra triangles", 3),
                ("vectra lines", 2),
                ("vectra glyphs", 6),
                ("vectra selection outline", 2),
                ("vectra selection handles", 8),
                ("vectra snap guides", 4),
            ]
        );
    }

    #[test]
    fn steady_state_frame_uploads_nothing() {
        let mut backend = RecordingBackend::default();
        let mut registry = PassRegistry::new(&BridgeConfig::default());
        registry.initialize(&mut backend);
        let engine = populated_engine();

        registry.draw_frame(&mut backend, &mut (), &engine, &frame());
        let uploads = backend.vertex_uploads;
        let report = registry.draw_frame(&mut backend, &mut (), &engine, &frame());

        assert!(!report.any());
        assert_eq!(backend.vertex_uploads, uploads);
        assert_eq!(backend.draws.len(), 12);
    }

    #[test]
    fn failing_kind_is_disabled_alone() {
        let mut backend = RecordingBackend { fail_program: Some(GLYPHS.label), ..Default::default() };
        let mut registry = PassRegistry::new(&BridgeConfig::default());

        let failures = registry.initialize(&mut backend);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, PassKind::Glyphs);
        assert!(!registry.is_enabled(PassKind::Glyphs));
        assert!(registry.is_enabled(PassKind::Lines));

        let engine = populated_engine();
        registry.draw_frame(&mut backend, &mut (), &engine, &frame());
        assert_eq!(backend.draws.len(), 5);
        assert!(backend.draws.iter().all(|d| d.label != GLYPHS.label));
    }

    #[test]
    fn disabled_kind_is_never_retried() {
        let mut backend = RecordingBackend { fail_program: Some(GLYPHS.label), ..Default::default() };
        let mut registry = PassRegistry::new(&BridgeConfig::default());
        registry.initialize(&mut backend);

        backend.fail_program = None;
        assert!(registry.initialize(&mut backend).is_empty());
        assert!(!registry.is_enabled(PassKind::Glyphs));
        assert_eq!(backend.programs_created, 5);
    }

    #[test]
    fn dispose_releases_everything() {
        let mut backend = RecordingBackend::default();
        let mut registry = PassRegistry::new(&BridgeConfig::default());
        registry.initialize(&mut backend);
        registry.draw_frame(&mut backend, &mut (), &populated_engine(), &frame());

        registry.dispose(&mut backend);
        assert_eq!(backend.programs_destroyed, 6);
        assert_eq!(backend.buffers_destroyed, backend.buffers_created);
        assert_eq!(backend.textures_destroyed, 1);

        backend.draws.clear();
        registry.render(&mut backend, &mut (), &frame());
        assert!(backend.draws.is_empty());
    }

    // ── overlay layers ────────────────────────────────────────────────────

    #[test]
    fn overlay_layers_resync_independently() {
        let mut backend = RecordingBackend::default();
        let mut registry = PassRegistry::new(&BridgeConfig::default());
        registry.initialize(&mut backend);
        let mut engine = populated_engine();
        registry.draw_frame(&mut backend, &mut (), &engine, &frame());

        engine.set_overlay(OverlayLayer::SnapGuides, &[], &[]);
        let report = registry.draw_frame(&mut backend, &mut (), &engine, &frame());

        assert_eq!(report.overlays, [false, false, true]);
        assert!(!(report.triangles || report.lines || report.glyphs || report.atlas));
        let last: Vec<&str> = backend.draws[6..].iter().map(|d| d.label).collect();
        assert_eq!(
            last,
            ["vectra triangles", "vectra lines", "vectra glyphs", "vectra selection outline", "vectra selection handles"]
        );
    }

    #[test]
    fn failing_overlay_layer_leaves_the_others() {
        let mut backend = RecordingBackend { fail_program: Some(SELECTION_HANDLES.label), ..Default::default() };
        let mut registry = PassRegistry::new(&BridgeConfig::default());

        let failures = registry.initialize(&mut backend);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, PassKind::Overlay(OverlayLayer::SelectionHandles));
        assert!(registry.is_enabled(PassKind::Overlay(OverlayLayer::SelectionOutline)));
        assert!(registry.is_enabled(PassKind::Overlay(OverlayLayer::SnapGuides)));

        registry.draw_frame(&mut backend, &mut (), &populated_engine(), &frame());
        assert_eq!(backend.draws.len(), 5);
        assert!(backend.draws.iter().all(|d| d.label != SELECTION_HANDLES.label));
    }
}
