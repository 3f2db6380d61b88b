//! In-process stand-in for the native engine.
//!
//! Publishes every buffer kind into a [`ByteArena`] the way the engine does:
//! vertex data and metadata side by side, a generation bump on every rewrite,
//! and an occasional heap relocation.

use std::f32::consts::TAU;
use std::time::Duration;

use vectra_engine::arena::{ByteArena, MemoryView};
use vectra_engine::coords::{Rect, Vec2};
use vectra_engine::render::{GeometryVertex, GlyphVertex};
use vectra_engine::wire::{BufferMeta, OverlayMeta, PrimitiveFlags, PrimitiveKind, PrimitiveRecord, TextureMeta};
use vectra_engine::{DecodeError, EngineSource, GeometryBuffer, OverlayLayer};

use crate::atlas::{self, Shape, ATLAS_SIZE};

/// How often the animated strokes are rewritten.
const REBUILD_EVERY: Duration = Duration::from_millis(1500);
/// Every this many rebuilds the heap is moved.
const RELOCATE_EVERY: u64 = 4;
/// Past this many live bytes the heap is wiped and everything republished.
const COMPACT_ABOVE: usize = 256 * 1024;

const GRID: [f32; 4] = [0.35, 0.38, 0.45, 1.0];
const STROKE: [f32; 4] = [0.95, 0.95, 0.98, 1.0];
const TEXT: [f32; 4] = [0.98, 0.92, 0.55, 1.0];

pub struct DemoEngine {
    arena: ByteArena,
    triangles: BufferMeta,
    lines: BufferMeta,
    glyphs: BufferMeta,
    overlays: [OverlayMeta; 3],
    atlas: TextureMeta,
    atlas_texels: Vec<u8>,
    rebuilds: u64,
    since_rebuild: Duration,
}

/// Overlay records under construction: `(kind, flags, points)`.
type Records<'a> = &'a [(PrimitiveKind, PrimitiveFlags, &'a [[f32; 2]])];

impl DemoEngine {
    pub fn new() -> Result<Self, DecodeError> {
        let mut engine = Self {
            // Small on purpose so the first frames already grow it.
            arena: ByteArena::with_capacity(4 * 1024),
            triangles: BufferMeta::default(),
            lines: BufferMeta::default(),
            glyphs: BufferMeta::default(),
            overlays: [OverlayMeta::default(); 3],
            atlas: TextureMeta::default(),
            atlas_texels: atlas::bake(),
            rebuilds: 0,
            since_rebuild: Duration::ZERO,
        };
        engine.publish_all()?;
        Ok(engine)
    }

    /// Advances the simulation. Returns `true` when anything was republished.
    pub fn tick(&mut self, dt: Duration) -> Result<bool, DecodeError> {
        self.since_rebuild += dt;
        if self.since_rebuild < REBUILD_EVERY {
            return Ok(false);
        }
        self.since_rebuild = Duration::ZERO;
        self.rebuilds += 1;

        if self.arena.used() > COMPACT_ABOVE {
            self.arena.reset();
            self.publish_all()?;
            log::debug!("demo heap compacted");
            return Ok(true);
        }

        self.publish_lines()?;
        self.publish_snap_guides()?;
        if self.rebuilds % RELOCATE_EVERY == 0 {
            self.arena.relocate();
        }
        Ok(true)
    }

    fn publish_all(&mut self) -> Result<(), DecodeError> {
        self.publish_triangles()?;
        self.publish_lines()?;
        self.publish_glyphs()?;
        self.publish_selection()?;
        self.publish_snap_guides()?;
        self.publish_atlas()
    }

    fn publish_vertices<V: bytemuck::Pod>(
        arena: &mut ByteArena,
        previous: BufferMeta,
        vertices: &[V],
    ) -> Result<BufferMeta, DecodeError> {
        Ok(BufferMeta {
            ptr: arena.push_bytes(bytemuck::cast_slice(vertices))?,
            element_count: vertices.len() as u32,
            generation: previous.generation.wrapping_add(1),
            byte_stride: size_of::<V>() as u32,
        })
    }

    /// A 3x3 checker of filled squares.
    fn publish_triangles(&mut self) -> Result<(), DecodeError> {
        let mut vertices = Vec::with_capacity(9 * 6);
        for row in 0..3 {
            for col in 0..3 {
                if (row + col) % 2 == 1 {
                    continue;
                }
                let shade = 0.25 + 0.2 * (row * 3 + col) as f32 / 8.0;
                let color = [shade, 0.3, 0.55 - shade * 0.5, 1.0];
                let r = Rect::new(-150.0 + col as f32 * 100.0, -150.0 + row as f32 * 100.0, 100.0, 100.0);
                let [a, b, c, d] = r.corners();
                for p in [a, b, c, a, c, d] {
                    vertices.push(GeometryVertex::new(p.x, p.y, color));
                }
            }
        }
        self.triangles = Self::publish_vertices(&mut self.arena, self.triangles, &vertices)?;
        Ok(())
    }

    /// Grid plus a star that turns a notch on every rebuild.
    fn publish_lines(&mut self) -> Result<(), DecodeError> {
        let mut vertices = Vec::new();
        let mut line = |a: Vec2, b: Vec2, color| {
            vertices.push(GeometryVertex::new(a.x, a.y, color));
            vertices.push(GeometryVertex::new(b.x, b.y, color));
        };

        for i in -5..=5 {
            let at = i as f32 * 50.0;
            line(Vec2::new(at, -250.0), Vec2::new(at, 250.0), GRID);
            line(Vec2::new(-250.0, at), Vec2::new(250.0, at), GRID);
        }

        let tips = self.star_tips();
        for k in 0..tips.len() {
            line(tips[k], tips[(k + 1) % tips.len()], STROKE);
        }

        self.lines = Self::publish_vertices(&mut self.arena, self.lines, &vertices)?;
        Ok(())
    }

    /// Star points in pentagram order; the star turns a notch per rebuild.
    fn star_tips(&self) -> [Vec2; 5] {
        let spin = self.rebuilds as f32 * 0.15;
        std::array::from_fn(|k| {
            let a = spin + k as f32 * TAU * 2.0 / 5.0;
            Vec2::new(a.cos(), a.sin()) * 120.0
        })
    }

    /// One quad per atlas shape, in a row above the checker.
    fn publish_glyphs(&mut self) -> Result<(), DecodeError> {
        let mut vertices = Vec::with_capacity(Shape::ALL.len() * 6);
        for (i, shape) in Shape::ALL.into_iter().enumerate() {
            let size = 32.0 + 16.0 * i as f32;
            let rect = Rect::new(-180.0 + i as f32 * 90.0, 180.0, size, size);
            vertices.extend(GlyphVertex::quad(rect, shape.uv(), TEXT));
        }
        self.glyphs = Self::publish_vertices(&mut self.arena, self.glyphs, &vertices)?;
        Ok(())
    }

    /// Writes one layer's records and payload and bumps its generation.
    fn publish_overlay(&mut self, layer: OverlayLayer, items: Records<'_>) -> Result<(), DecodeError> {
        let mut payload: Vec<f32> = Vec::new();
        let mut records = Vec::with_capacity(items.len());
        for &(kind, flags, points) in items {
            records.push(PrimitiveRecord {
                kind,
                flags,
                count: points.len() as u32,
                offset: payload.len() as u32,
            });
            payload.extend(points.iter().flatten());
        }

        let bytes: Vec<u8> = records.iter().flat_map(|r| r.to_le_bytes()).collect();
        let previous = self.overlays[layer.index()];
        self.overlays[layer.index()] = OverlayMeta {
            generation: previous.generation.wrapping_add(1),
            primitive_count: records.len() as u32,
            float_count: payload.len() as u32,
            primitives_ptr: self.arena.push_bytes(&bytes)?,
            data_ptr: self.arena.push_f32s(&payload)?,
        };
        Ok(())
    }

    /// Outline around the checker with grips on its corners, plus an accented
    /// and a hidden record.
    fn publish_selection(&mut self) -> Result<(), DecodeError> {
        let plain = PrimitiveFlags::empty();
        self.publish_overlay(
            OverlayLayer::SelectionOutline,
            &[
                (PrimitiveKind::Rect, plain, &[[-160.0, -160.0], [160.0, 160.0]]),
                (PrimitiveKind::Polyline, plain, &[[-240.0, -230.0], [-200.0, -210.0], [-160.0, -230.0]]),
                (
                    PrimitiveKind::Polygon,
                    PrimitiveFlags::ACCENT,
                    &[[180.0, -200.0], [230.0, -180.0], [220.0, -130.0], [170.0, -140.0]],
                ),
                (PrimitiveKind::Segment, PrimitiveFlags::HIDDEN, &[[-250.0, 250.0], [250.0, -250.0]]),
            ],
        )?;
        self.publish_overlay(
            OverlayLayer::SelectionHandles,
            &[(
                PrimitiveKind::Point,
                plain,
                &[[-160.0, -160.0], [160.0, -160.0], [160.0, 160.0], [-160.0, 160.0], [0.0, 0.0]],
            )],
        )
    }

    /// Crosshair on the star's first tip; follows it on every rebuild.
    fn publish_snap_guides(&mut self) -> Result<(), DecodeError> {
        let tip = self.star_tips()[0];
        self.publish_overlay(
            OverlayLayer::SnapGuides,
            &[(
                PrimitiveKind::Segment,
                PrimitiveFlags::empty(),
                &[[tip.x, -250.0], [tip.x, 250.0], [-250.0, tip.y], [250.0, tip.y]],
            )],
        )
    }

    fn publish_atlas(&mut self) -> Result<(), DecodeError> {
        self.atlas = TextureMeta {
            ptr: self.arena.push_bytes(&self.atlas_texels)?,
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            byte_count: self.atlas_texels.len() as u32,
            generation: self.atlas.generation.wrapping_add(1),
        };
        Ok(())
    }
}

impl EngineSource for DemoEngine {
    fn memory_view(&self) -> MemoryView<'_> {
        self.arena.view()
    }

    fn buffer_meta(&self, buffer: GeometryBuffer) -> BufferMeta {
        match buffer {
            GeometryBuffer::Triangles => self.triangles,
            GeometryBuffer::Lines => self.lines,
            GeometryBuffer::Glyphs => self.glyphs,
        }
    }

    fn overlay_meta(&self, layer: OverlayLayer) -> OverlayMeta {
        self.overlays[layer.index()]
    }

    fn atlas_meta(&self) -> TextureMeta {
        self.atlas
    }
}
