//! MSDF glyph pass.
//!
//! Glyph quads come from the engine as a plain vertex buffer; the atlas they
//! sample is an RGBA8 texture the engine bakes and republishes whenever it
//! packs new glyphs. Per-pixel coverage is computed in the shader (see
//! [`crate::msdf`] for the CPU mirror).

use bytemuck::{Pod, Zeroable};

use crate::arena::MemoryView;
use crate::config::BridgeConfig;
use crate::coords::Rect;
use crate::error::PassError;
use crate::upload::UploadCache;
use crate::wire::{BufferMeta, GLYPH_FLOATS_PER_VERTEX, GLYPH_VERTICES_PER_QUAD, TextureMeta};

use super::backend::{AttributeFormat, Backend, ProgramDesc, Topology, VertexAttribute, VertexLayout};
use super::ctx::FrameParams;
use super::pass::RenderPass;

/// `x, y, z, u, v, r, g, b, a`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

const _: () = assert!(size_of::<GlyphVertex>() == GLYPH_FLOATS_PER_VERTEX * 4);

impl GlyphVertex {
    /// Two triangles covering `rect` (world units, Y-up) textured with `uv`
    /// (atlas units, Y-down). The bottom edge of `rect` samples `uv.max.y`.
    pub fn quad(rect: Rect, uv: Rect, color: [f32; 4]) -> [GlyphVertex; GLYPH_VERTICES_PER_QUAD] {
        let v = |x: f32, y: f32, u: f32, t: f32| GlyphVertex { position: [x, y, 0.0], uv: [u, t], color };
        let (x0, y0, x1, y1) = (rect.min.x, rect.min.y, rect.max.x, rect.max.y);
        let (u0, v0, u1, v1) = (uv.min.x, uv.min.y, uv.max.x, uv.max.y);
        [
            v(x0, y0, u0, v1),
            v(x1, y0, u1, v1),
            v(x1, y1, u1, v0),
            v(x0, y0, u0, v1),
            v(x1, y1, u1, v0),
            v(x0, y1, u0, v0),
        ]
    }
}

const GLYPH_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute { name: "position", location: 0, format: AttributeFormat::Float32x3, offset: 0 },
    VertexAttribute { name: "uv", location: 1, format: AttributeFormat::Float32x2, offset: 12 },
    VertexAttribute { name: "color", location: 2, format: AttributeFormat::Float32x4, offset: 20 },
];

pub static GLYPHS: ProgramDesc = ProgramDesc {
    label: "vectra glyphs",
    source: include_str!("shaders/glyph.wgsl"),
    layout: VertexLayout {
        stride: size_of::<GlyphVertex>() as u32,
        attributes: &GLYPH_ATTRIBUTES,
    },
    topology: Topology::TriangleList,
    samples_atlas: true,
};

struct ResidentAtlas<B: Backend> {
    texture: B::Texture,
    width: u32,
    height: u32,
}

/// Glyph quads plus the atlas texture they sample.
///
/// Draws nothing until an atlas is resident.
pub struct GlyphPass<B: Backend> {
    pass: RenderPass<B>,
    atlas: Option<ResidentAtlas<B>>,
    atlas_cache: UploadCache,
    warned_atlas: bool,
}

impl<B: Backend> GlyphPass<B> {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            pass: RenderPass::new(&GLYPHS, config),
            atlas: None,
            atlas_cache: UploadCache::new(),
            warned_atlas: false,
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.pass.is_initialized()
    }

    #[inline]
    pub fn has_atlas(&self) -> bool {
        self.atlas.is_some()
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.pass.vertex_count()
    }

    pub fn initialize(&mut self, backend: &mut B) -> Result<(), PassError> {
        self.pass.initialize(backend)
    }

    pub fn dispose(&mut self, backend: &mut B) {
        self.release_atlas(backend);
        self.atlas_cache.invalidate();
        self.pass.dispose(backend);
    }

    /// Uploads glyph quads when they changed.
    pub fn sync(&mut self, backend: &mut B, view: &MemoryView<'_>, meta: &BufferMeta) -> bool {
        self.pass.sync(backend, view, meta)
    }

    /// Uploads the atlas when it changed, recreating the texture when its
    /// dimensions moved. Returns `true` when texels were written.
    pub fn sync_atlas(&mut self, backend: &mut B, view: &MemoryView<'_>, meta: &TextureMeta) -> bool {
        if !self.pass.is_initialized() {
            return false;
        }
        let block = view.block();
        let key = meta.upload_key();
        if !self.atlas_cache.should_reupload(block, key) {
            return false;
        }

        if meta.is_empty() {
            self.release_atlas(backend);
            self.atlas_cache.mark(block, key);
            return false;
        }

        let expected = meta.expected_byte_count().filter(|&n| n == meta.byte_count as usize);
        let Some(byte_len) = expected else {
            if !self.warned_atlas {
                log::warn!(
                    "{}: atlas is {}x{} but carries {} bytes; keeping previous atlas",
                    GLYPHS.label,
                    meta.width,
                    meta.height,
                    meta.byte_count
                );
                self.warned_atlas = true;
            }
            self.atlas_cache.mark(block, key);
            return false;
        };

        let limit = backend.max_texture_dimension();
        if meta.width.max(meta.height) > limit {
            if !self.warned_atlas {
                log::warn!(
                    "{}: atlas is {}x{}, device allows {limit}; keeping previous atlas",
                    GLYPHS.label,
                    meta.width,
                    meta.height
                );
                self.warned_atlas = true;
            }
            self.atlas_cache.mark(block, key);
            return false;
        }

        let rgba = match self.atlas_cache.stage(view, key, byte_len) {
            Ok(Some(rgba)) => rgba,
            Ok(None) => return false,
            Err(err) => {
                if !self.warned_atlas {
                    log::warn!("{}: atlas: {err}", GLYPHS.label);
                    self.warned_atlas = true;
                }
                self.atlas_cache.invalidate();
                return false;
            }
        };
        self.warned_atlas = false;

        let resized = self
            .atlas
            .as_ref()
            .is_none_or(|a| a.width != meta.width || a.height != meta.height);
        if resized {
            self.release_atlas(backend);
            let texture = backend.create_texture("vectra glyph atlas", meta.width, meta.height);
            self.atlas = Some(ResidentAtlas { texture, width: meta.width, height: meta.height });
            log::debug!("{}: atlas texture {}x{}", GLYPHS.label, meta.width, meta.height);
        }
        if let Some(atlas) = &self.atlas {
            backend.write_texture(&atlas.texture, atlas.width, atlas.height, rgba);
        }
        log::debug!("{}: atlas uploaded (generation {})", GLYPHS.label, meta.generation);
        true
    }

    pub fn draw(&mut self, backend: &mut B, target: &mut B::Target<'_>, frame: &FrameParams) {
        let atlas = self.atlas.as_ref().map(|a| &a.texture);
        self.pass.draw(backend, target, frame, atlas);
    }

    fn release_atlas(&mut self, backend: &mut B) {
        if let Some(atlas) = self.atlas.take() {
            backend.destroy_texture(atlas.texture);
        }
    }
}
