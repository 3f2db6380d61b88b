//! Test doubles: a backend that records instead of rendering, and an engine
//! that publishes buffers from a [`ByteArena`].

use crate::arena::{ByteArena, MemoryView};
use crate::error::PassError;
use crate::render::geometry::GeometryVertex;
use crate::render::glyph::GlyphVertex;
use crate::source::{EngineSource, GeometryBuffer, OverlayLayer};
use crate::wire::{BufferMeta, OverlayMeta, PrimitiveRecord, TextureMeta};

use super::backend::{Backend, DrawCall, ProgramDesc, ViewUniforms};

#[derive(Debug)]
pub struct RecordedProgram {
    pub label: &'static str,
}

#[derive(Debug)]
pub struct RecordedBuffer {
    pub id: u64,
    pub capacity: u64,
}

#[derive(Debug)]
pub struct RecordedTexture {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub label: &'static str,
    pub vertex_count: u32,
    pub uniforms: ViewUniforms,
    pub atlas: Option<u64>,
}

/// Counts every GPU operation. `fail_program` makes `create_program` fail for
/// the program with that label. Limits default to wgpu's downlevel values.
#[derive(Debug)]
pub struct RecordingBackend {
    pub fail_program: Option<&'static str>,
    pub programs_created: usize,
    pub programs_destroyed: usize,
    pub buffers_created: usize,
    pub buffers_destroyed: usize,
    pub vertex_uploads: usize,
    pub last_upload: Vec<u8>,
    pub textures_created: usize,
    pub textures_destroyed: usize,
    pub texture_writes: usize,
    pub draws: Vec<RecordedDraw>,
    pub next_id: u64,
    pub max_texture_dimension: u32,
    pub max_buffer_size: u64,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            fail_program: None,
            programs_created: 0,
            programs_destroyed: 0,
            buffers_created: 0,
            buffers_destroyed: 0,
            vertex_uploads: 0,
            last_upload: Vec::new(),
            textures_created: 0,
            textures_destroyed: 0,
            texture_writes: 0,
            draws: Vec::new(),
            next_id: 0,
            max_texture_dimension: 8192,
            max_buffer_size: 256 << 20,
        }
    }
}

impl Backend for RecordingBackend {
    type Program = RecordedProgram;
    type VertexBuffer = RecordedBuffer;
    type Texture = RecordedTexture;
    type Target<'t> = ();

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<RecordedProgram, PassError> {
        if self.fail_program == Some(desc.label) {
            return Err(PassError::ShaderCompile {
                label: desc.label,
                message: "rejected by test backend".to_owned(),
            });
        }
        self.programs_created += 1;
        Ok(RecordedProgram { label: desc.label })
    }

    fn destroy_program(&mut self, _program: RecordedProgram) {
        self.programs_destroyed += 1;
    }

    fn create_vertex_buffer(&mut self, _label: &'static str, capacity_bytes: u64) -> RecordedBuffer {
        assert!(capacity_bytes <= self.max_buffer_size, "buffer of {capacity_bytes} bytes past device limit");
        self.buffers_created += 1;
        self.next_id += 1;
        RecordedBuffer { id: self.next_id, capacity: capacity_bytes }
    }

    fn vertex_buffer_capacity(&self, buffer: &RecordedBuffer) -> u64 {
        buffer.capacity
    }

    fn write_vertices(&mut self, buffer: &RecordedBuffer, bytes: &[u8]) {
        assert!(bytes.len() as u64 <= buffer.capacity, "upload overflows buffer {}", buffer.id);
        self.vertex_uploads += 1;
        self.last_upload = bytes.to_vec();
    }

    fn destroy_vertex_buffer(&mut self, _buffer: RecordedBuffer) {
        self.buffers_destroyed += 1;
    }

    fn create_texture(&mut self, _label: &'static str, width: u32, height: u32) -> RecordedTexture {
        assert!(
            width.max(height) <= self.max_texture_dimension,
            "{width}x{height} texture past device limit"
        );
        self.textures_created += 1;
        self.next_id += 1;
        RecordedTexture { id: self.next_id }
    }

    fn write_texture(&mut self, _texture: &RecordedTexture, width: u32, height: u32, rgba: &[u8]) {
        assert_eq!(rgba.len(), (width * height * 4) as usize);
        self.texture_writes += 1;
    }

    fn destroy_texture(&mut self, _texture: RecordedTexture) {
        self.textures_destroyed += 1;
    }

    fn draw(&mut self, _target: &mut (), program: &mut RecordedProgram, call: DrawCall<'_, Self>) {
        self.draws.push(RecordedDraw {
            label: program.label,
            vertex_count: call.vertex_count,
            uniforms: call.uniforms,
            atlas: call.atlas.map(|t| t.id),
        });
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_texture_dimension
    }

    fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }
}

/// Engine stand-in publishing buffers out of an arena. Every setter bumps the
/// buffer's generation, like the native engine does on mutation.
pub struct FakeEngine {
    pub arena: ByteArena,
    pub triangles: BufferMeta,
    pub lines: BufferMeta,
    pub glyphs: BufferMeta,
    pub overlays: [OverlayMeta; 3],
    pub atlas: TextureMeta,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            arena: ByteArena::with_capacity(4096),
            triangles: BufferMeta::default(),
            lines: BufferMeta::default(),
            glyphs: BufferMeta::default(),
            overlays: [OverlayMeta::default(); 3],
            atlas: TextureMeta::default(),
        }
    }

    fn vertex_meta<V: bytemuck::Pod>(arena: &mut ByteArena, previous: BufferMeta, vertices: &[V]) -> BufferMeta {
        BufferMeta {
            ptr: arena.push_bytes(bytemuck::cast_slice(vertices)).unwrap(),
            element_count: vertices.len() as u32,
            generation: previous.generation + 1,
            byte_stride: size_of::<V>() as u32,
        }
    }

    pub fn set_triangles(&mut self, vertices: &[GeometryVertex]) {
        self.triangles = Self::vertex_meta(&mut self.arena, self.triangles, vertices);
    }

    pub fn set_lines(&mut self, vertices: &[GeometryVertex]) {
        self.lines = Self::vertex_meta(&mut self.arena, self.lines, vertices);
    }

    pub fn set_glyphs(&mut self, vertices: &[GlyphVertex]) {
        self.glyphs = Self::vertex_meta(&mut self.arena, self.glyphs, vertices);
    }

    pub fn set_overlay(&mut self, layer: OverlayLayer, records: &[PrimitiveRecord], payload: &[f32]) {
        let bytes: Vec<u8> = records.iter().flat_map(|r| r.to_le_bytes()).collect();
        let previous = self.overlays[layer.index()];
        self.overlays[layer.index()] = OverlayMeta {
            generation: previous.generation + 1,
            primitive_count: records.len() as u32,
            float_count: payload.len() as u32,
            primitives_ptr: self.arena.push_bytes(&bytes).unwrap(),
            data_ptr: self.arena.push_f32s(payload).unwrap(),
        };
    }

    pub fn set_atlas(&mut self, width: u32, height: u32, rgba: &[u8]) {
        self.atlas = TextureMeta {
            ptr: self.arena.push_bytes(rgba).unwrap(),
            width,
            height,
            byte_count: rgba.len() as u32,
            generation: self.atlas.generation + 1,
        };
    }
}

impl EngineSource for FakeEngine {
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
