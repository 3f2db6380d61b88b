//! GPU seam.
//!
//! Passes talk to the GPU only through [`Backend`], so the per-frame logic
//! (change detection, capacity growth, draw gating) runs unchanged against
//! the production wgpu backend and the recording backend used in tests.

use bytemuck::{Pod, Zeroable};

use crate::error::PassError;

// ── program description ───────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Topology {
    TriangleList,
    LineList,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    pub const fn size(self) -> u32 {
        match self {
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
        }
    }
}

/// One vertex input. `name` must be declared by the shader source.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    pub format: AttributeFormat,
    pub offset: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Checks that every attribute fits inside the stride and that locations
    /// are unique.
    pub fn validate(&self, label: &'static str) -> Result<(), PassError> {
        let invalid = |reason: String| PassError::InvalidLayout { label, reason };

        if self.stride == 0 || self.stride % 4 != 0 {
            return Err(invalid(format!("stride {} is not a positive multiple of 4", self.stride)));
        }
        for (i, attr) in self.attributes.iter().enumerate() {
            let end = attr.offset + attr.format.size();
            if end > self.stride {
                return Err(invalid(format!(
                    "attribute `{}` ends at byte {end}, past stride {}",
                    attr.name, self.stride
                )));
            }
            if self.attributes[..i].iter().any(|a| a.location == attr.location) {
                return Err(invalid(format!("location {} used twice", attr.location)));
            }
        }
        Ok(())
    }
}

/// Uniform names every program must declare.
pub const VIEW_UNIFORM_FIELDS: [&str; 5] =
    ["view_scale", "pixel_ratio", "view_translate", "canvas_size", "px_range"];

/// Atlas binding names for programs that sample the glyph atlas.
pub const ATLAS_BINDINGS: [&str; 2] = ["atlas_texture", "atlas_sampler"];

/// Everything a backend needs to build one GPU program.
#[derive(Debug, Copy, Clone)]
pub struct ProgramDesc {
    pub label: &'static str,
    pub source: &'static str,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub samples_atlas: bool,
}

impl ProgramDesc {
    /// Backend-independent checks run before any GPU object is created.
    pub fn validate(&self) -> Result<(), PassError> {
        self.layout.validate(self.label)?;

        let attributes = self.layout.attributes.iter().map(|a| a.name);
        let atlas = self.samples_atlas.then_some(ATLAS_BINDINGS).into_iter().flatten();
        for name in attributes.chain(VIEW_UNIFORM_FIELDS).chain(atlas) {
            if !declares(self.source, name) {
                return Err(PassError::MissingBinding { label: self.label, name });
            }
        }
        Ok(())
    }
}

/// Whole-word search; `view_scale` does not match `view_scale_x`.
fn declares(source: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    source.match_indices(name).any(|(at, _)| {
        let before = source[..at].chars().next_back();
        let after = source[at + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

// ── uniforms ──────────────────────────────────────────────────────────────

/// Mirrors `ViewUniforms` in the WGSL sources (32 bytes, 16-byte aligned).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view_scale: f32,
    pub pixel_ratio: f32,
    pub view_translate: [f32; 2],
    pub canvas_size: [f32; 2],
    pub px_range: f32,
    pub _pad: f32,
}

const _: () = assert!(size_of::<ViewUniforms>() == 32);

// ── backend trait ─────────────────────────────────────────────────────────

/// One draw submission.
pub struct DrawCall<'a, B: Backend + ?Sized> {
    pub vertex_buffer: &'a B::VertexBuffer,
    pub vertex_count: u32,
    pub uniforms: ViewUniforms,
    pub atlas: Option<&'a B::Texture>,
}

/// GPU operations the passes need.
///
/// Draws use standard (non-premultiplied) alpha blending, no depth test, and
/// load the existing target contents.
pub trait Backend {
    type Program;
    type VertexBuffer;
    type Texture;
    /// Per-frame render destination.
    type Target<'t>;

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<Self::Program, PassError>;
    fn destroy_program(&mut self, program: Self::Program);

    fn create_vertex_buffer(&mut self, label: &'static str, capacity_bytes: u64) -> Self::VertexBuffer;
    fn vertex_buffer_capacity(&self, buffer: &Self::VertexBuffer) -> u64;
    fn write_vertices(&mut self, buffer: &Self::VertexBuffer, bytes: &[u8]);
    fn destroy_vertex_buffer(&mut self, buffer: Self::VertexBuffer);

    /// RGBA8 linear texture with linear filtering.
    fn create_texture(&mut self, label: &'static str, width: u32, height: u32) -> Self::Texture;
    fn write_texture(&mut self, texture: &Self::Texture, width: u32, height: u32, rgba: &[u8]);
    fn destroy_texture(&mut self, texture: Self::Texture);

    fn draw(&mut self, target: &mut Self::Target<'_>, program: &mut Self::Program, call: DrawCall<'_, Self>);

    /// Largest width or height `create_texture` accepts.
    fn max_texture_dimension(&self) -> u32;
    /// Largest size in bytes `create_vertex_buffer` accepts.
    fn max_buffer_size(&self) -> u64;
}
