//! Render passes.
//!
//! Each pass owns one program and one growable vertex buffer, re-uploads only
//! when the engine republishes its buffer, and draws against a [`Backend`].
//! Geometry arrives in world units (Y-up); the vertex shader applies the view
//! transform.

mod backend;
mod ctx;
mod geometry;
mod glyph;
mod overlay;
mod pass;
mod registry;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    AttributeFormat, Backend, DrawCall, ProgramDesc, Topology, VertexAttribute, VertexLayout, ViewUniforms,
    ATLAS_BINDINGS, VIEW_UNIFORM_FIELDS,
};
pub use ctx::{FrameParams, RenderTarget};
pub use geometry::{
    GeometryVertex, GEOMETRY_LAYOUT, LINES, SELECTION_HANDLES, SELECTION_OUTLINE, SNAP_GUIDES, TRIANGLES,
};
pub use glyph::{GlyphPass, GlyphVertex, GLYPHS};
pub use overlay::{expand_primitives, ExpandReport, OverlayPass, OverlayStyle};
pub use pass::RenderPass;
pub use registry::{PassKind, PassRegistry, SyncReport};
pub use wgpu_backend::{WgpuBackend, WgpuProgram, WgpuTexture, WgpuVertexBuffer};
