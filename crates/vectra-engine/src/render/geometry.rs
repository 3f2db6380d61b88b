//! Flat-colored geometry programs: filled triangles, engine strokes and the
//! expanded overlay layers all share one vertex format and one shader.

use bytemuck::{Pod, Zeroable};

use crate::wire::GEOMETRY_FLOATS_PER_VERTEX;

use super::backend::{AttributeFormat, ProgramDesc, Topology, VertexAttribute, VertexLayout};

const GEOMETRY_WGSL: &str = include_str!("shaders/geometry.wgsl");

/// `x, y, z, r, g, b, a` in world units and linear RGBA.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct GeometryVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

const _: () = assert!(size_of::<GeometryVertex>() == GEOMETRY_FLOATS_PER_VERTEX * 4);

impl GeometryVertex {
    #[inline]
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self { position: [x, y, 0.0], color }
    }
}

const GEOMETRY_ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute { name: "position", location: 0, format: AttributeFormat::Float32x3, offset: 0 },
    VertexAttribute { name: "color", location: 1, format: AttributeFormat::Float32x4, offset: 12 },
];

pub const GEOMETRY_LAYOUT: VertexLayout = VertexLayout {
    stride: size_of::<GeometryVertex>() as u32,
    attributes: &GEOMETRY_ATTRIBUTES,
};

pub static TRIANGLES: ProgramDesc = ProgramDesc {
    label: "vectra triangles",
    source: GEOMETRY_WGSL,
    layout: GEOMETRY_LAYOUT,
    topology: Topology::TriangleList,
    samples_atlas: false,
};

pub static LINES: ProgramDesc = ProgramDesc {
    label: "vectra lines",
    source: GEOMETRY_WGSL,
    layout: GEOMETRY_LAYOUT,
    topology: Topology::LineList,
    samples_atlas: false,
};

pub static SELECTION_OUTLINE: ProgramDesc = ProgramDesc {
    label: "vectra selection outline",
    source: GEOMETRY_WGSL,
    layout: GEOMETRY_LAYOUT,
    topology: Topology::LineList,
    samples_atlas: false,
};

pub static SELECTION_HANDLES: ProgramDesc = ProgramDesc {
    label: "vectra selection handles",
    source: GEOMETRY_WGSL,
    layout: GEOMETRY_LAYOUT,
    topology: Topology::LineList,
    samples_atlas: false,
};

pub static SNAP_GUIDES: ProgramDesc = ProgramDesc {
    label: "vectra snap guides",
    source: GEOMETRY_WGSL,
    layout: GEOMETRY_LAYOUT,
    topology: Topology::LineList,
    samples_atlas: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_programs_validate() {
        for desc in [&TRIANGLES, &LINES, &SELECTION_OUTLINE, &SELECTION_HANDLES, &SNAP_GUIDES] {
            assert_eq!(desc.validate(), Ok(()), "{}", desc.label);
        }
    }
}
