//! Engine boundary.

use crate::arena::MemoryView;
use crate::wire::{BufferMeta, OverlayMeta, TextureMeta};

/// Vertex buffers the engine publishes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GeometryBuffer {
    Triangles,
    Lines,
    Glyphs,
}

/// Overlay record buffers the engine publishes, in draw order.
///
/// Each layer carries its own metadata and generation, so a moving snap guide
/// does not re-expand the selection.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OverlayLayer {
    SelectionOutline,
    SelectionHandles,
    SnapGuides,
}

impl OverlayLayer {
    pub const ALL: [OverlayLayer; 3] =
        [OverlayLayer::SelectionOutline, OverlayLayer::SelectionHandles, OverlayLayer::SnapGuides];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Read-only view of a native engine, queried afresh every frame.
///
/// Metadata is only meaningful against the view returned in the same frame:
/// a reallocation between the two invalidates every pointer.
pub trait EngineSource {
    /// Current memory block.
    fn memory_view(&self) -> MemoryView<'_>;

    fn buffer_meta(&self, buffer: GeometryBuffer) -> BufferMeta;

    fn overlay_meta(&self, layer: OverlayLayer) -> OverlayMeta;

    fn atlas_meta(&self) -> TextureMeta;
}
