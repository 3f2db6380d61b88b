//! Binary layout shared with the native engine.
//!
//! All multi-byte fields are little-endian. Pointers are byte offsets into the
//! engine's linear memory block; `0` means "no buffer".
//!
//! The layout carries no version tag. Strides are cross-checked where the
//! producer reports one (`BufferMeta::byte_stride`), which catches the common
//! field-skew mistakes without a negotiation protocol.

use bitflags::bitflags;

/// Size of one primitive record: `kind:u16, flags:u16, count:u32, offset:u32, _reserved:u32`.
pub const RECORD_STRIDE: usize = 16;

/// Floats per point in an overlay payload (`x, y`).
pub const OVERLAY_FLOATS_PER_POINT: usize = 2;

/// Floats per geometry vertex (`x, y, z, r, g, b, a`).
pub const GEOMETRY_FLOATS_PER_VERTEX: usize = 7;

/// Floats per glyph vertex (`x, y, z, u, v, r, g, b, a`).
pub const GLYPH_FLOATS_PER_VERTEX: usize = 9;

/// Two triangles per glyph quad.
pub const GLYPH_VERTICES_PER_QUAD: usize = 6;

const KIND_AT: usize = 0;
const FLAGS_AT: usize = 2;
const COUNT_AT: usize = 4;
const OFFSET_AT: usize = 8;

const _: () = assert!(OFFSET_AT + size_of::<u32>() <= RECORD_STRIDE);

// ── primitive records ─────────────────────────────────────────────────────

/// Kind tag of a primitive record.
///
/// Values match the engine's overlay kinds. Unrecognized tags are preserved
/// rather than rejected so that newer producers degrade to "not drawn".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    Polyline,
    Polygon,
    Segment,
    Rect,
    Point,
    Unknown(u16),
}

impl PrimitiveKind {
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            1 => Self::Polyline,
            2 => Self::Polygon,
            3 => Self::Segment,
            4 => Self::Rect,
            5 => Self::Point,
            other => Self::Unknown(other),
        }
    }

    pub const fn to_raw(self) -> u16 {
        match self {
            Self::Polyline => 1,
            Self::Polygon => 2,
            Self::Segment => 3,
            Self::Rect => 4,
            Self::Point => 5,
            Self::Unknown(raw) => raw,
        }
    }
}

bitflags! {
    /// Per-record flag bits. Unknown bits are retained.
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct PrimitiveFlags: u16 {
        /// Record is present but must not be drawn.
        const HIDDEN = 1 << 0;
        /// Draw with the accent overlay color.
        const ACCENT = 1 << 1;
    }
}

/// One drawable batch inside a shared float payload.
///
/// `count` is a number of elements (points for overlays); `offset` is a float
/// index into the payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PrimitiveRecord {
    pub kind: PrimitiveKind,
    pub flags: PrimitiveFlags,
    pub count: u32,
    pub offset: u32,
}

impl PrimitiveRecord {
    /// Reads a record from its wire form. `raw` must hold at least
    /// [`RECORD_STRIDE`] bytes.
    pub fn from_le_slice(raw: &[u8]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        Self {
            kind: PrimitiveKind::from_raw(u16_at(KIND_AT)),
            flags: PrimitiveFlags::from_bits_retain(u16_at(FLAGS_AT)),
            count: u32_at(COUNT_AT),
            offset: u32_at(OFFSET_AT),
        }
    }

    /// Producer-side encoding; the reserved tail is zeroed.
    pub fn to_le_bytes(&self) -> [u8; RECORD_STRIDE] {
        let mut out = [0u8; RECORD_STRIDE];
        out[KIND_AT..KIND_AT + 2].copy_from_slice(&self.kind.to_raw().to_le_bytes());
        out[FLAGS_AT..FLAGS_AT + 2].copy_from_slice(&self.flags.bits().to_le_bytes());
        out[COUNT_AT..COUNT_AT + 4].copy_from_slice(&self.count.to_le_bytes());
        out[OFFSET_AT..OFFSET_AT + 4].copy_from_slice(&self.offset.to_le_bytes());
        out
    }

    /// The record's slice of `payload`, or `None` when
    /// `offset + count * floats_per_element` runs past the payload.
    pub fn floats<'p>(&self, payload: &'p [f32], floats_per_element: usize) -> Option<&'p [f32]> {
        let start = self.offset as usize;
        let len = (self.count as usize).checked_mul(floats_per_element)?;
        payload.get(start..start.checked_add(len)?)
    }
}

// ── metadata ──────────────────────────────────────────────────────────────

/// Fields the change-detector compares between frames.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct UploadKey {
    pub ptr: u32,
    pub element_count: u32,
    pub generation: u32,
}

/// Metadata of a primitive-record buffer plus its float payload.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct OverlayMeta {
    pub generation: u32,
    pub primitive_count: u32,
    pub float_count: u32,
    pub primitives_ptr: u32,
    pub data_ptr: u32,
}

impl OverlayMeta {
    /// True when there is nothing to decode.
    pub fn is_empty(&self) -> bool {
        self.primitives_ptr == 0
            || self.data_ptr == 0
            || self.primitive_count == 0
            || self.float_count == 0
    }

    pub fn upload_key(&self) -> UploadKey {
        UploadKey {
            ptr: self.primitives_ptr,
            element_count: self.primitive_count,
            generation: self.generation,
        }
    }
}

/// Metadata of a fixed-stride vertex buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BufferMeta {
    pub ptr: u32,
    pub element_count: u32,
    pub generation: u32,
    pub byte_stride: u32,
}

impl BufferMeta {
    pub fn is_empty(&self) -> bool {
        self.ptr == 0 || self.element_count == 0
    }

    pub fn upload_key(&self) -> UploadKey {
        UploadKey {
            ptr: self.ptr,
            element_count: self.element_count,
            generation: self.generation,
        }
    }
}

/// Metadata of the RGBA8 glyph atlas baked by the engine.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TextureMeta {
    pub ptr: u32,
    pub width: u32,
    pub height: u32,
    pub byte_count: u32,
    pub generation: u32,
}

impl TextureMeta {
    pub fn is_empty(&self) -> bool {
        self.ptr == 0 || self.width == 0 || self.height == 0
    }

    /// `width * height * 4`, or `None` on overflow.
    pub fn expected_byte_count(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4)
    }

    pub fn upload_key(&self) -> UploadKey {
        UploadKey {
            ptr: self.ptr,
            element_count: self.byte_count,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_field_offsets_are_little_endian() {
        let raw: [u8; RECORD_STRIDE] = [
            0x03, 0x00, // kind = Segment
            0x02, 0x00, // flags = ACCENT
            0x02, 0x00, 0x00, 0x00, // count = 2
            0x0c, 0x01, 0x00, 0x00, // offset = 268
            0xff, 0xff, 0xff, 0xff, // reserved
        ];
        let rec = PrimitiveRecord::from_le_slice(&raw);
        assert_eq!(rec.kind, PrimitiveKind::Segment);
        assert_eq!(rec.flags, PrimitiveFlags::ACCENT);
        assert_eq!(rec.count, 2);
        assert_eq!(rec.offset, 268);
    }

    #[test]
    fn unknown_kind_and_flag_bits_survive() {
        let rec = PrimitiveRecord {
            kind: PrimitiveKind::Unknown(42),
            flags: PrimitiveFlags::from_bits_retain(0x8001),
            count: 1,
            offset: 0,
        };
        let back = PrimitiveRecord::from_le_slice(&rec.to_le_bytes());
        assert_eq!(back, rec);
        assert!(back.flags.contains(PrimitiveFlags::HIDDEN));
    }

    #[test]
    fn record_floats_respects_payload_bounds() {
        let payload = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
        let rec = |count, offset| PrimitiveRecord {
            kind: PrimitiveKind::Polyline,
            flags: PrimitiveFlags::empty(),
            count,
            offset,
        };
        assert_eq!(rec(2, 2).floats(&payload, 2), Some(&payload[2..6]));
        assert_eq!(rec(3, 2).floats(&payload, 2), None);
        assert_eq!(rec(1, 7).floats(&payload, 2), None);
        assert_eq!(rec(u32::MAX, 0).floats(&payload, 2), None);
    }

    #[test]
    fn overlay_meta_emptiness() {
        let full = OverlayMeta {
            generation: 1,
            primitive_count: 1,
            float_count: 4,
            primitives_ptr: 8,
            data_ptr: 24,
        };
        assert!(!full.is_empty());
        assert!(OverlayMeta { data_ptr: 0, ..full }.is_empty());
        assert!(OverlayMeta { float_count: 0, ..full }.is_empty());
    }

    #[test]
    fn texture_expected_size() {
        let meta = TextureMeta { ptr: 8, width: 4, height: 2, byte_count: 32, generation: 0 };
        assert_eq!(meta.expected_byte_count(), Some(32));
    }
}
