//! Primitive-record decoder.

use crate::arena::MemoryView;
use crate::error::DecodeError;
use crate::wire::{OverlayMeta, PrimitiveRecord, RECORD_STRIDE};

/// Records plus float payload, both borrowed from foreign memory.
///
/// Records stay in wire form and are decoded on access, so a frame that only
/// inspects a few of them never allocates.
#[derive(Debug, Copy, Clone)]
pub struct DecodedPrimitives<'a> {
    records: &'a [u8],
    payload: &'a [f32],
}

impl<'a> DecodedPrimitives<'a> {
    pub const fn empty() -> Self {
        Self { records: &[], payload: &[] }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len() / RECORD_STRIDE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<PrimitiveRecord> {
        let start = index.checked_mul(RECORD_STRIDE)?;
        self.records
            .get(start..start.checked_add(RECORD_STRIDE)?)
            .map(PrimitiveRecord::from_le_slice)
    }

    pub fn records(self) -> impl ExactSizeIterator<Item = PrimitiveRecord> + 'a {
        self.records
            .chunks_exact(RECORD_STRIDE)
            .map(PrimitiveRecord::from_le_slice)
    }

    /// Zero-copy payload. Aliases foreign memory.
    #[inline]
    pub fn payload(&self) -> &'a [f32] {
        self.payload
    }

    pub fn to_vec(&self) -> Vec<PrimitiveRecord> {
        self.records().collect()
    }
}

/// Interprets `meta` against `view`.
///
/// Null pointers and zero counts decode to an empty result; that is the
/// normal "nothing to draw" state. Out-of-range or misaligned metadata is an
/// error.
pub fn decode_primitives<'a>(
    view: &MemoryView<'a>,
    meta: &OverlayMeta,
) -> Result<DecodedPrimitives<'a>, DecodeError> {
    if meta.is_empty() {
        return Ok(DecodedPrimitives::empty());
    }

    let count = meta.primitive_count as usize;
    let records_len = count.checked_mul(RECORD_STRIDE).ok_or(DecodeError::OutOfBounds {
        offset: meta.primitives_ptr as usize,
        len: usize::MAX,
        available: view.len(),
    })?;
    let records = view.bytes(meta.primitives_ptr as usize, records_len)?;
    let payload = view.f32s(meta.data_ptr as usize, meta.float_count as usize)?;

    Ok(DecodedPrimitives { records, payload })
}
