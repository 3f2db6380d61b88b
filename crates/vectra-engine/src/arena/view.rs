use crate::error::DecodeError;

// Payloads are reinterpreted in place; the wire is little-endian.
#[cfg(not(target_endian = "little"))]
compile_error!("vectra-engine reads engine memory in place and supports little-endian hosts only");

/// Opaque identity of a foreign memory block.
///
/// Changes exactly when the block is reallocated. Two views with equal
/// `BlockId`s alias the same allocation.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct BlockId(u64);

impl BlockId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Borrowed, bounds-checked view over foreign memory.
///
/// Everything resolved through a view borrows it, so nothing derived from
/// foreign memory can outlive the frame that fetched the view.
#[derive(Debug, Copy, Clone)]
pub struct MemoryView<'a> {
    bytes: &'a [u8],
    block: BlockId,
}

impl<'a> MemoryView<'a> {
    #[inline]
    pub const fn new(bytes: &'a [u8], block: BlockId) -> Self {
        Self { bytes, block }
    }

    #[inline]
    pub fn block(&self) -> BlockId {
        self.block
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(DecodeError::OutOfBounds {
                offset,
                len,
                available: self.bytes.len(),
            })?;
        Ok(&self.bytes[offset..end])
    }

    /// Zero-copy `f32` view over `count` elements starting at byte offset `ptr`.
    ///
    /// Elements are read in native byte order, which matches the wire's
    /// little-endian encoding on every supported host.
    pub fn f32s(&self, ptr: usize, count: usize) -> Result<&'a [f32], DecodeError> {
        let len = count.checked_mul(size_of::<f32>()).ok_or(DecodeError::OutOfBounds {
            offset: ptr,
            len: usize::MAX,
            available: self.bytes.len(),
        })?;
        let raw = self.bytes(ptr, len)?;
        bytemuck::try_cast_slice(raw).map_err(|_| DecodeError::Misaligned {
            ptr,
            align: align_of::<f32>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_view(words: &[u32]) -> MemoryView<'_> {
        MemoryView::new(bytemuck::cast_slice(words), BlockId::new(1))
    }

    #[test]
    fn bytes_within_bounds() {
        let words = [0x0403_0201u32, 0x0807_0605];
        let view = words_view(&words);
        assert_eq!(view.bytes(2, 4).unwrap(), &[3, 4, 5, 6]);
    }

    #[test]
    fn bytes_past_end_is_out_of_bounds() {
        let words = [0u32; 2];
        let view = words_view(&words);
        assert_eq!(
            view.bytes(4, 5),
            Err(DecodeError::OutOfBounds { offset: 4, len: 5, available: 8 })
        );
    }

    #[test]
    fn bytes_offset_overflow_is_out_of_bounds() {
        let words = [0u32; 2];
        let view = words_view(&words);
        assert!(matches!(view.bytes(usize::MAX, 2), Err(DecodeError::OutOfBounds { .. })));
    }

    #[test]
    fn f32s_aliases_source_memory() {
        let words = [1.5f32.to_bits(), (-2.0f32).to_bits(), 8.25f32.to_bits()];
        let view = words_view(&words);
        let floats = view.f32s(4, 2).unwrap();
        assert_eq!(floats, &[-2.0, 8.25]);
        assert_eq!(floats.as_ptr() as usize, words[1..].as_ptr() as usize);
    }

    #[test]
    fn f32s_rejects_unaligned_pointer() {
        let words = [0u32; 4];
        let view = words_view(&words);
        assert_eq!(view.f32s(2, 1), Err(DecodeError::Misaligned { ptr: 2, align: 4 }));
    }

    #[test]
    fn f32s_decode_little_endian_wire_bytes() {
        let mut wire = [0u8; 8];
        wire[..4].copy_from_slice(&1.5f32.to_le_bytes());
        wire[4..].copy_from_slice(&(-2.25f32).to_le_bytes());
        let words: [u32; 2] = [
            u32::from_ne_bytes([wire[0], wire[1], wire[2], wire[3]]),
            u32::from_ne_bytes([wire[4], wire[5], wire[6], wire[7]]),
        ];
        assert_eq!(words_view(&words).f32s(0, 2).unwrap(), &[1.5, -2.25]);
    }
}
