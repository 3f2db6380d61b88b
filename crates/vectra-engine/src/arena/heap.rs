use crate::error::DecodeError;

use super::view::{BlockId, MemoryView};

/// Bytes at the start of every block that are never handed out, so that
/// offset `0` can keep meaning "null".
const NULL_GUARD: usize = 8;

const WORD: usize = size_of::<u32>();

/// Growable linear memory block with a bump allocator.
///
/// Backed by `u32` words so every allocation (and therefore every `f32`
/// payload) is 4-byte aligned. Growing reallocates the backing storage and
/// assigns a fresh [`BlockId`], exactly like a native heap whose linear memory
/// was enlarged: offsets stay numerically valid, but consumers must treat any
/// cached view of the old block as stale.
#[derive(Debug)]
pub struct ByteArena {
    words: Vec<u32>,
    used: usize,
    block: BlockId,
    next_block: u64,
}

impl ByteArena {
    /// Creates an arena with room for at least `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let words = capacity.max(NULL_GUARD).div_ceil(WORD);
        Self {
            words: vec![0; words],
            used: NULL_GUARD,
            block: BlockId::new(1),
            next_block: 2,
        }
    }

    /// View over the whole current block.
    pub fn view(&self) -> MemoryView<'_> {
        MemoryView::new(bytemuck::cast_slice(&self.words), self.block)
    }

    #[inline]
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Bytes handed out so far (including the null guard).
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Size of the current block in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len() * WORD
    }

    /// Reserves `len` bytes and returns their offset. Grows (and relocates)
    /// the block when it is full. Zero-length requests return `0`.
    ///
    /// Fails without touching the block when the allocation would end past
    /// the 32-bit address space the wire format can express.
    pub fn alloc(&mut self, len: usize) -> Result<u32, DecodeError> {
        if len == 0 {
            return Ok(0);
        }
        let len = len.next_multiple_of(WORD);
        let needed = self
            .used
            .checked_add(len)
            .ok_or(DecodeError::PointerOverflow { offset: usize::MAX })?;
        wire_offset(needed)?;
        let ptr = wire_offset(self.used)?;
        if needed > self.capacity() {
            self.grow_to(needed.max(self.capacity() * 2));
        }
        self.used = needed;
        Ok(ptr)
    }

    /// Copies `data` to `ptr`.
    pub fn write_bytes(&mut self, ptr: u32, data: &[u8]) -> Result<(), DecodeError> {
        let start = ptr as usize;
        let available = self.capacity();
        let end = start
            .checked_add(data.len())
            .filter(|&end| end <= available)
            .ok_or(DecodeError::OutOfBounds { offset: start, len: data.len(), available })?;
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    pub fn write_f32s(&mut self, ptr: u32, data: &[f32]) -> Result<(), DecodeError> {
        if ptr as usize % WORD != 0 {
            return Err(DecodeError::Misaligned { ptr: ptr as usize, align: WORD });
        }
        self.write_bytes(ptr, bytemuck::cast_slice(data))
    }

    /// Allocates and fills in one step.
    pub fn push_bytes(&mut self, data: &[u8]) -> Result<u32, DecodeError> {
        let ptr = self.alloc(data.len())?;
        if ptr != 0 {
            let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words);
            bytes[ptr as usize..ptr as usize + data.len()].copy_from_slice(data);
        }
        Ok(ptr)
    }

    pub fn push_f32s(&mut self, data: &[f32]) -> Result<u32, DecodeError> {
        self.push_bytes(bytemuck::cast_slice(data))
    }

    /// Forgets every allocation. The block (and its identity) is kept.
    pub fn reset(&mut self) {
        self.used = NULL_GUARD;
    }

    /// Moves the contents to a new allocation of the same size.
    pub fn relocate(&mut self) {
        self.grow_to(self.capacity());
    }

    fn grow_to(&mut self, bytes: usize) {
        let mut words = vec![0u32; bytes.div_ceil(WORD)];
        let live = self.used.div_ceil(WORD).min(self.words.len());
        words[..live].copy_from_slice(&self.words[..live]);
        self.words = words;
        self.block = BlockId::new(self.next_block);
        self.next_block += 1;
        log::debug!(
            "arena relocated: {} bytes, block {}",
            self.capacity(),
            self.block.raw()
        );
    }
}

/// Narrows a block offset to the 32-bit pointer the wire carries.
fn wire_offset(offset: usize) -> Result<u32, DecodeError> {
    u32::try_from(offset).map_err(|_| DecodeError::PointerOverflow { offset })
}

impl Default for ByteArena {
    fn default() -> Self {
        Self::with_capacity(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_allocation_is_never_null() {
        let mut arena = ByteArena::with_capacity(64);
        assert_eq!(arena.alloc(4).unwrap(), NULL_GUARD as u32);
    }

    #[test]
    fn allocations_are_word_aligned() {
        let mut arena = ByteArena::with_capacity(64);
        let a = arena.alloc(3).unwrap();
        let b = arena.alloc(5).unwrap();
        assert_eq!(a % 4, 0);
        assert_eq!(b % 4, 0);
        assert_eq!(b - a, 4);
    }

    #[test]
    fn zero_length_alloc_is_null() {
        let mut arena = ByteArena::with_capacity(64);
        assert_eq!(arena.alloc(0).unwrap(), 0);
        assert_eq!(arena.used(), NULL_GUARD);
    }

    #[test]
    fn growth_changes_block_and_keeps_contents() {
        let mut arena = ByteArena::with_capacity(16);
        let ptr = arena.push_f32s(&[1.0, 2.0]).unwrap();
        let before = arena.block();

        let _big = arena.alloc(128).unwrap();

        assert_ne!(arena.block(), before);
        assert!(arena.capacity() >= 16 + 128);
        assert_eq!(arena.view().f32s(ptr as usize, 2).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn relocate_changes_block_only() {
        let mut arena = ByteArena::with_capacity(64);
        let ptr = arena.push_bytes(&[9, 8, 7, 6]).unwrap();
        let cap = arena.capacity();
        let before = arena.block();

        arena.relocate();

        assert_ne!(arena.block(), before);
        assert_eq!(arena.capacity(), cap);
        assert_eq!(arena.view().bytes(ptr as usize, 4).unwrap(), &[9, 8, 7, 6]);
    }

    #[test]
    fn write_past_capacity_fails() {
        let mut arena = ByteArena::with_capacity(16);
        assert!(matches!(
            arena.write_bytes(12, &[0; 8]),
            Err(DecodeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn write_f32s_requires_alignment() {
        let mut arena = ByteArena::with_capacity(64);
        assert_eq!(
            arena.write_f32s(10, &[1.0]),
            Err(DecodeError::Misaligned { ptr: 10, align: 4 })
        );
    }

    // ── 32-bit pointer range ──────────────────────────────────────────────

    #[test]
    fn offsets_inside_u32_narrow_losslessly() {
        assert_eq!(wire_offset(0), Ok(0));
        assert_eq!(wire_offset(u32::MAX as usize), Ok(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn offsets_past_u32_are_rejected() {
        let offset = u32::MAX as usize + 1;
        assert_eq!(
            wire_offset(offset),
            Err(DecodeError::PointerOverflow { offset })
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_alloc_fails_without_growing() {
        let mut arena = ByteArena::with_capacity(64);
        let block = arena.block();

        assert!(matches!(
            arena.alloc(u32::MAX as usize),
            Err(DecodeError::PointerOverflow { .. })
        ));
        assert_eq!(arena.block(), block);
        assert_eq!(arena.used(), NULL_GUARD);
        assert_eq!(arena.alloc(4).unwrap(), NULL_GUARD as u32);
    }
}
