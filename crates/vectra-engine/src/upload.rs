//! Upload change-detection.
//!
//! Trusts the producer's generation counter: a buffer is re-uploaded when the
//! memory block was reallocated or when its pointer, element count or
//! generation moved. Contents are never hashed.

use crate::arena::{BlockId, MemoryView};
use crate::error::DecodeError;
use crate::wire::UploadKey;

/// What was last pushed to the GPU for one buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UploadSnapshot {
    pub block: BlockId,
    pub key: UploadKey,
}

/// `true` when `cached` does not describe `(block, key)`.
pub fn should_reupload(block: BlockId, key: UploadKey, cached: Option<&UploadSnapshot>) -> bool {
    match cached {
        None => true,
        Some(snapshot) => snapshot.block != block || snapshot.key != key,
    }
}

/// Per-buffer cache entry, owned by the pass that uploads the buffer.
#[derive(Debug, Default)]
pub struct UploadCache {
    last: Option<UploadSnapshot>,
}

impl UploadCache {
    pub const fn new() -> Self {
        Self { last: None }
    }

    #[inline]
    pub fn snapshot(&self) -> Option<&UploadSnapshot> {
        self.last.as_ref()
    }

    pub fn should_reupload(&self, block: BlockId, key: UploadKey) -> bool {
        should_reupload(block, key, self.last.as_ref())
    }

    /// Resolves the bytes to push when the buffer changed.
    ///
    /// Returns `Ok(None)` when the GPU copy is current. A null pointer or zero
    /// count stages an empty slice. The snapshot is only updated once the
    /// range resolved, so a failed read is retried next frame.
    pub fn stage<'v>(
        &mut self,
        view: &MemoryView<'v>,
        key: UploadKey,
        byte_len: usize,
    ) -> Result<Option<&'v [u8]>, DecodeError> {
        let block = view.block();
        if !self.should_reupload(block, key) {
            return Ok(None);
        }

        let bytes = if key.ptr == 0 || key.element_count == 0 {
            &[][..]
        } else {
            view.bytes(key.ptr as usize, byte_len)?
        };

        self.mark(block, key);
        Ok(Some(bytes))
    }

    /// Records `(block, key)` as uploaded without touching memory.
    pub fn mark(&mut self, block: BlockId, key: UploadKey) {
        self.last = Some(UploadSnapshot { block, key });
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ByteArena;

    fn key(ptr: u32, element_count: u32, generation: u32) -> UploadKey {
        UploadKey { ptr, element_count, generation }
    }

    #[test]
    fn identical_frames_upload_once() {
        let mut arena = ByteArena::with_capacity(128);
        let ptr = arena.push_f32s(&[1.0, 2.0, 3.0]).unwrap();
        let mut cache = UploadCache::new();
        let k = key(ptr, 3, 7);

        let view = arena.view();
        assert_eq!(cache.stage(&view, k, 12).unwrap().map(<[u8]>::len), Some(12));
        assert_eq!(cache.stage(&view, k, 12).unwrap(), None);
    }

    #[test]
    fn generation_bump_uploads_exactly_once() {
        let mut arena = ByteArena::with_capacity(128);
        let ptr = arena.push_f32s(&[1.0]).unwrap();
        let mut cache = UploadCache::new();
        let view = arena.view();

        cache.stage(&view, key(ptr, 1, 1), 4).unwrap();
        assert!(cache.stage(&view, key(ptr, 1, 2), 4).unwrap().is_some());
        assert!(cache.stage(&view, key(ptr, 1, 2), 4).unwrap().is_none());
    }

    #[test]
    fn pointer_or_count_change_uploads() {
        let block = BlockId::new(1);
        let cached = UploadSnapshot { block, key: key(8, 4, 1) };
        assert!(!should_reupload(block, key(8, 4, 1), Some(&cached)));
        assert!(should_reupload(block, key(16, 4, 1), Some(&cached)));
        assert!(should_reupload(block, key(8, 5, 1), Some(&cached)));
        assert!(should_reupload(block, key(8, 4, 1), None));
    }

    #[test]
    fn block_reallocation_forces_upload() {
        let mut arena = ByteArena::with_capacity(64);
        let ptr = arena.push_f32s(&[1.0, 2.0]).unwrap();
        let mut cache = UploadCache::new();
        let k = key(ptr, 2, 3);

        cache.stage(&arena.view(), k, 8).unwrap();
        arena.relocate();

        let view = arena.view();
        let staged = cache.stage(&view, k, 8).unwrap();
        assert_eq!(staged, Some(bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0])));
        assert_eq!(cache.snapshot().map(|s| s.block), Some(arena.block()));
    }

    #[test]
    fn failed_stage_keeps_previous_snapshot() {
        let mut arena = ByteArena::with_capacity(64);
        let ptr = arena.push_f32s(&[1.0]).unwrap();
        let mut cache = UploadCache::new();
        let view = arena.view();

        cache.stage(&view, key(ptr, 1, 1), 4).unwrap();
        let before = *cache.snapshot().unwrap();

        assert!(cache.stage(&view, key(ptr, 1000, 2), 4000).is_err());
        assert_eq!(cache.snapshot(), Some(&before));
    }

    #[test]
    fn emptied_buffer_is_a_change() {
        let mut arena = ByteArena::with_capacity(64);
        let ptr = arena.push_f32s(&[1.0]).unwrap();
        let mut cache = UploadCache::new();
        let view = arena.view();

        cache.stage(&view, key(ptr, 1, 1), 4).unwrap();
        assert_eq!(cache.stage(&view, key(ptr, 0, 2), 0).unwrap(), Some(&[][..]));
        assert_eq!(cache.stage(&view, key(0, 0, 2), 0).unwrap(), Some(&[][..]));
    }

    #[test]
    fn invalidate_forces_next_upload() {
        let mut arena = ByteArena::with_capacity(64);
        let ptr = arena.push_f32s(&[1.0]).unwrap();
        let mut cache = UploadCache::new();
        let view = arena.view();

        cache.stage(&view, key(ptr, 1, 1), 4).unwrap();
        cache.invalidate();
        assert!(cache.stage(&view, key(ptr, 1, 1), 4).unwrap().is_some());
    }
}
