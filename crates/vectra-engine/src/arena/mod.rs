//! Foreign memory model.
//!
//! The native engine owns a single linear memory block and hands out byte
//! offsets ("pointers") into it. The block can be reallocated at any time,
//! which invalidates every previously observed offset. This module models
//! that with two pieces:
//!
//! - [`MemoryView`]: a borrowed, bounds-checked window over the block, tagged
//!   with the block's identity. Re-derived every frame, never stored.
//! - [`ByteArena`]: a growable, word-aligned block with a bump allocator. It is
//!   the producer-side stand-in used by the demo host and tests.

mod heap;
mod view;

pub use heap::ByteArena;
pub use view::{BlockId, MemoryView};
