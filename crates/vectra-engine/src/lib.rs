//! Vectra engine bridge.
//!
//! Reads geometry a native engine publishes into its linear memory and turns
//! it into GPU draw calls: triangle and line lists, an overlay of typed
//! primitives expanded to line segments, and MSDF glyph quads.
//!
//! The pieces, bottom-up:
//! - [`arena`] / [`wire`] / [`decode`]: the memory block and the records laid out in it
//! - [`upload`]: change detection so unchanged buffers are never re-sent
//! - [`render`]: passes, the [`render::Backend`] seam and its wgpu implementation
//! - [`device`] / [`window`] / [`core`]: surface, event loop and the per-frame contract

pub mod arena;
pub mod config;
pub mod coords;
pub mod decode;
pub mod error;
pub mod msdf;
pub mod source;
pub mod upload;
pub mod wire;

pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod window;

pub use config::BridgeConfig;
pub use error::{DecodeError, PassError};
pub use source::{EngineSource, GeometryBuffer, OverlayLayer};
