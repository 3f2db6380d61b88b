//! Coordinate types shared by the passes and the host.
//!
//! Two spaces are in play:
//! - World: engine units, +Y up.
//! - Screen: logical pixels, origin top-left, +Y down. Multiplying by the
//!   device pixel ratio gives canvas (device) pixels.
//!
//! [`ViewTransform`] maps between them; shaders finish the conversion to clip
//! space using the canvas size.

mod canvas;
mod rect;
mod vec2;
mod view;

pub use canvas::CanvasSize;
pub use rect::Rect;
pub use vec2::Vec2;
pub use view::{MAX_SCALE, MIN_SCALE, ViewTransform};
