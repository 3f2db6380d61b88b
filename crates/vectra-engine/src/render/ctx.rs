use crate::coords::{CanvasSize, ViewTransform};

use super::backend::ViewUniforms;

/// Camera inputs supplied fresh every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameParams {
    pub view: ViewTransform,
    /// Device pixels.
    pub canvas: CanvasSize,
    pub pixel_ratio: f32,
}

impl FrameParams {
    #[inline]
    pub fn new(view: ViewTransform, canvas: CanvasSize, pixel_ratio: f32) -> Self {
        Self { view, canvas, pixel_ratio }
    }

    pub fn uniforms(&self, px_range: f32) -> ViewUniforms {
        ViewUniforms {
            view_scale: self.view.scale,
            pixel_ratio: self.pixel_ratio,
            view_translate: [self.view.translate.x, self.view.translate.y],
            canvas_size: [self.canvas.width.max(1.0), self.canvas.height.max(1.0)],
            px_range,
            _pad: 0.0,
        }
    }
}

/// Target for drawing (encoder + color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}
