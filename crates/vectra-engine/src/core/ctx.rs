use winit::window::Window;

use crate::coords::CanvasSize;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderTarget, WgpuBackend};

use super::app::AppControl;

/// The window being driven.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawable size in device pixels.
    pub fn canvas(&self) -> CanvasSize {
        let size = self.window.inner_size();
        CanvasSize::from_physical(size.width, size.height)
    }

    /// Physical pixels per logical pixel.
    pub fn pixel_ratio(&self) -> f32 {
        self.window.scale_factor() as f32
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback invocation, `'w` the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    /// Number of frames rendered before this one.
    pub frame_index: u64,
}

impl FrameCtx<'_, '_> {
    #[inline]
    pub fn canvas(&self) -> CanvasSize {
        self.window.canvas()
    }

    #[inline]
    pub fn pixel_ratio(&self) -> f32 {
        self.window.pixel_ratio()
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut WgpuBackend {
        self.gpu.backend_mut()
    }

    /// Clears the surface to `clear`, lets `draw` record into it and presents.
    ///
    /// Surface errors skip the frame unless they are fatal.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> AppControl
    where
        F: FnOnce(&mut WgpuBackend, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    _ => AppControl::Continue,
                };
            }
        };

        // Dropped before the encoder moves into submit().
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("vectra clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(self.gpu.backend_mut(), &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }
}
