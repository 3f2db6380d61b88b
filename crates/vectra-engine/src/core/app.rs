use winit::event::WindowEvent;

use crate::render::WgpuBackend;

use super::ctx::{FrameCtx, WindowCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Implemented by whatever owns the engine and the pass registry.
pub trait App {
    /// Raw window events, before the runtime handles resize and close.
    fn on_window_event(&mut self, window: &WindowCtx<'_>, event: &WindowEvent) -> AppControl {
        let _ = (window, event);
        AppControl::Continue
    }

    /// Polled whenever the event queue drains. Returning `true` requests a
    /// redraw; the default redraws continuously.
    fn on_idle(&mut self) -> bool {
        true
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Last chance to release GPU resources while the device is alive.
    fn on_exit(&mut self, backend: &mut WgpuBackend) {
        let _ = backend;
    }
}
