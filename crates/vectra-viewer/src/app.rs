use std::time::Instant;

use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use vectra_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use vectra_engine::coords::{Vec2, ViewTransform};
use vectra_engine::render::{FrameParams, PassRegistry, WgpuBackend};
use vectra_engine::{BridgeConfig, DecodeError};

use crate::demo::DemoEngine;

const CLEAR: wgpu::Color = wgpu::Color { r: 0.06, g: 0.06, b: 0.08, a: 1.0 };

/// Zoom per wheel line.
const LINE_ZOOM: f32 = 1.1;
/// Zoom per wheel pixel (touchpads).
const PIXEL_ZOOM: f32 = 1.0025;

/// Drives the bridge from [`DemoEngine`], with drag-to-pan and wheel zoom.
pub struct ViewerApp {
    engine: DemoEngine,
    registry: PassRegistry<WgpuBackend>,
    initialized: bool,
    view: ViewTransform,
    centered: bool,
    cursor: Vec2,
    dragging: bool,
    /// Set by input that moved the view since the last redraw.
    dirty: bool,
    last_tick: Instant,
}

impl ViewerApp {
    pub fn new(config: &BridgeConfig) -> Result<Self, DecodeError> {
        Ok(Self {
            engine: DemoEngine::new()?,
            registry: PassRegistry::new(config),
            initialized: false,
            view: ViewTransform::IDENTITY,
            centered: false,
            cursor: Vec2::zero(),
            dragging: false,
            dirty: true,
            last_tick: Instant::now(),
        })
    }
}

impl App for ViewerApp {
    fn on_window_event(&mut self, window: &WindowCtx<'_>, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                return AppControl::Exit;
            }

            WindowEvent::CursorMoved { position, .. } => {
                // Screen space is logical pixels.
                let ratio = window.pixel_ratio();
                let now = Vec2::new(position.x as f32 / ratio, position.y as f32 / ratio);
                if self.dragging {
                    let delta = now - self.cursor;
                    self.view.pan_by(delta.x, delta.y);
                    self.dirty = true;
                }
                self.cursor = now;
            }

            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = *state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let factor = match delta {
                    MouseScrollDelta::LineDelta(_, y) => LINE_ZOOM.powf(*y),
                    MouseScrollDelta::PixelDelta(p) => PIXEL_ZOOM.powf(p.y as f32),
                };
                self.view.zoom_about(self.cursor, factor);
                self.dirty = true;
            }

            _ => {}
        }
        AppControl::Continue
    }

    /// Redraws only after the engine republished or the view moved.
    fn on_idle(&mut self) -> bool {
        let now = Instant::now();
        let republished = match self.engine.tick(now - self.last_tick) {
            Ok(changed) => changed,
            Err(err) => {
                log::error!("demo engine stalled: {err}");
                false
            }
        };
        self.last_tick = now;
        std::mem::take(&mut self.dirty) || republished
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.initialized {
            for (kind, err) in self.registry.initialize(ctx.backend_mut()) {
                log::warn!("running without {kind:?}: {}", err.label());
            }
            self.initialized = true;
        }

        let canvas = ctx.canvas();
        let pixel_ratio = ctx.pixel_ratio();
        if !self.centered {
            self.view.translate = Vec2::new(canvas.width, canvas.height) / (2.0 * pixel_ratio);
            self.centered = true;
        }

        let frame = FrameParams::new(self.view, canvas, pixel_ratio);
        let (registry, engine) = (&mut self.registry, &self.engine);
        let frame_index = ctx.frame_index;

        ctx.render(CLEAR, |backend, target| {
            let report = registry.draw_frame(backend, target, engine, &frame);
            if report.any() {
                log::trace!("frame {frame_index}: {report:?}");
            }
        })
    }

    fn on_exit(&mut self, backend: &mut WgpuBackend) {
        self.registry.dispose(backend);
        log::info!("passes disposed");
    }
}
