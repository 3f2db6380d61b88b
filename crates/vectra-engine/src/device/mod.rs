//! GPU device + surface management.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue, configures the surface and
//! hands out one [`WgpuBackend`](crate::render::WgpuBackend) that lives as long
//! as the device.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
