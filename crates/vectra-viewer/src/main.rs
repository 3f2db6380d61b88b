//! Demo host: a synthetic engine publishing geometry into its own heap, drawn
//! through the bridge every frame.
//!
//! Drag to pan, scroll to zoom, Escape to quit.

mod app;
mod atlas;
mod demo;

use anyhow::Result;
use winit::dpi::LogicalSize;

use vectra_engine::device::GpuInit;
use vectra_engine::logging::{init_logging, LoggingConfig};
use vectra_engine::window::{Runtime, RuntimeConfig};
use vectra_engine::BridgeConfig;

use crate::app::ViewerApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "vectra viewer".to_string(),
        initial_size: LogicalSize::new(1024.0, 768.0),
    };

    let app = ViewerApp::new(&BridgeConfig::default())?;
    Runtime::run(config, GpuInit::default(), app)
}
