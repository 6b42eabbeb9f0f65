mod app;
mod config;
mod controls;
mod geometry;

use swarm_engine::device::GpuInit;
use swarm_engine::logging::init_logging;
use swarm_engine::window::Runtime;

use crate::app::SwarmApp;
use crate::config::StudioConfig;

fn main() -> anyhow::Result<()> {
    let config = StudioConfig::default();
    init_logging(config.logging.clone());

    log::info!(
        "starting {} ({} max instances)",
        config.runtime.title,
        config.max_instances
    );

    Runtime::run(config.runtime.clone(), GpuInit::default(), SwarmApp::new(config))
}
