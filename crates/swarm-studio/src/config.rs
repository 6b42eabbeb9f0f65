use swarm_engine::logging::LoggingConfig;
use swarm_engine::window::RuntimeConfig;

/// Demo settings. No config file; tweak at the call site.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,

    /// Records allocated per stream buffer; the instance count can never
    /// exceed it.
    pub max_instances: u32,
    pub initial_instances: u32,

    /// Edge length of each box in world units.
    pub box_scale: f32,

    /// Seconds between FPS log lines.
    pub report_interval: f32,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig {
                title: "swarm studio".to_string(),
                ..RuntimeConfig::default()
            },
            logging: LoggingConfig::default(),
            max_instances: 4096,
            initial_instances: 1024,
            box_scale: 0.08,
            report_interval: 1.0,
        }
    }
}
