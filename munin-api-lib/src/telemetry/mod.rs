pub mod metrics;
mod metrics_handler;
pub mod tracing;

pub use metrics::{init_metrics, Metrics};
pub use metrics_handler::handle_metrics;
pub use tracing::init_tracing;

use std::sync::Arc;

/// Metrics instruments plus the registry they export through.
#[derive(Clone)]
pub struct Telemetry {
    pub metrics: Arc<Metrics>,
    pub registry: prometheus::Registry,
}

impl Telemetry {
    pub fn init() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let (metrics, registry) = init_metrics()?;
        Ok(Self { metrics, registry })
    }
}
