//! Per-client admission control for Munin API.
//!
//! Every inbound request passes through the [`AdmissionController`] before it
//! reaches a handler. Admission uses a token bucket per client identity:
//!
//! 1. **Bucket** (`bucket.rs`): token balance with lazy refill. Tokens accrue
//!    from wall-clock elapsed time rather than a per-client timer, so the
//!    state is correct no matter how irregularly requests arrive.
//!
//! 2. **Registry** (`registry.rs`): the identity-to-bucket map behind one
//!    exclusive lock, plus the periodic eviction sweep that drops buckets of
//!    clients not seen within the idle window.
//!
//! # Example Usage
//!
//! ```ignore
//! use munin_api_lib::config::AdmissionConfig;
//! use munin_api_lib::security::admission::{Admission, AdmissionController};
//!
//! let controller = AdmissionController::new(AdmissionConfig::default());
//!
//! match controller.admit("203.0.113.7") {
//!     Admission::Allowed => { /* forward to the handler */ }
//!     Admission::Rejected => { /* 429 Too Many Requests */ }
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [admission]
//! enabled = true
//! burst = 4
//! refill_per_second = 2.0
//! idle_secs = 180
//! sweep_secs = 60
//! scope = "per-client"
//! ```
//!
//! With `scope = "global"` every request shares one bucket; the lookup and
//! refill path is identical, only the key is fixed.

mod bucket;
mod registry;

pub use registry::{client_identity, Admission, AdmissionController};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Run the eviction sweep on a fixed period until the shutdown signal fires.
///
/// Spawned by the server when per-client admission is enabled. The sweep
/// takes the same registry lock as [`AdmissionController::admit`], so it
/// never observes a bucket concurrently with an admission check.
pub async fn sweep_loop(
    controller: Arc<AdmissionController>,
    mut shutdown: watch::Receiver<&'static str>,
) {
    let period = Duration::from_secs(controller.config().sweep_secs);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately; consume it so sweeps start one
    // full period after startup
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.sweep();
            }
            _ = shutdown.changed() => {
                debug!("shutdown signal received, stopping eviction sweep");
                break;
            }
        }
    }
}
