#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod tasks;
pub mod telemetry;

pub use config::{load_from_path, AdmissionConfig, AdmissionScope, Config};
pub use error::{ApiError, Result};
pub use security::admission::{client_identity, Admission, AdmissionController};
pub use server::{shutdown_signal, spawn_signal_listener, Server};
pub use tasks::{BackgroundTasks, TaskGuard};
pub use telemetry::{init_tracing, Telemetry};
