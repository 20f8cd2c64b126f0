use serde::Deserialize;
use std::net::SocketAddr;

/// Admission (rate limiting) scope: how rate-limit state is partitioned.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionScope {
    /// One token bucket per client identity (source IP)
    #[default]
    PerClient,
    /// One shared token bucket for all clients, no identity lookup
    Global,
}

impl AdmissionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionScope::PerClient => "per-client",
            AdmissionScope::Global => "global",
        }
    }
}

/// Admission control (token bucket rate limiting) configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AdmissionConfig {
    /// Enable admission control
    /// When disabled, every request is admitted without touching the registry
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bucket capacity: maximum burst of requests admitted at once
    /// Must be at least 1
    /// Default: 4
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Sustained admission rate in tokens (requests) per second
    /// Must be greater than zero
    /// Default: 2.0
    #[serde(default = "default_refill_per_second")]
    pub refill_per_second: f64,
    /// Idle window in seconds before a client's bucket is evicted
    /// Default: 180 (3 minutes)
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,
    /// Period in seconds between eviction sweeps
    /// Default: 60
    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,
    /// Rate-limit state partitioning: "per-client" or "global"
    /// Default: "per-client"
    #[serde(default)]
    pub scope: AdmissionScope,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            burst: default_burst(),
            refill_per_second: default_refill_per_second(),
            idle_secs: default_idle_secs(),
            sweep_secs: default_sweep_secs(),
            scope: AdmissionScope::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show module path (target) in log messages
    /// Default: false
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), show_target: false }
    }
}

/// Timeout configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TimeoutConfig {
    /// Per-request handling timeout in seconds
    /// Bounds a single handler invocation, independent of shutdown
    /// Default: 30
    #[serde(default = "default_request_timeout")]
    pub request_secs: u64,
    /// Graceful shutdown deadline in seconds
    /// Bounds the in-flight drain and the background task wait together
    /// Default: 20
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: default_request_timeout(),
            shutdown_secs: default_shutdown_timeout(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Expose Prometheus metrics on GET /metrics
    /// Default: false
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { metrics_enabled: false }
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:4000" or "127.0.0.1:8080"
    pub listen: SocketAddr,
    /// Deployment environment name, reported by the healthcheck endpoint
    /// Default: "development"
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Admission control configuration
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_true() -> bool {
    true
}

fn default_burst() -> u32 {
    4
}

fn default_refill_per_second() -> f64 {
    2.0
}

fn default_idle_secs() -> u64 {
    180
}

fn default_sweep_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    20
}

fn default_environment() -> String {
    "development".to_string()
}
