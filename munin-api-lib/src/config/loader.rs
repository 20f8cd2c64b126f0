use std::fs;
use std::path::Path;

use crate::config::{AdmissionScope, Config};
use crate::error::{ApiError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ApiError::Config(format!("Failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| ApiError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.admission.enabled {
        if cfg.admission.burst == 0 {
            return Err(ApiError::Config(
                "admission.burst must be at least 1".to_string(),
            ));
        }
        if cfg.admission.refill_per_second <= 0.0 || !cfg.admission.refill_per_second.is_finite() {
            return Err(ApiError::Config(
                "admission.refill_per_second must be a positive number".to_string(),
            ));
        }
        if cfg.admission.scope == AdmissionScope::PerClient && cfg.admission.sweep_secs == 0 {
            return Err(ApiError::Config(
                "admission.sweep_secs must be at least 1 for per-client scope".to_string(),
            ));
        }
    }

    if cfg.timeout.shutdown_secs == 0 {
        return Err(ApiError::Config(
            "timeout.shutdown_secs must be at least 1".to_string(),
        ));
    }
    if cfg.timeout.request_secs == 0 {
        return Err(ApiError::Config(
            "timeout.request_secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}
