use std::io::Write;

use munin_api_lib::config::AdmissionScope;
use munin_api_lib::{load_from_path, ApiError};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    write!(file, "{contents}").expect("write temp config");
    file
}

#[test]
fn test_config_loads_valid_file() {
    let file = write_config(
        r#"
listen = "127.0.0.1:4000"
environment = "staging"

[admission]
enabled = true
burst = 10
refill_per_second = 5.0
idle_secs = 60
sweep_secs = 30
scope = "global"

[timeout]
request_secs = 10
shutdown_secs = 15
"#,
    );

    let config = load_from_path(file.path()).expect("config should load");
    assert_eq!(config.listen.to_string(), "127.0.0.1:4000");
    assert_eq!(config.environment, "staging");
    assert!(config.admission.enabled);
    assert_eq!(config.admission.burst, 10);
    assert_eq!(config.admission.refill_per_second, 5.0);
    assert_eq!(config.admission.idle_secs, 60);
    assert_eq!(config.admission.sweep_secs, 30);
    assert_eq!(config.admission.scope, AdmissionScope::Global);
    assert_eq!(config.timeout.request_secs, 10);
    assert_eq!(config.timeout.shutdown_secs, 15);
}

#[test]
fn test_config_defaults() {
    let file = write_config("listen = \"127.0.0.1:0\"\n");

    let config = load_from_path(file.path()).expect("config should load");
    assert_eq!(config.environment, "development");
    assert!(config.admission.enabled);
    assert_eq!(config.admission.burst, 4);
    assert_eq!(config.admission.refill_per_second, 2.0);
    assert_eq!(config.admission.idle_secs, 180);
    assert_eq!(config.admission.sweep_secs, 60);
    assert_eq!(config.admission.scope, AdmissionScope::PerClient);
    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.show_target);
    assert_eq!(config.timeout.request_secs, 30);
    assert_eq!(config.timeout.shutdown_secs, 20);
    assert!(!config.telemetry.metrics_enabled);
}

#[test]
fn test_zero_burst_is_rejected() {
    let file = write_config(
        r#"
listen = "127.0.0.1:0"

[admission]
enabled = true
burst = 0
"#,
    );

    let err = load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
}

#[test]
fn test_nonpositive_refill_rate_is_rejected() {
    let file = write_config(
        r#"
listen = "127.0.0.1:0"

[admission]
enabled = true
refill_per_second = -1.0
"#,
    );

    let err = load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
}

#[test]
fn test_invalid_limits_are_fine_when_admission_is_disabled() {
    let file = write_config(
        r#"
listen = "127.0.0.1:0"

[admission]
enabled = false
burst = 0
"#,
    );

    let config = load_from_path(file.path()).expect("disabled admission skips limit checks");
    assert!(!config.admission.enabled);
}

#[test]
fn test_zero_shutdown_deadline_is_rejected() {
    let file = write_config(
        r#"
listen = "127.0.0.1:0"

[timeout]
shutdown_secs = 0
"#,
    );

    let err = load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = load_from_path("/nonexistent/munin.toml").unwrap_err();
    assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
}

#[test]
fn test_unknown_scope_fails_to_parse() {
    let file = write_config(
        r#"
listen = "127.0.0.1:0"

[admission]
scope = "per-route"
"#,
    );

    let err = load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
}
