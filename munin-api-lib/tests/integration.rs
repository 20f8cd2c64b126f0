use std::sync::Arc;
use std::time::{Duration, Instant};

use munin_api_lib::config::{
    AdmissionConfig, AdmissionScope, Config, LoggingConfig, TelemetryConfig, TimeoutConfig,
};
use munin_api_lib::{Server, Telemetry};
use serial_test::serial;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

fn test_config(admission: AdmissionConfig) -> Config {
    Config {
        listen: "127.0.0.1:0".parse().expect("valid listen address"),
        environment: "test".to_string(),
        admission,
        logging: LoggingConfig::default(),
        timeout: TimeoutConfig { request_secs: 5, shutdown_secs: 5 },
        telemetry: TelemetryConfig::default(),
    }
}

fn admission_disabled() -> AdmissionConfig {
    AdmissionConfig { enabled: false, ..AdmissionConfig::default() }
}

async fn start_server(
    cfg: Config,
    telemetry: Option<Telemetry>,
) -> (
    String,
    watch::Sender<&'static str>,
    JoinHandle<munin_api_lib::Result<()>>,
) {
    let listener = TcpListener::bind(cfg.listen).await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let mut server = Server::new(Arc::new(cfg));
    if let Some(telemetry) = telemetry {
        server = server.with_telemetry(telemetry);
    }
    let (tx, rx) = watch::channel("");
    let handle = tokio::spawn(server.run(listener, rx));
    (format!("http://{addr}"), tx, handle)
}

#[tokio::test]
async fn test_healthcheck_reports_environment_and_version(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (base, tx, handle) = start_server(test_config(admission_disabled()), None).await;

    let resp = reqwest::get(format!("{base}/v1/healthcheck")).await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["status"], "available");
    assert_eq!(body["environment"], "test");
    assert!(body["version"].is_string());

    tx.send("SIGTERM")?;
    handle.await?.expect("clean shutdown");
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_gets_a_json_404(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (base, tx, handle) = start_server(test_config(admission_disabled()), None).await;

    let resp = reqwest::get(format!("{base}/v1/nope")).await?;
    assert_eq!(resp.status(), 404);
    assert_eq!(
        resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "the requested resource could not be found");

    tx.send("SIGTERM")?;
    handle.await?.expect("clean shutdown");
    Ok(())
}

#[tokio::test]
async fn test_burst_exhaustion_yields_429(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let admission = AdmissionConfig {
        enabled: true,
        burst: 4,
        refill_per_second: 2.0,
        idle_secs: 180,
        sweep_secs: 60,
        scope: AdmissionScope::PerClient,
    };
    let (base, tx, handle) = start_server(test_config(admission), None).await;

    let client = reqwest::Client::new();
    for i in 0..4 {
        let resp = client.get(format!("{base}/v1/healthcheck")).send().await?;
        assert_eq!(resp.status(), 200, "request {} should be admitted", i);
    }

    let resp = client.get(format!("{base}/v1/healthcheck")).send().await?;
    assert_eq!(resp.status(), 429);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "rate limit exceeded");

    tx.send("SIGTERM")?;
    handle.await?.expect("clean shutdown");
    Ok(())
}

#[tokio::test]
async fn test_rejections_apply_to_every_route_equally(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let admission = AdmissionConfig {
        enabled: true,
        burst: 1,
        refill_per_second: 0.001,
        idle_secs: 180,
        sweep_secs: 60,
        scope: AdmissionScope::Global,
    };
    let (base, tx, handle) = start_server(test_config(admission), None).await;

    let client = reqwest::Client::new();
    let resp = client.get(format!("{base}/v1/healthcheck")).send().await?;
    assert_eq!(resp.status(), 200);

    // admission runs before routing: even an unknown path sees the 429
    let resp = client.get(format!("{base}/v1/nope")).send().await?;
    assert_eq!(resp.status(), 429);

    tx.send("SIGTERM")?;
    handle.await?.expect("clean shutdown");
    Ok(())
}

#[tokio::test]
async fn test_malformed_forwarded_header_is_a_500(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let admission = AdmissionConfig { enabled: true, ..AdmissionConfig::default() };
    let (base, tx, handle) = start_server(test_config(admission), None).await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{base}/v1/healthcheck"))
        .header("x-forwarded-for", "not-an-address")
        .send()
        .await?;
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await?;
    assert!(body["error"].is_string());

    tx.send("SIGTERM")?;
    handle.await?.expect("clean shutdown");
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_metrics_endpoint_exposes_prometheus_text(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let telemetry = Telemetry::init()?;
    let (base, tx, handle) = start_server(test_config(admission_disabled()), Some(telemetry)).await;

    // generate some traffic first so the counters exist
    reqwest::get(format!("{base}/v1/healthcheck")).await?;

    let resp = reqwest::get(format!("{base}/metrics")).await?;
    assert_eq!(resp.status(), 200);
    let body = resp.text().await?;
    assert!(body.contains("munin_requests"), "missing request counter in:\n{body}");

    tx.send("SIGTERM")?;
    handle.await?.expect("clean shutdown");
    Ok(())
}

#[tokio::test]
async fn test_idle_keepalive_connections_do_not_block_shutdown(
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (base, tx, handle) = start_server(test_config(admission_disabled()), None).await;

    // the client keeps its pooled connection open after the response
    let client = reqwest::Client::new();
    let resp = client.get(format!("{base}/v1/healthcheck")).send().await?;
    assert_eq!(resp.status(), 200);

    tx.send("SIGTERM")?;
    let started = Instant::now();
    handle.await?.expect("clean shutdown");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "an idle connection held the drain open"
    );
    drop(client);
    Ok(())
}
