#![forbid(unsafe_code)]

use clap::Parser;
use munin_api_lib::{config::load_from_path, server::spawn_signal_listener, Server, Telemetry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Munin JSON API server")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "demos/config/basic.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = munin_api_lib::telemetry::init_tracing(&cfg.logging) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(
        listen = %cfg.listen,
        environment = %cfg.environment,
        admission = cfg.admission.enabled,
        "configuration loaded"
    );

    let telemetry = if cfg.telemetry.metrics_enabled {
        match Telemetry::init() {
            Ok(telemetry) => Some(telemetry),
            Err(err) => {
                error!(%err, "failed to initialize metrics");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let listener = match TcpListener::bind(cfg.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %cfg.listen, "failed to bind listener");
            std::process::exit(1);
        }
    };

    let shutdown = spawn_signal_listener();
    let mut server = Server::new(Arc::new(cfg));
    if let Some(telemetry) = telemetry {
        server = server.with_telemetry(telemetry);
    }

    if let Err(err) = server.run(listener, shutdown).await {
        error!(%err, "server exited with error");
        std::process::exit(1);
    }
}
