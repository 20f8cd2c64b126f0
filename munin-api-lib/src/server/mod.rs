//! HTTP server with admission control and coordinated shutdown.

mod connections;
mod handler;
mod health;
mod response;
mod signal;

pub use connections::ConnectionCount;
pub use signal::{shutdown_signal, spawn_signal_listener};

use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{AdmissionScope, Config};
use crate::error::{ApiError, Result};
use crate::security::admission::{self, AdmissionController};
use crate::server::connections::ConnectionGuard;
use crate::tasks::BackgroundTasks;
use crate::telemetry::Telemetry;

/// HTTP server owning the listener lifecycle.
///
/// [`run`](Self::run) blocks for the life of the process: it accepts
/// connections until the shutdown signal fires, then drains in-flight
/// requests and tracked background work within the configured deadline.
pub struct Server {
    config: Arc<Config>,
    admission: Arc<AdmissionController>,
    tasks: BackgroundTasks,
    connections: Arc<ConnectionCount>,
    telemetry: Option<Telemetry>,
}

impl Server {
    pub fn new(config: Arc<Config>) -> Self {
        let admission = Arc::new(AdmissionController::new(config.admission.clone()));
        Self {
            config,
            admission,
            tasks: BackgroundTasks::new(),
            connections: Arc::new(ConnectionCount::default()),
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Handle for registering background work that shutdown must wait for.
    pub fn background_tasks(&self) -> BackgroundTasks {
        self.tasks.clone()
    }

    pub fn admission(&self) -> Arc<AdmissionController> {
        self.admission.clone()
    }

    /// Serve until `shutdown` fires, then drain and report the outcome.
    ///
    /// Returns `Ok(())` only after a clean drain: no more accepted
    /// connections, all in-flight requests finished, and the background task
    /// tracker back at zero — all within `timeout.shutdown_secs`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<&'static str>,
    ) -> Result<()> {
        let Server { config, admission, tasks, connections, telemetry } = self;

        let addr = listener.local_addr()?;
        info!(%addr, environment = %config.environment, "starting server");

        if config.admission.enabled && config.admission.scope == AdmissionScope::PerClient {
            tokio::spawn(admission::sweep_loop(admission.clone(), shutdown.clone()));
        }

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let state = Arc::new(handler::AppState {
            config: config.clone(),
            admission,
            telemetry: telemetry.clone(),
        });

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "listener accept failed");
                            return Err(ApiError::Listener(e));
                        }
                    };

                    let guard = ConnectionGuard::new(
                        connections.clone(),
                        telemetry.as_ref().map(|t| t.metrics.clone()),
                    );
                    let io = TokioIo::new(stream);
                    let state = state.clone();
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let state = state.clone();
                        async move { handler::handle(state, peer, req).await }
                    });

                    let conn = builder.serve_connection(io, svc);
                    let conn = graceful.watch(conn.into_owned());
                    tokio::spawn(async move {
                        let _guard = guard;
                        if let Err(e) = conn.await {
                            debug!(%peer, error = %e, "serve connection error");
                        }
                    });
                }
            }
        }

        let signal = *shutdown.borrow();
        info!(signal, "shutting down server");

        // Stop accepting immediately; already-accepted requests continue.
        drop(listener);

        info!(pending = tasks.active(), "completing background tasks");
        tasks.close();

        let deadline = Duration::from_secs(config.timeout.shutdown_secs);
        let drain_tasks = tasks.clone();
        let drained = tokio::time::timeout(deadline, async move {
            graceful.shutdown().await;
            drain_tasks.wait().await;
        })
        .await;

        match drained {
            Ok(()) => {
                info!(%addr, "stopped server");
                Ok(())
            }
            Err(_) => {
                warn!(
                    active_connections = connections.current(),
                    pending_tasks = tasks.active(),
                    "shutdown deadline elapsed before drain completed"
                );
                Err(ApiError::ShutdownTimeout(deadline))
            }
        }
    }
}
