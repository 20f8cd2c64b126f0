use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use tracing::{debug, error};

use crate::config::Config;
use crate::security::admission::{client_identity, Admission, AdmissionController};
use crate::server::{health, response};
use crate::telemetry::{handle_metrics, Telemetry};

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Shared state for every request on every connection.
pub(crate) struct AppState {
    pub(crate) config: Arc<Config>,
    pub(crate) admission: Arc<AdmissionController>,
    pub(crate) telemetry: Option<Telemetry>,
}

/// Entry point for each request: admission, then guarded dispatch.
pub(crate) async fn handle(
    state: Arc<AppState>,
    peer: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<RespBody>, hyper::Error> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if let Some(t) = &state.telemetry {
        t.metrics.record_request(&method);
    }

    // Derive the identity and check the bucket; the registry lock is
    // released before any dispatch work below.
    let identity = match client_identity(peer, req.headers()) {
        Ok(identity) => identity,
        Err(e) => {
            error!(%peer, error = %e, "failed to derive client identity");
            if let Some(t) = &state.telemetry {
                t.metrics.record_identity_error();
            }
            return Ok(finish(&state, &method, &path, started, response::server_error_response()));
        }
    };

    let scope = state.admission.config().scope;
    match state.admission.admit(&identity) {
        Admission::Allowed => {
            if let Some(t) = &state.telemetry {
                t.metrics.record_admission_allowed(scope.as_str());
            }
        }
        Admission::Rejected => {
            debug!(client = %identity, %method, path = %path, "rate limit exceeded");
            if let Some(t) = &state.telemetry {
                t.metrics.record_admission_rejected(scope.as_str());
            }
            return Ok(finish(
                &state,
                &method,
                &path,
                started,
                response::rate_limit_exceeded_response(),
            ));
        }
    }

    let request_timeout = Duration::from_secs(state.config.timeout.request_secs);
    let dispatch_state = state.clone();
    let resp = run_guarded(request_timeout, async move { dispatch(dispatch_state, req).await }).await;

    Ok(finish(&state, &method, &path, started, resp))
}

/// Route the request to its handler. The routing table itself is glue: the
/// interesting work happened before this point.
async fn dispatch(state: Arc<AppState>, req: Request<Incoming>) -> Response<RespBody> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/v1/healthcheck") => {
            health::healthcheck_response(&state.config.environment).unwrap_or_else(|e| {
                error!(error = %e, "failed to build healthcheck response");
                response::server_error_response()
            })
        }
        (&Method::GET, "/metrics") => match &state.telemetry {
            Some(t) => handle_metrics(&t.registry).unwrap_or_else(|e| {
                error!(error = %e, "failed to render metrics");
                response::server_error_response()
            }),
            None => response::not_found_response(),
        },
        _ => response::not_found_response(),
    }
}

/// Run a handler future inside its own task so a panic is contained to this
/// request: the panic is logged, the client gets a 500, and the connection
/// is closed rather than left hanging. Also bounds the handler with the
/// per-request timeout.
async fn run_guarded<F>(request_timeout: Duration, handler: F) -> Response<RespBody>
where
    F: Future<Output = Response<RespBody>> + Send + 'static,
{
    let handle = tokio::spawn(handler);
    let abort = handle.abort_handle();

    match tokio::time::timeout(request_timeout, handle).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(join_err)) if join_err.is_panic() => {
            error!("request handler panicked");
            response::panic_response()
        }
        Ok(Err(join_err)) => {
            error!(error = %join_err, "request handler task failed");
            response::server_error_response()
        }
        Err(_) => {
            abort.abort();
            response::timeout_response()
        }
    }
}

fn finish(
    state: &Arc<AppState>,
    method: &Method,
    path: &str,
    started: Instant,
    resp: Response<RespBody>,
) -> Response<RespBody> {
    if let Some(t) = &state.telemetry {
        t.metrics.record_request_complete(
            method,
            resp.status().as_u16(),
            started.elapsed().as_secs_f64(),
        );
    }
    debug!(%method, path, status = resp.status().as_u16(), "request complete");
    resp
}
