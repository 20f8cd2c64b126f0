use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;
use hyper::StatusCode;
use serde_json::json;

use crate::error::{ApiError, Result};

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Healthcheck response - always reports available while the process runs
pub(crate) fn healthcheck_response(environment: &str) -> Result<Response<RespBody>> {
    let body = json!({
        "status": "available",
        "environment": environment,
        "version": env!("CARGO_PKG_VERSION"),
    });
    let body_bytes = serde_json::to_vec(&body).map_err(|e| {
        ApiError::Http(format!("Failed to serialize healthcheck response: {e}"))
    })?;

    let body = Full::new(Bytes::from(body_bytes))
        .map_err(|never| match never {})
        .boxed();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(body)
        .map_err(|e| ApiError::Http(format!("Failed to build healthcheck response: {e}")))?;

    Ok(response)
}
