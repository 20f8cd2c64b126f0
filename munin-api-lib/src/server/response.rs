use http::header::{HeaderValue, CONNECTION, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;

type RespBody = BoxBody<Bytes, hyper::Error>;

const RATE_LIMITED_BODY: &[u8] = br#"{"error":"rate limit exceeded"}"#;
const SERVER_ERROR_BODY: &[u8] =
    br#"{"error":"the server encountered a problem and could not process your request"}"#;
const NOT_FOUND_BODY: &[u8] = br#"{"error":"the requested resource could not be found"}"#;
const TIMEOUT_BODY: &[u8] =
    br#"{"error":"the server could not process your request in time"}"#;

/// 429 for a request the admission controller rejected.
pub(crate) fn rate_limit_exceeded_response() -> Response<RespBody> {
    synthetic_json_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_BODY)
}

/// 500 for server-side failures (identity derivation, handler errors).
pub(crate) fn server_error_response() -> Response<RespBody> {
    synthetic_json_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY)
}

/// 500 for a recovered handler panic; closes the connection instead of
/// leaving it in an unknown state.
pub(crate) fn panic_response() -> Response<RespBody> {
    let mut resp = synthetic_json_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY);
    resp.headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    resp
}

/// 404 for paths outside the routing table.
pub(crate) fn not_found_response() -> Response<RespBody> {
    synthetic_json_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// 503 for a handler that exceeded the per-request timeout.
pub(crate) fn timeout_response() -> Response<RespBody> {
    synthetic_json_response(StatusCode::SERVICE_UNAVAILABLE, TIMEOUT_BODY)
}

fn synthetic_json_response(status: StatusCode, body: &'static [u8]) -> Response<RespBody> {
    let body = Full::new(Bytes::from_static(body))
        .map_err(|never| match never {})
        .boxed();
    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}
