//! Request/response shapes and response helpers for the management API.

use crate::mock::{EndpointRule, LoggedRequest, MockError};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

// =============================================================================
// Management API payloads
// =============================================================================

/// Body of `POST /api/mock/start`
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Kept wide so out-of-range values produce a readable error
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub endpoints: Option<Vec<EndpointRule>>,
}

/// Body of `PUT /api/mock/endpoints`
#[derive(Debug, Deserialize)]
pub struct UpdateEndpointsRequest {
    pub endpoints: Vec<EndpointRule>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub success: bool,
    pub port: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateEndpointsResponse {
    pub success: bool,
    pub count: usize,
    pub restarted: bool,
}

#[derive(Debug, Serialize)]
pub struct EndpointsResponse {
    pub endpoints: Vec<EndpointRule>,
}

#[derive(Debug, Serialize)]
pub struct RequestLogResponse {
    pub requests: Vec<LoggedRequest>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearRequestLogResponse {
    pub success: bool,
    pub cleared: usize,
}

/// Failure shape shared by every management operation
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

/// HTTP status used when reporting a manager error
pub fn mock_error_status(error: &MockError) -> StatusCode {
    match error {
        MockError::PortInUse(_) | MockError::InvalidPort(_) | MockError::InvalidEndpoint { .. } => {
            StatusCode::BAD_REQUEST
        }
        MockError::ListenerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a pretty-printed JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Create a compact JSON response from an already-parsed value
pub fn compact_json_response(
    status: StatusCode,
    body: &serde_json::Value,
) -> Response<Full<Bytes>> {
    build_response_with_headers(
        status,
        [("Content-Type", "application/json")],
        body.to_string(),
    )
}

/// Create a plain-text response
pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_response_with_headers(status, [("Content-Type", "text/plain; charset=utf-8")], body)
}

/// Build an HTTP response with headers.
///
/// Falls back to a bare response if a header is rejected by the builder.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create a `{ success: false, error }` response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &FailureResponse {
            success: false,
            error: message.to_string(),
        },
    )
}

/// Create a not found response for unknown API routes
pub fn not_found() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "API endpoint not found" }),
    )
}

/// Collect request body into bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    use http_body_util::BodyExt;
    req.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

/// Parse a JSON request body, treating an empty body as `{}`
pub fn parse_json_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| format!("Invalid request JSON: {e}"))
}
