//! Mock listener management handlers.

use crate::admin_api::handlers::system::internal_error;
use crate::admin_api::server::ApiContext;
use crate::admin_api::types::{
    collect_body, error_response, json_response, mock_error_status, parse_json_body,
    ClearRequestLogResponse, EndpointsResponse, RequestLogResponse, StartRequest, StartResponse,
    StopResponse, UpdateEndpointsRequest, UpdateEndpointsResponse,
};
use crate::mock::MockError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

fn mock_error_response(error: &MockError) -> Response<Full<Bytes>> {
    error_response(mock_error_status(error), &error.to_string())
}

/// Narrow a client-supplied port, rejecting anything outside 1..=65535
fn validate_port(port: i64) -> Result<u16, MockError> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(MockError::InvalidPort(port)),
    }
}

/// POST /api/mock/start - Start (or restart) the mock listener
pub async fn handle_start(req: Request<Incoming>, ctx: &ApiContext) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return internal_error(ctx, &e),
    };

    let start_req: StartRequest = match parse_json_body(&body) {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let port = match validate_port(start_req.port.unwrap_or(i64::from(ctx.default_mock_port))) {
        Ok(p) => p,
        Err(e) => return mock_error_response(&e),
    };

    match ctx.manager.start(port, start_req.endpoints).await {
        Ok(bound) => {
            info!("Mock server started on port {}", bound);
            json_response(
                StatusCode::OK,
                &StartResponse {
                    success: true,
                    port: bound,
                    message: format!("Mock server started on port {bound}"),
                },
            )
        }
        Err(e) => {
            warn!("Failed to start mock server on port {}: {}", port, e);
            mock_error_response(&e)
        }
    }
}

/// POST /api/mock/stop - Stop the mock listener (idempotent)
pub async fn handle_stop(ctx: &ApiContext) -> Response<Full<Bytes>> {
    let was_running = ctx.manager.stop().await;
    let message = if was_running {
        "Mock server stopped"
    } else {
        "Mock server was not running"
    };
    json_response(
        StatusCode::OK,
        &StopResponse {
            success: true,
            message: message.to_string(),
        },
    )
}

/// GET /api/mock/status
pub async fn handle_status(ctx: &ApiContext) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &ctx.manager.status().await)
}

/// GET /api/mock/endpoints - Current endpoint snapshot
pub async fn handle_list_endpoints(ctx: &ApiContext) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &EndpointsResponse {
            endpoints: ctx.manager.endpoints().await,
        },
    )
}

/// PUT|POST /api/mock/endpoints - Replace the endpoint set
pub async fn handle_update_endpoints(
    req: Request<Incoming>,
    ctx: &ApiContext,
) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return internal_error(ctx, &e),
    };

    let update_req: UpdateEndpointsRequest = match parse_json_body(&body) {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    match ctx.manager.update_endpoints(update_req.endpoints).await {
        Ok(outcome) => json_response(
            StatusCode::OK,
            &UpdateEndpointsResponse {
                success: true,
                count: outcome.count,
                restarted: outcome.restarted,
            },
        ),
        Err(e) => {
            warn!("Failed to update mock endpoints: {}", e);
            mock_error_response(&e)
        }
    }
}

/// GET /api/mock/requests - Requests served by the mock listener, oldest first
pub fn handle_list_requests(ctx: &ApiContext) -> Response<Full<Bytes>> {
    let requests = ctx.manager.request_log().entries();
    let total = requests.len();
    json_response(StatusCode::OK, &RequestLogResponse { requests, total })
}

/// DELETE /api/mock/requests
pub fn handle_clear_requests(ctx: &ApiContext) -> Response<Full<Bytes>> {
    let cleared = ctx.manager.request_log().clear();
    json_response(
        StatusCode::OK,
        &ClearRequestLogResponse {
            success: true,
            cleared,
        },
    )
}
