//! System handlers: health, info, echo, sample data, metrics.

use crate::admin_api::server::ApiContext;
use crate::admin_api::types::{
    build_response_with_headers, collect_body, error_response, json_response, parse_json_body,
};
use crate::config::Environment;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use tracing::error;

/// Report an unexpected failure, hiding the detail in production
pub fn internal_error(ctx: &ApiContext, detail: &str) -> Response<Full<Bytes>> {
    error!("Management API error: {}", detail);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &internal_error_message(ctx.environment, detail),
    )
}

fn internal_error_message(environment: Environment, detail: &str) -> String {
    if environment.is_production() {
        "Internal server error".to_string()
    } else {
        detail.to_string()
    }
}

/// GET /health - Health check
pub fn handle_health(ctx: &ApiContext) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "uptime": ctx.started_at.elapsed().as_secs_f64(),
        }),
    )
}

/// GET /api/info - Application info
pub fn handle_info(ctx: &ApiContext) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &json!({
            "name": "WebTools",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": ctx.environment.as_str(),
        }),
    )
}

/// POST /api/echo - Echo the JSON body back
pub async fn handle_echo(req: Request<Incoming>, ctx: &ApiContext) -> Response<Full<Bytes>> {
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return internal_error(ctx, &e),
    };

    let received: serde_json::Value = match parse_json_body(&body) {
        Ok(v) => v,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    json_response(
        StatusCode::OK,
        &json!({
            "message": "Echo response",
            "received": received,
            "timestamp": Utc::now().to_rfc3339(),
        }),
    )
}

/// GET /api/data - Static sample data
pub fn handle_data() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &json!({
            "items": [
                {"id": 1, "name": "Item One", "status": "active"},
                {"id": 2, "name": "Item Two", "status": "pending"},
                {"id": 3, "name": "Item Three", "status": "completed"}
            ],
            "total": 3,
            "page": 1,
            "perPage": 10
        }),
    )
}

/// GET /metrics - Prometheus metrics
pub fn handle_metrics() -> Response<Full<Bytes>> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        collect_metrics(),
    )
}
