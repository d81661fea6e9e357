//! Route dispatch logic for the management API.

use crate::admin_api::handlers::{mock, system};
use crate::admin_api::server::ApiContext;
use crate::admin_api::types::not_found;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Main request router. CORS is handled by the layer around it.
pub async fn route_request(
    req: Request<Incoming>,
    ctx: Arc<ApiContext>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Management API: {} {}", method, path);

    Ok(route_by_path(&method, &path, req, &ctx).await)
}

/// Route based on method and path
async fn route_by_path(
    method: &Method,
    path: &str,
    req: Request<Incoming>,
    ctx: &ApiContext,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/health") => system::handle_health(ctx),
        (&Method::GET, "/metrics") => system::handle_metrics(),
        (&Method::GET, "/api/info") => system::handle_info(ctx),
        (&Method::POST, "/api/echo") => system::handle_echo(req, ctx).await,
        (&Method::GET, "/api/data") => system::handle_data(),

        (&Method::POST, "/api/mock/start") => mock::handle_start(req, ctx).await,
        (&Method::POST, "/api/mock/stop") => mock::handle_stop(ctx).await,
        (&Method::GET, "/api/mock/status") => mock::handle_status(ctx).await,
        (&Method::GET, "/api/mock/endpoints") => mock::handle_list_endpoints(ctx).await,
        (&Method::PUT, "/api/mock/endpoints") | (&Method::POST, "/api/mock/endpoints") => {
            mock::handle_update_endpoints(req, ctx).await
        }
        (&Method::GET, "/api/mock/requests") => mock::handle_list_requests(ctx),
        (&Method::DELETE, "/api/mock/requests") => mock::handle_clear_requests(ctx),

        _ => not_found(),
    }
}
