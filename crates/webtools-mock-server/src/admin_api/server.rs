//! Management API server.

use crate::admin_api::router::route_request;
use crate::config::Environment;
use crate::mock::MockServerManager;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

/// Shared state handed to every management request
pub struct ApiContext {
    pub manager: Arc<MockServerManager>,
    pub environment: Environment,
    /// Applied to every management response, preflights included
    pub cors: CorsLayer,
    /// Port used by start when the request names none
    pub default_mock_port: u16,
    pub started_at: Instant,
}

impl ApiContext {
    pub fn new(
        manager: Arc<MockServerManager>,
        environment: Environment,
        cors: CorsLayer,
        default_mock_port: u16,
    ) -> Self {
        Self {
            manager,
            environment,
            cors,
            default_mock_port,
            started_at: Instant::now(),
        }
    }
}

/// Main server hosting the management API
pub struct AdminApiServer {
    host: String,
    port: u16,
    ctx: Arc<ApiContext>,
}

impl AdminApiServer {
    pub fn new(host: impl Into<String>, port: u16, ctx: ApiContext) -> Self {
        Self {
            host: host.into(),
            port,
            ctx: Arc::new(ctx),
        }
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!(
            "WebTools management API listening on http://{} ({})",
            listener.local_addr()?,
            self.ctx.environment.as_str()
        );

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let ctx = Arc::clone(&self.ctx);

            tokio::spawn(async move {
                let service = ServiceBuilder::new()
                    .layer(ctx.cors.clone())
                    .service_fn(move |req| {
                        let ctx = Arc::clone(&ctx);
                        async move { route_request(req, ctx).await }
                    });

                if let Err(e) = http1::Builder::new()
                    .serve_connection(io, TowerToHyperService::new(service))
                    .await
                {
                    debug!("Management API connection error: {}", e);
                }
            });
        }
    }
}
