//! The mock HTTP listener.
//!
//! A `ListenerHandle` owns one bound socket and the accept task serving it.
//! Every accepted connection is served on its own task against the
//! endpoint snapshot the listener was bound with.

use super::dispatcher::{dispatch, MockRequest};
use super::registry::EndpointRegistry;
use super::request_log::RequestLog;
use super::types::MockError;
use crate::cors::mock_cors_layer;
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, error, info, warn};

/// A bound, serving mock listener
pub(crate) struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Bind `host:port` and start serving `snapshot`.
    pub(crate) async fn bind(
        host: &str,
        port: u16,
        snapshot: Arc<EndpointRegistry>,
        request_log: Arc<RequestLog>,
    ) -> Result<Self, MockError> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| bind_error(port, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| MockError::ListenerError {
                port,
                cause: e.to_string(),
            })?;

        info!(
            "Mock listener bound to {} ({} endpoints)",
            local_addr,
            snapshot.len()
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(listener, snapshot, request_log, shutdown_rx));

        Ok(Self {
            local_addr,
            shutdown_tx,
            accept_task,
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stop accepting and release the socket.
    ///
    /// Returns once the listening socket is closed. Open connections finish
    /// their in-flight response and then close on their own.
    pub(crate) async fn close(self) {
        let port = self.port();
        self.shutdown_tx.send_replace(true);
        if let Err(e) = self.accept_task.await {
            warn!("Mock listener task on port {} ended abnormally: {}", port, e);
        }
        info!("Mock listener on port {} closed", port);
    }
}

fn bind_error(port: u16, e: io::Error) -> MockError {
    if e.kind() == io::ErrorKind::AddrInUse {
        MockError::PortInUse(port)
    } else {
        MockError::ListenerError {
            port,
            cause: e.to_string(),
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    snapshot: Arc<EndpointRegistry>,
    request_log: Arc<RequestLog>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();
    let mut consecutive_errors = 0u32;

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        consecutive_errors = 0;
                        debug!("Mock listener on port {} accepted {}", port, addr);
                        let snapshot = Arc::clone(&snapshot);
                        let request_log = Arc::clone(&request_log);
                        let shutdown_rx = shutdown_rx.clone();
                        tokio::spawn(serve_connection(stream, snapshot, request_log, shutdown_rx));
                    }
                    Err(e) => {
                        // EMFILE and friends persist; don't spin on them
                        let backoff = accept_backoff(consecutive_errors);
                        consecutive_errors = consecutive_errors.saturating_add(1);
                        error!(
                            "Accept error on mock port {}: {} (retrying in {:?})",
                            port, e, backoff
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
            // Fires on shutdown, and also if the handle was dropped without close()
            _ = shutdown_rx.changed() => {
                debug!("Mock listener on port {} shutting down", port);
                break;
            }
        }
    }
}

/// Pause after the `n`th consecutive accept failure: 10ms doubling up to 1s
fn accept_backoff(consecutive_errors: u32) -> Duration {
    let millis = 10u64.saturating_mul(1u64 << consecutive_errors.min(7));
    Duration::from_millis(millis.min(1000))
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    snapshot: Arc<EndpointRegistry>,
    request_log: Arc<RequestLog>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let service = ServiceBuilder::new()
        .layer(mock_cors_layer())
        .service_fn(move |req| {
            let snapshot = Arc::clone(&snapshot);
            let request_log = Arc::clone(&request_log);
            async move { handle_mock_request(req, snapshot, request_log).await }
        });

    let conn = http1::Builder::new().serve_connection(io, TowerToHyperService::new(service));
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!("Mock connection error: {}", e);
            }
        }
        _ = shutdown_rx.changed() => {
            // Let the in-flight response (delay included) finish, then close
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                debug!("Mock connection error during shutdown: {}", e);
            }
        }
    }
}

/// Dispatch one request and record it. Preflights never reach here.
async fn handle_mock_request(
    req: Request<Incoming>,
    snapshot: Arc<EndpointRegistry>,
    request_log: Arc<RequestLog>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let request = MockRequest::read(req).await;

    let outcome = dispatch(&request, &snapshot).await;
    let status = outcome.response.status().as_u16();

    debug!("Mock {} {} -> {}", request.method, request.path, status);
    request_log.record(&request, status, started.elapsed());
    metrics::record_mock_request(status, outcome.matched);

    Ok(outcome.response)
}
