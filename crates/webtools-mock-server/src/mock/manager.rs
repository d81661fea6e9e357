//! MockServerManager - lifecycle management for the single mock listener.
//!
//! The manager owns the current endpoint snapshot and, while running, the
//! listener bound with that snapshot. All lifecycle operations are
//! serialized through one async mutex that stays held across the awaited
//! socket close and bind, so callers never observe a half-finished
//! transition.

use super::listener::ListenerHandle;
use super::registry::EndpointRegistry;
use super::request_log::RequestLog;
use super::types::{EndpointRule, MockError, MockStatus, RestartOutcome};
use crate::metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Construction settings for a [`MockServerManager`]
#[derive(Debug, Clone)]
pub struct MockSettings {
    /// Interface the mock listener binds to
    pub host: String,
    /// Port reported by status before the first start
    pub default_port: u16,
    pub request_log_capacity: usize,
    /// Endpoints present before the first update
    pub seed: EndpointRegistry,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            default_port: 3001,
            request_log_capacity: 100,
            seed: EndpointRegistry::seed(),
        }
    }
}

/// A bound listener plus when it was started
struct RunningListener {
    handle: ListenerHandle,
    started_at: DateTime<Utc>,
}

/// Running holds the socket, so "running without a listener" cannot exist
enum Lifecycle {
    Stopped,
    Running(RunningListener),
}

struct ManagerState {
    lifecycle: Lifecycle,
    /// Interface every (re)bind uses
    bind_host: String,
    endpoints: Arc<EndpointRegistry>,
    /// Last successfully bound port (or the default)
    last_port: u16,
}

/// Owns the mock listener and its endpoint snapshot
pub struct MockServerManager {
    request_log: Arc<RequestLog>,
    state: Mutex<ManagerState>,
}

impl MockServerManager {
    /// Create a stopped manager holding the seed endpoints
    pub fn new(settings: MockSettings) -> Self {
        Self {
            request_log: Arc::new(RequestLog::new(settings.request_log_capacity)),
            state: Mutex::new(ManagerState {
                lifecycle: Lifecycle::Stopped,
                bind_host: settings.host,
                endpoints: Arc::new(settings.seed),
                last_port: settings.default_port,
            }),
        }
    }

    /// Start serving on `port`, replacing any running listener.
    ///
    /// When `endpoints` is given it becomes the new snapshot (validated
    /// before anything else happens); otherwise the current snapshot is
    /// served. Returns the bound port. On failure the manager is stopped.
    pub async fn start(
        &self,
        port: u16,
        endpoints: Option<Vec<EndpointRule>>,
    ) -> Result<u16, MockError> {
        if port == 0 {
            return Err(MockError::InvalidPort(0));
        }
        let registry = endpoints
            .map(EndpointRegistry::from_rules)
            .transpose()?
            .map(Arc::new);

        let mut state = self.state.lock().await;
        if let Some(registry) = registry {
            state.endpoints = registry;
        }

        if Self::close_listener(&mut state).await {
            info!("Replacing running mock listener");
        }
        self.bind_locked(&mut state, port).await
    }

    /// Stop the listener. Idempotent; returns whether one was running.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        let was_running = Self::close_listener(&mut state).await;
        if was_running {
            metrics::record_lifecycle_event("stopped");
        }
        was_running
    }

    /// Replace the endpoint snapshot, rebinding the same port if running.
    ///
    /// If the rebind fails the manager ends stopped and the bind error is
    /// returned; the new snapshot is kept either way.
    pub async fn update_endpoints(
        &self,
        endpoints: Vec<EndpointRule>,
    ) -> Result<RestartOutcome, MockError> {
        let registry = Arc::new(EndpointRegistry::from_rules(endpoints)?);
        let count = registry.len();

        let mut state = self.state.lock().await;
        state.endpoints = registry;

        let port = match &state.lifecycle {
            Lifecycle::Running(running) => running.handle.port(),
            Lifecycle::Stopped => {
                info!("Mock endpoints updated ({} rules), listener not running", count);
                return Ok(RestartOutcome {
                    count,
                    restarted: false,
                });
            }
        };

        Self::close_listener(&mut state).await;
        match self.bind_locked(&mut state, port).await {
            Ok(_) => {
                metrics::record_lifecycle_event("restarted");
                info!("Mock listener restarted on port {} with {} rules", port, count);
                Ok(RestartOutcome {
                    count,
                    restarted: true,
                })
            }
            Err(e) => {
                warn!("Mock listener restart on port {} failed: {}", port, e);
                Err(e)
            }
        }
    }

    /// Current lifecycle status
    pub async fn status(&self) -> MockStatus {
        let state = self.state.lock().await;
        match &state.lifecycle {
            Lifecycle::Running(running) => MockStatus {
                is_running: true,
                port: running.handle.port(),
                endpoint_count: state.endpoints.len(),
                started_at: Some(running.started_at),
            },
            Lifecycle::Stopped => MockStatus {
                is_running: false,
                port: state.last_port,
                endpoint_count: state.endpoints.len(),
                started_at: None,
            },
        }
    }

    /// Current endpoint snapshot
    pub async fn endpoints(&self) -> Vec<EndpointRule> {
        let state = self.state.lock().await;
        state.endpoints.rules().to_vec()
    }

    pub fn request_log(&self) -> &Arc<RequestLog> {
        &self.request_log
    }

    /// Tear down: stop the listener if one is running
    pub async fn shutdown(&self) {
        if self.stop().await {
            info!("Mock server shut down");
        }
    }

    /// Point later binds at another interface, leaving a running listener
    /// where it is. Lets tests make the next restart fail.
    #[cfg(test)]
    pub(crate) async fn set_bind_host(&self, host: &str) {
        self.state.lock().await.bind_host = host.to_string();
    }

    /// Bind `port` with the current snapshot. Caller holds the lock and has
    /// already closed any previous listener.
    async fn bind_locked(&self, state: &mut ManagerState, port: u16) -> Result<u16, MockError> {
        match ListenerHandle::bind(
            &state.bind_host,
            port,
            Arc::clone(&state.endpoints),
            Arc::clone(&self.request_log),
        )
        .await
        {
            Ok(handle) => {
                let bound = handle.port();
                state.lifecycle = Lifecycle::Running(RunningListener {
                    handle,
                    started_at: Utc::now(),
                });
                state.last_port = bound;
                metrics::record_lifecycle_event("started");
                Ok(bound)
            }
            Err(e) => {
                state.lifecycle = Lifecycle::Stopped;
                metrics::record_lifecycle_event("start_failed");
                Err(e)
            }
        }
    }

    /// Move to `Stopped`, awaiting socket release. Returns whether a
    /// listener was running.
    async fn close_listener(state: &mut ManagerState) -> bool {
        match std::mem::replace(&mut state.lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(running) => {
                running.handle.close().await;
                true
            }
            Lifecycle::Stopped => false,
        }
    }
}

impl Default for MockServerManager {
    fn default() -> Self {
        Self::new(MockSettings::default())
    }
}
