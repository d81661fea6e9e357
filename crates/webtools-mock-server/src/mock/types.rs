//! Type definitions for the mock server.
//!
//! This module contains the endpoint rule record, the lifecycle status
//! snapshot, and the error type shared by the registry and the manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Rule
// ============================================================================

/// A single configured `(method, path) -> response` mapping.
///
/// Wire format is camelCase JSON as sent by the endpoint editor:
/// `{"id": "1", "method": "GET", "path": "/api/users", "status": 200,
/// "response": "{\"users\": []}", "delay": 0}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRule {
    /// Opaque identifier. Empty until the registry assigns one.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    /// HTTP verb, compared case-sensitively against the request method
    pub method: String,
    /// Literal request path, compared for exact equality
    pub path: String,
    #[serde(
        default = "default_status",
        deserialize_with = "deserialize_status"
    )]
    pub status: u16,
    /// JSON text (sent as `application/json`) or raw text (sent as-is)
    #[serde(default, deserialize_with = "deserialize_response_body")]
    pub response: String,
    /// Milliseconds to stall before writing the response
    #[serde(default)]
    pub delay: u64,
}

impl EndpointRule {
    /// Create a rule with no id and no delay
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        response: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            method: method.into(),
            path: path.into(),
            status,
            response: response.into(),
            delay: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = delay_ms;
        self
    }

    /// `"METHOD path"` form used in 404 listings
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

pub(crate) fn default_status() -> u16 {
    200
}

/// Deserialize a status from either a number or a numeric string
fn deserialize_status<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid status code: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("invalid status code string: {s}"))),
        serde_json::Value::Null => Ok(default_status()),
        _ => Err(D::Error::custom("status must be a number or string")),
    }
}

/// Deserialize an id from a string or a number (the UI uses `Date.now()`)
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        _ => Err(D::Error::custom("id must be a string or number")),
    }
}

/// Accept the response body as a string, or as inline JSON which is kept
/// in its compact serialized form.
fn deserialize_response_body<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ============================================================================
// Lifecycle Types
// ============================================================================

/// Point-in-time view of the manager, as reported by the status operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockStatus {
    pub is_running: bool,
    /// Bound port while running, otherwise the last bound (or default) port
    pub port: u16,
    pub endpoint_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

/// Result of replacing the endpoint snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartOutcome {
    /// Number of rules in the new snapshot
    pub count: usize,
    /// Whether a running listener was rebound to apply the snapshot
    pub restarted: bool,
}

// ============================================================================
// Error Types
// ============================================================================

/// Mock server errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    #[error("Port {0} is already in use")]
    PortInUse(u16),
    #[error("Failed to bind port {port}: {cause}")]
    ListenerError { port: u16, cause: String },
    #[error("Invalid port {0}: must be between 1 and 65535")]
    InvalidPort(i64),
    #[error("Invalid endpoint at index {index}: {reason}")]
    InvalidEndpoint { index: usize, reason: String },
}

impl MockError {
    pub(crate) fn invalid_endpoint(index: usize, reason: impl Into<String>) -> Self {
        MockError::InvalidEndpoint {
            index,
            reason: reason.into(),
        }
    }
}
