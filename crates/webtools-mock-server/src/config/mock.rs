//! Mock listener configuration.

use crate::mock::EndpointRule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockConfig {
    /// Interface the mock listener binds to
    #[serde(default = "default_mock_host")]
    pub host: String,
    /// Port used when a start request names none
    #[serde(default = "default_mock_port")]
    pub default_port: u16,
    /// Entries kept in the request log (0 disables it)
    #[serde(default = "default_request_log_capacity")]
    pub request_log_capacity: usize,
    /// Seed endpoints; the built-in defaults are used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<EndpointRule>>,
}

fn default_mock_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mock_port() -> u16 {
    3001
}

fn default_request_log_capacity() -> usize {
    100
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            host: default_mock_host(),
            default_port: default_mock_port(),
            request_log_capacity: default_request_log_capacity(),
            endpoints: None,
        }
    }
}
