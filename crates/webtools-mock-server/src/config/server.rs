//! Main server (management API host) configuration.

use crate::cors::AllowedOrigins;
use serde::{Deserialize, Serialize};

/// Runtime environment. Production hides internal error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub environment: Environment,
    /// Origins allowed to call the management API with credentials.
    /// When absent, development allows the local UI origins and production
    /// reflects any origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Origins the management API answers in the configured environment
    pub fn cors_origins(&self) -> AllowedOrigins {
        AllowedOrigins::resolve(self.environment, self.allowed_origins.as_deref())
    }
}
