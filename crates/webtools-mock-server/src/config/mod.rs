//! Configuration types for the WebTools mock server.

mod mock;
mod server;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mock::{EndpointRegistry, MockSettings};

pub use mock::MockConfig;
pub use server::{Environment, ServerConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Main server hosting the management API
    #[serde(default)]
    pub server: ServerConfig,
    /// Mock listener defaults
    #[serde(default)]
    pub mock: MockConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be between 1 and 65535");
        }
        if self.mock.default_port == 0 {
            anyhow::bail!("mock.default_port must be between 1 and 65535");
        }
        if self.server.port == self.mock.default_port {
            anyhow::bail!(
                "server.port and mock.default_port are both {}; the mock listener needs its own port",
                self.server.port
            );
        }
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if self.mock.host.trim().is_empty() {
            anyhow::bail!("mock.host must not be empty");
        }

        if let Some(origins) = &self.server.allowed_origins {
            crate::cors::parse_origins(origins)
                .map_err(|e| anyhow::anyhow!("server.allowed_origins: {e}"))?;
        }

        // Seed endpoints go through the same validation as API submissions
        self.seed_registry()?;
        Ok(())
    }

    /// Settings for constructing the mock server manager
    pub fn mock_settings(&self) -> Result<MockSettings, anyhow::Error> {
        Ok(MockSettings {
            host: self.mock.host.clone(),
            default_port: self.mock.default_port,
            request_log_capacity: self.mock.request_log_capacity,
            seed: self.seed_registry()?,
        })
    }

    fn seed_registry(&self) -> Result<EndpointRegistry, anyhow::Error> {
        match &self.mock.endpoints {
            Some(rules) => EndpointRegistry::from_rules(rules.clone())
                .map_err(|e| anyhow::anyhow!("mock.endpoints: {e}")),
            None => Ok(EndpointRegistry::seed()),
        }
    }
}
