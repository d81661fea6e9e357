use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use webtools_mock_server::admin_api::{AdminApiServer, ApiContext};
use webtools_mock_server::config::{Config, Environment};
use webtools_mock_server::cors::management_cors_layer;
use webtools_mock_server::mock::MockServerManager;

#[derive(Parser, Debug)]
#[command(name = "webtools-mock-server", version, about)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<String>,
    /// Management API bind address
    #[arg(long, env = "HOST")]
    host: Option<String>,
    /// Management API port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
    /// Interface the mock listener binds to
    #[arg(long)]
    mock_host: Option<String>,
    /// Default mock listener port
    #[arg(long, env = "MOCK_PORT")]
    mock_port: Option<u16>,
    #[arg(long, env = "APP_ENV", value_enum)]
    environment: Option<Environment>,
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn load_config(&self) -> Result<Config, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.mock_host {
            config.mock.host = host.clone();
        }
        if let Some(port) = self.mock_port {
            config.mock.default_port = port;
        }
        if let Some(environment) = self.environment {
            config.server.environment = environment;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = args.load_config()?;
    let cors = management_cors_layer(&config.server.cors_origins())?;
    let manager = Arc::new(MockServerManager::new(config.mock_settings()?));

    let ctx = ApiContext::new(
        Arc::clone(&manager),
        config.server.environment,
        cors,
        config.mock.default_port,
    );
    let server = AdminApiServer::new(config.server.host.clone(), config.server.port, ctx);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Management API failed: {}", e);
                manager.shutdown().await;
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    manager.shutdown().await;
    Ok(())
}
