//! CORS layers for the mock listener and the management API.
//!
//! The mock listener is a local developer tool and allows every origin.
//! The management API only answers the UI's origins in development and
//! reflects any origin in production, always with credentials.

use crate::config::Environment;
use hyper::header::HeaderValue;
use hyper::Method;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

/// Origins the UI dev server and the bundled UI are served from
pub const DEV_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Which origins the management API answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Reflect whatever origin the request carries
    Any,
    /// Only these exact origins
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Explicitly configured origins win; otherwise development is limited
    /// to [`DEV_ORIGINS`] and production reflects any origin.
    pub fn resolve(environment: Environment, configured: Option<&[String]>) -> Self {
        match (configured, environment) {
            (Some(origins), _) => AllowedOrigins::List(origins.to_vec()),
            (None, Environment::Development) => {
                AllowedOrigins::List(DEV_ORIGINS.iter().map(|o| o.to_string()).collect())
            }
            (None, Environment::Production) => AllowedOrigins::Any,
        }
    }
}

/// `Access-Control-Allow-Origin: *` on every response, request headers
/// mirrored on preflight
pub fn mock_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(AllowHeaders::mirror_request())
}

/// Credentialed CORS for the management API
pub fn management_cors_layer(origins: &AllowedOrigins) -> Result<CorsLayer, anyhow::Error> {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::mirror_request(),
        AllowedOrigins::List(list) => AllowOrigin::list(parse_origins(list)?),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Credentials cannot be combined with a wildcard, so `*` is rejected here
pub(crate) fn parse_origins(origins: &[String]) -> Result<Vec<HeaderValue>, anyhow::Error> {
    origins
        .iter()
        .map(|origin| {
            if origin.trim() == "*" {
                anyhow::bail!("allowed origin '*' cannot be used with credentials");
            }
            HeaderValue::from_str(origin)
                .map_err(|e| anyhow::anyhow!("invalid allowed origin '{origin}': {e}"))
        })
        .collect()
}
