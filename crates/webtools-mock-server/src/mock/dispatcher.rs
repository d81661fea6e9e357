//! Response dispatch for the mock listener.
//!
//! Turns a matched rule (or the lack of one) into an HTTP response. The
//! configured delay is an async timer, so a slow rule never holds up other
//! requests on the same listener.

use super::registry::EndpointRegistry;
use super::types::EndpointRule;
use crate::admin_api::types::{compact_json_response, json_response, text_response};
use crate::metrics;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// The parts of an inbound request the mock server cares about
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    /// Parsed body, present only for `application/json` requests that parse
    pub body: Option<serde_json::Value>,
}

impl MockRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
        }
    }

    /// Read method, path and (for JSON requests) the body.
    ///
    /// Body read or parse failures leave `body` empty; the body never takes
    /// part in matching.
    pub async fn read<B>(req: Request<B>) -> Self
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false);

        let body = if is_json {
            match req.into_body().collect().await {
                Ok(collected) => {
                    let bytes = collected.to_bytes();
                    if bytes.is_empty() {
                        None
                    } else {
                        serde_json::from_slice(&bytes).ok()
                    }
                }
                Err(e) => {
                    debug!("Failed to read mock request body: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self { method, path, body }
    }
}

/// 404 body listing every registered route
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoMatchBody<'a> {
    error: String,
    path: &'a str,
    method: &'a str,
    available_endpoints: Vec<String>,
}

/// A dispatched response and whether a rule produced it
#[derive(Debug)]
pub struct DispatchOutcome {
    pub response: Response<Full<Bytes>>,
    pub matched: bool,
}

/// Produce the response for `request` against `registry`.
pub async fn dispatch(request: &MockRequest, registry: &EndpointRegistry) -> DispatchOutcome {
    match registry.find(&request.method, &request.path) {
        Some(rule) => {
            if rule.delay > 0 {
                metrics::record_mock_delay(rule.delay);
                tokio::time::sleep(Duration::from_millis(rule.delay)).await;
            }
            DispatchOutcome {
                response: render_rule(rule),
                matched: true,
            }
        }
        None => DispatchOutcome {
            response: no_match_response(request, registry),
            matched: false,
        },
    }
}

/// Render a rule's body: JSON when it parses, raw text otherwise
pub fn render_rule(rule: &EndpointRule) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(rule.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match serde_json::from_str::<serde_json::Value>(&rule.response) {
        Ok(value) => compact_json_response(status, &value),
        Err(_) => text_response(status, rule.response.clone()),
    }
}

fn no_match_response(request: &MockRequest, registry: &EndpointRegistry) -> Response<Full<Bytes>> {
    let body = NoMatchBody {
        error: format!(
            "No mock endpoint matches {} {}",
            request.method, request.path
        ),
        path: &request.path,
        method: &request.method,
        available_endpoints: registry.route_keys(),
    };
    json_response(StatusCode::NOT_FOUND, &body)
}
