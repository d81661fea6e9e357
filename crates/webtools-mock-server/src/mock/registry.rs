//! Endpoint registry: an ordered, validated collection of endpoint rules.
//!
//! A registry is immutable once built. The manager swaps whole registries
//! behind an `Arc`, and each running listener holds the snapshot it was
//! started with.

use super::matcher::find_rule;
use super::types::{EndpointRule, MockError};
use std::collections::HashSet;
use uuid::Uuid;

/// Ordered endpoint rules. Insertion order is preserved and decides which
/// rule wins when several share a `(method, path)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointRegistry {
    rules: Vec<EndpointRule>,
}

impl EndpointRegistry {
    /// Validate `rules` and build a registry from them.
    ///
    /// Rules without an id get a generated UUIDv4. The whole submission is
    /// rejected if any rule is invalid or two rules share an id.
    pub fn from_rules(rules: Vec<EndpointRule>) -> Result<Self, MockError> {
        let mut seen_ids = HashSet::with_capacity(rules.len());
        let mut validated = Vec::with_capacity(rules.len());

        for (index, mut rule) in rules.into_iter().enumerate() {
            validate_rule(index, &rule)?;

            if rule.id.trim().is_empty() {
                rule.id = Uuid::new_v4().to_string();
            }
            if !seen_ids.insert(rule.id.clone()) {
                return Err(MockError::invalid_endpoint(
                    index,
                    format!("duplicate id '{}'", rule.id),
                ));
            }

            validated.push(rule);
        }

        Ok(Self { rules: validated })
    }

    /// Default endpoints present when the process starts
    pub fn seed() -> Self {
        Self {
            rules: vec![
                EndpointRule::new("GET", "/api/users", 200, r#"{"users": []}"#).with_id("1"),
                EndpointRule::new("POST", "/api/users", 201, r#"{"id": 1, "created": true}"#)
                    .with_id("2")
                    .with_delay(100),
            ],
        }
    }

    pub fn rules(&self) -> &[EndpointRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching `method` and `path` exactly
    pub fn find(&self, method: &str, path: &str) -> Option<&EndpointRule> {
        find_rule(&self.rules, method, path)
    }

    /// `"METHOD path"` for every rule, in insertion order
    pub fn route_keys(&self) -> Vec<String> {
        self.rules.iter().map(EndpointRule::route_key).collect()
    }
}

fn validate_rule(index: usize, rule: &EndpointRule) -> Result<(), MockError> {
    if rule.method.is_empty() {
        return Err(MockError::invalid_endpoint(index, "method must not be empty"));
    }
    if !rule.method.bytes().all(is_token_byte) {
        return Err(MockError::invalid_endpoint(
            index,
            format!("method '{}' is not a valid HTTP token", rule.method),
        ));
    }
    if !rule.path.starts_with('/') {
        return Err(MockError::invalid_endpoint(
            index,
            format!("path '{}' must start with '/'", rule.path),
        ));
    }
    if rule.path.chars().any(char::is_whitespace) {
        return Err(MockError::invalid_endpoint(
            index,
            format!("path '{}' must not contain whitespace", rule.path),
        ));
    }
    // 1xx are interim responses and cannot be sent as a final status
    if !(200..=599).contains(&rule.status) {
        return Err(MockError::invalid_endpoint(
            index,
            format!("status {} is outside 200-599", rule.status),
        ));
    }
    Ok(())
}

/// RFC 9110 `tchar`
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
