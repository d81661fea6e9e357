//! Request matching for mock endpoints.
//!
//! Matching is exact: method and path are compared byte-for-byte, with no
//! case folding, patterns or query handling. The first rule in insertion
//! order wins, so later duplicates are shadowed.

use super::types::EndpointRule;

/// Find the first rule whose method and path equal the request's
pub fn find_rule<'a>(
    rules: &'a [EndpointRule],
    method: &str,
    path: &str,
) -> Option<&'a EndpointRule> {
    rules
        .iter()
        .find(|rule| rule.method == method && rule.path == path)
}
