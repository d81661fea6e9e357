//! Mock server: endpoint rules, matching, dispatch and listener lifecycle.
//!
//! This module provides:
//! - `MockServerManager`: start/stop/update lifecycle of the single mock listener
//! - `EndpointRegistry`: validated, ordered endpoint rules
//! - `dispatch`: turns a request plus a registry snapshot into a response
//! - `RequestLog`: bounded record of served requests
//!
//! ## Module Structure
//!
//! - `types`: rule, status and error types
//! - `registry`: rule validation and snapshots
//! - `matcher`: exact method/path matching
//! - `dispatcher`: delay, JSON-or-text rendering, structured 404
//! - `listener`: socket binding and connection serving
//! - `manager`: MockServerManager lifecycle state machine
//! - `request_log`: served-request history

mod dispatcher;
mod listener;
mod manager;
mod matcher;
mod registry;
mod request_log;
mod types;

#[cfg(test)]
mod tests;

pub use dispatcher::{dispatch, render_rule, DispatchOutcome, MockRequest};
pub use manager::{MockServerManager, MockSettings};
pub use matcher::find_rule;
pub use registry::EndpointRegistry;
pub use request_log::{LoggedRequest, RequestLog};
pub use types::{EndpointRule, MockError, MockStatus, RestartOutcome};
