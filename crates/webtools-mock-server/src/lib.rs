//! WebTools mock server: a management API that starts, stops and
//! reconfigures a single local mock HTTP listener.

pub mod admin_api;
pub mod config;
pub mod cors;
pub mod metrics;
pub mod mock;
