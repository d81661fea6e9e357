//! Management REST API for the WebTools mock server.
//!
//! This module serves, on the main server port:
//! - Starting, stopping and inspecting the mock listener
//! - Replacing the mock endpoint set
//! - Reading and clearing the mock request log
//! - Health, info, echo, sample data and metrics endpoints
//!
//! The API listens on a configurable port (default: 3000).

mod handlers;
mod router;
mod server;
pub mod types;

pub use server::{AdminApiServer, ApiContext};
