//! Management API request handlers.

pub mod mock;
pub mod system;
