//! Logging set-up and shared span field names for opsdesk.

pub mod attrs;
pub mod tracing_setup;
