//! Shared domain types for opsdesk.
//!
//! This crate contains the wire shapes for the AI chat service and the issue
//! tracker, the settings file model, and the error enums every other crate
//! returns.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod issue;
