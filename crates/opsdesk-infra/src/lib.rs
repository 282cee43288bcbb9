//! Infrastructure adapters for opsdesk.
//!
//! - `glean`: [`ChatBackend`](opsdesk_core::chat::backend::ChatBackend) over HTTP
//! - `jira`: [`IssueTracker`](opsdesk_core::ticket::tracker::IssueTracker) over HTTP
//! - `config`: settings file location, loading, validation, and saving
//! - `keychain`: OS keychain token store
//! - `secret`: token resolution from the environment, keychain, and settings file

pub mod config;
pub mod glean;
pub mod jira;
pub mod keychain;
pub mod secret;

/// Best human-readable message from an upstream error body: the JSON
/// `message` field when present, else the raw body, else the status text.
pub(crate) fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
