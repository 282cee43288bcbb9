//! Request forwarding.
//!
//! - `/glean/{*path}` goes to `https://{X-Glean-Backend}/{path}`. The body is
//!   streamed back unchanged so NDJSON arrives line by line.
//! - Any other path goes to the issue tracker base URL with the path and
//!   query unchanged. The upstream status is kept; the content type is always
//!   `application/json`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use tracing::field;

use opsdesk_infra::config::normalize_domain;
use opsdesk_infra::glean::client::{ACT_AS_HEADER, BACKEND_HEADER};
use opsdesk_observe::attrs;
use opsdesk_types::config::{JiraSettings, RelaySettings};

use super::error::AppError;

/// Everything the relay handlers need, shared behind an `Arc`.
pub struct RelayState {
    client: reqwest::Client,
    pub(crate) allowed_origin: HeaderValue,
    backend_suffix: String,
    jira_base: Option<String>,
    chat_scheme: &'static str,
}

pub type SharedRelay = Arc<RelayState>;

impl RelayState {
    /// Build from the `[relay]` section. The tracker base falls back to
    /// `https://{jira.domain}` when `jira_base` is not set.
    pub fn new(relay: &RelaySettings, jira: &JiraSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()?;

        let allowed_origin =
            HeaderValue::from_str(relay.allowed_origin.trim()).map_err(|e| {
                anyhow::anyhow!("invalid relay.allowed_origin '{}': {e}", relay.allowed_origin)
            })?;

        let jira_base = match relay.jira_base.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => Some(base.trim_end_matches('/').to_string()),
            _ => {
                let domain = normalize_domain(&jira.domain);
                (!domain.is_empty()).then(|| format!("https://{domain}"))
            }
        };

        Ok(Self {
            client,
            allowed_origin,
            backend_suffix: relay.allowed_backend_suffix.clone(),
            jira_base,
            chat_scheme: "https",
        })
    }

    /// Talk to chat backends over plain HTTP (local test servers).
    #[cfg(test)]
    pub(crate) fn with_chat_scheme(mut self, scheme: &'static str) -> Self {
        self.chat_scheme = scheme;
        self
    }

    pub fn jira_base(&self) -> Option<&str> {
        self.jira_base.as_deref()
    }
}

/// A backend host is accepted only when it is a bare `host[:port]` ending
/// with the configured suffix, with at least one label in front of it.
///
/// The value must also parse back to exactly that authority, so nothing a URL
/// parser treats as a separator (such as `\` in `https` URLs) can move the
/// request to another host.
pub fn backend_allowed(backend: &str, suffix: &str) -> bool {
    let bare = backend
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));
    if !bare || backend.len() <= suffix.len() || !backend.ends_with(suffix) {
        return false;
    }

    let Ok(url) = reqwest::Url::parse(&format!("https://{backend}/")) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    url.username().is_empty()
        && url.password().is_none()
        && url.path() == "/"
        && authority.eq_ignore_ascii_case(backend)
}

fn send_error(e: reqwest::Error) -> AppError {
    AppError::Upstream(format!("upstream request failed: {e}"))
}

fn copy_header(
    builder: reqwest::RequestBuilder,
    headers: &HeaderMap,
    name: &str,
) -> reqwest::RequestBuilder {
    match headers.get(name) {
        Some(value) => builder.header(name, value.clone()),
        None => builder,
    }
}

/// `GET|POST /glean/{*path}`
#[tracing::instrument(
    skip_all,
    fields(relay.upstream = "chat", relay.status = field::Empty, path = %path)
)]
pub async fn forward_chat(
    State(relay): State<SharedRelay>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let backend = headers
        .get(BACKEND_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing {BACKEND_HEADER} header")))?;

    if !backend_allowed(backend, &relay.backend_suffix) {
        tracing::warn!(backend, "rejected chat backend");
        return Err(AppError::Validation(format!("backend '{backend}' is not allowed")));
    }

    let query = uri.query().map(|q| format!("?{q}")).unwrap_or_default();
    let url = format!("{}://{backend}/{path}{query}", relay.chat_scheme);

    let mut upstream = relay.client.request(method.clone(), &url);
    for name in [
        AUTHORIZATION.as_str(),
        ACCEPT.as_str(),
        CONTENT_TYPE.as_str(),
        ACT_AS_HEADER,
    ] {
        upstream = copy_header(upstream, &headers, name);
    }
    if method == Method::POST {
        upstream = upstream.body(body);
    }

    let response = upstream.send().await.map_err(send_error)?;
    let status = response.status();
    tracing::Span::current().record(attrs::RELAY_STATUS, status.as_u16());
    tracing::debug!(status = %status, "chat upstream responded");

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
        builder = builder.header(CONTENT_TYPE, content_type.clone());
    }
    builder
        .body(Body::from_stream(response.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))
}

/// Every other path. Only GET and POST are relayed.
#[tracing::instrument(
    skip_all,
    fields(relay.upstream = "tracker", relay.status = field::Empty, path = %uri.path())
)]
pub async fn forward_tracker(
    State(relay): State<SharedRelay>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if method != Method::GET && method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let base = relay.jira_base().ok_or_else(|| {
        AppError::Unconfigured("issue tracker base URL is not configured".to_string())
    })?;
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = format!("{base}{path_and_query}");

    let mut upstream = relay
        .client
        .request(method.clone(), &url)
        .header(ACCEPT, "application/json");
    upstream = copy_header(upstream, &headers, AUTHORIZATION.as_str());
    if method == Method::POST {
        upstream = upstream.header(CONTENT_TYPE, "application/json").body(body);
    }

    let response = upstream.send().await.map_err(send_error)?;
    let status = response.status();
    tracing::Span::current().record(attrs::RELAY_STATUS, status.as_u16());

    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(format!("upstream body read failed: {e}")))?;

    Ok((status, [(CONTENT_TYPE, "application/json")], body).into_response())
}

/// Fallback for non-GET/POST methods on chat paths.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_allowed() {
        assert!(backend_allowed("acme-be.glean.com", ".glean.com"));
        assert!(!backend_allowed(".glean.com", ".glean.com"));
        assert!(!backend_allowed("evil.example.com", ".glean.com"));
        assert!(!backend_allowed("evil.com/x.glean.com", ".glean.com"));
        assert!(!backend_allowed("user@acme-be.glean.com", ".glean.com"));
    }

    #[test]
    fn test_backend_allowed_rejects_host_separators() {
        assert!(!backend_allowed("attacker.example\\.glean.com", ".glean.com"));
        assert!(!backend_allowed("attacker.example%2F.glean.com", ".glean.com"));
        assert!(!backend_allowed("attacker.example\t.glean.com", ".glean.com"));
        assert!(!backend_allowed("acme-be.glean.com:443", ".glean.com"));
        assert!(backend_allowed("127.0.0.1:8443", ":8443"));
        assert!(backend_allowed("Acme-BE.glean.com", ".glean.com"));
    }

    #[test]
    fn test_jira_base_defaults_to_domain() {
        let jira = JiraSettings {
            domain: "https://acme.atlassian.net/".to_string(),
            ..JiraSettings::default()
        };
        let relay = RelayState::new(&RelaySettings::default(), &jira).unwrap();
        assert_eq!(relay.jira_base(), Some("https://acme.atlassian.net"));

        let explicit = RelaySettings {
            jira_base: Some("http://localhost:9000/".to_string()),
            ..RelaySettings::default()
        };
        let relay = RelayState::new(&explicit, &jira).unwrap();
        assert_eq!(relay.jira_base(), Some("http://localhost:9000"));

        let relay = RelayState::new(&RelaySettings::default(), &JiraSettings::default()).unwrap();
        assert_eq!(relay.jira_base(), None);
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let relay = RelaySettings {
            allowed_origin: "bad\norigin".to_string(),
            ..RelaySettings::default()
        };
        assert!(RelayState::new(&relay, &JiraSettings::default()).is_err());
    }
}
