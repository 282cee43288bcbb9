//! JiraClient -- concrete [`IssueTracker`] for the issue tracker REST API.
//!
//! Requests use Basic auth (`base64(email:token)`) and go either to
//! `https://{domain}` or to the relay, which forwards paths unchanged.

use std::time::Duration;

use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

use opsdesk_core::ticket::tracker::IssueTracker;
use opsdesk_types::config::JiraSettings;
use opsdesk_types::error::TicketError;
use opsdesk_types::issue::{
    CreateIssueResponse, CreatedIssue, FieldMeta, FieldMetaPage, IssueErrorBody,
};

/// HTTP client for the issue tracker.
#[derive(Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    /// Site host, used for browse links even when requests go via the relay.
    domain: String,
    base_url: String,
    credentials: SecretString,
}

impl JiraClient {
    pub fn new(
        domain: impl Into<String>,
        email: &str,
        token: &SecretString,
    ) -> Result<Self, TicketError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TicketError::Transport(format!("failed to create HTTP client: {e}")))?;

        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{email}:{}", token.expose_secret()));
        let domain = domain.into();

        Ok(Self {
            client,
            base_url: format!("https://{domain}"),
            domain,
            credentials: SecretString::from(encoded),
        })
    }

    /// Build from validated settings, routing through the relay when set.
    pub fn from_settings(
        settings: &JiraSettings,
        token: &SecretString,
    ) -> Result<Self, TicketError> {
        let client = Self::new(settings.domain.clone(), &settings.email, token)?;
        Ok(match settings.relay_url.as_deref() {
            Some(relay) => client.with_base_url(relay.trim_end_matches('/').to_string()),
            None => client,
        })
    }

    /// Override the base URL (relay or tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Basic {}", self.credentials.expose_secret()))
            .header("Accept", "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, TicketError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| TicketError::Transport(format!("{e}. Check your domain and API token")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TicketError::Transport(format!("response body read: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<IssueErrorBody>(&body) {
                Ok(err) if !err.error_messages.is_empty() || !err.errors.is_empty() => {
                    err.message()
                }
                _ => crate::upstream_message(status, &body),
            };
            tracing::warn!(status = %status, message = %message, "issue tracker error response");
            return Err(TicketError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

impl IssueTracker for JiraClient {
    async fn create_issue(&self, payload: &serde_json::Value) -> Result<CreatedIssue, TicketError> {
        let url = format!("{}/rest/api/3/issue", self.base_url);
        let body = self
            .send(self.client.post(&url).header("Content-Type", "application/json").json(payload))
            .await?;

        let created: CreateIssueResponse = serde_json::from_str(&body)
            .map_err(|e| TicketError::Deserialization(format!("create issue response: {e}")))?;
        Ok(CreatedIssue::new(&self.domain, created.key))
    }

    async fn field_metadata(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> Result<Vec<FieldMeta>, TicketError> {
        let url = format!(
            "{}/rest/api/3/issue/createmeta/{project}/issuetypes/{issue_type_id}",
            self.base_url
        );
        let body = self.send(self.client.get(&url)).await?;

        let page: FieldMetaPage = serde_json::from_str(&body)
            .map_err(|e| TicketError::Deserialization(format!("field metadata response: {e}")))?;
        Ok(page.fields)
    }
}
