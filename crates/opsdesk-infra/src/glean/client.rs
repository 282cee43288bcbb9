//! GleanClient -- concrete [`ChatBackend`] for the AI chat service.
//!
//! Sends requests to `POST {base}/rest/api/v1/chat`, directly to
//! `https://{backend}` or through the relay at `{relay_url}/glean`. The
//! streaming path hands raw body bytes to the reducer; line splitting
//! happens there.
//!
//! The token is wrapped in [`secrecy::SecretString`] and is only exposed when
//! building request headers.

use std::time::Duration;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use opsdesk_core::chat::backend::{ByteStream, ChatBackend};
use opsdesk_types::chat::{ChatChunk, ChatRequest};
use opsdesk_types::config::GleanSettings;
use opsdesk_types::error::ExchangeError;

use crate::upstream_message;

const CHAT_PATH: &str = "/rest/api/v1/chat";
const SERVICE: &str = "chat";

pub const BACKEND_HEADER: &str = "X-Glean-Backend";
pub const ACT_AS_HEADER: &str = "X-Glean-ActAs";

/// HTTP client for the chat endpoint.
///
/// Does not derive Debug; the token must never be printed.
#[derive(Clone)]
pub struct GleanClient {
    client: reqwest::Client,
    token: SecretString,
    backend: String,
    act_as: Option<String>,
    base_url: String,
}

impl GleanClient {
    /// Create a client that talks to `https://{backend}` directly.
    pub fn new(token: SecretString, backend: impl Into<String>) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ExchangeError::Transport(format!("failed to create HTTP client: {e}")))?;

        let backend = backend.into();
        Ok(Self {
            client,
            token,
            base_url: format!("https://{backend}"),
            backend,
            act_as: None,
        })
    }

    /// Create a client from settings, routing through the relay when one is
    /// configured.
    pub fn from_settings(
        settings: &GleanSettings,
        token: SecretString,
    ) -> Result<Self, ExchangeError> {
        let mut client = Self::new(token, settings.backend.clone())?;
        if !settings.email.trim().is_empty() {
            client = client.with_act_as(settings.email.trim().to_string());
        }
        if let Some(relay) = settings.relay_url.as_deref() {
            client = client.with_base_url(format!("{}/glean", relay.trim_end_matches('/')));
        }
        Ok(client)
    }

    /// Send requests on behalf of another user.
    pub fn with_act_as(mut self, email: String) -> Self {
        self.act_as = Some(email);
        self
    }

    /// Override the base URL (relay or tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, request: &ChatRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}{CHAT_PATH}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token.expose_secret()))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header(BACKEND_HEADER, &self.backend)
            .json(request);
        match &self.act_as {
            Some(email) => builder.header(ACT_AS_HEADER, email),
            None => builder,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ExchangeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "chat service error response");
    Err(ExchangeError::Upstream {
        service: SERVICE,
        status: status.as_u16(),
        message: upstream_message(status, &body),
    })
}

fn transport_error(e: reqwest::Error) -> ExchangeError {
    ExchangeError::Transport(format!("chat request failed: {e}"))
}

impl ChatBackend for GleanClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatChunk, ExchangeError> {
        let response = self.request(request).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;

        response
            .json::<ChatChunk>()
            .await
            .map_err(|e| {
                ExchangeError::Deserialization(format!("failed to parse chat response: {e}"))
            })
    }

    fn stream(&self, request: ChatRequest) -> ByteStream {
        let builder = self.request(&request);

        Box::pin(async_stream::try_stream! {
            let response = builder.send().await.map_err(transport_error)?;
            let response = check_status(response).await?;

            let mut body = response.bytes_stream();
            while let Some(piece) = body.next().await {
                let piece = piece
                    .map_err(|e| ExchangeError::Transport(format!("response body read: {e}")))?;
                yield piece.to_vec();
            }
        })
    }
}
