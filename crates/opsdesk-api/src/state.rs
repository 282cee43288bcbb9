//! Application state shared by CLI commands and the relay.
//!
//! AppState holds the resolved data directory and the loaded settings with
//! tokens resolved from the environment, keychain, or settings file. Clients are built on demand so
//! commands that need neither service (e.g. `erp list`) never fail on
//! missing credentials.

use std::path::PathBuf;

use anyhow::Context;
use secrecy::SecretString;

use opsdesk_infra::config::{load_settings, resolve_data_dir, validate_glean, validate_jira};
use opsdesk_infra::glean::GleanClient;
use opsdesk_infra::jira::JiraClient;
use opsdesk_infra::keychain::KeychainStore;
use opsdesk_infra::secret::{TokenSources, resolve_tokens};
use opsdesk_types::config::{JiraSettings, Settings};

#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub settings: Settings,
    pub token_sources: TokenSources,
}

impl AppState {
    /// Resolve the data directory and load settings from it.
    pub async fn init() -> Self {
        let data_dir = resolve_data_dir();
        let mut settings = load_settings(&data_dir).await;
        let token_sources = resolve_tokens(&mut settings, &KeychainStore::new());

        tracing::debug!(data_dir = %data_dir.display(), "settings loaded");
        Self {
            data_dir,
            settings,
            token_sources,
        }
    }

    /// Chat service client from the validated `[glean]` section.
    pub fn glean_client(&self) -> anyhow::Result<GleanClient> {
        let glean = validate_glean(&self.settings.glean)
            .context("chat service is not configured. Run: opsdesk settings set-glean")?;
        let token = SecretString::from(glean.token.clone());
        Ok(GleanClient::from_settings(&glean, token)?)
    }

    /// Issue tracker client plus the validated `[jira]` section it was built
    /// from (callers need the project key).
    pub fn jira_client(&self) -> anyhow::Result<(JiraClient, JiraSettings)> {
        let jira = validate_jira(&self.settings.jira)
            .context("issue tracker is not configured. Run: opsdesk settings set-jira")?;
        let token = SecretString::from(jira.token.clone());
        let client = JiraClient::from_settings(&jira, &token)?;
        Ok((client, jira))
    }
}
