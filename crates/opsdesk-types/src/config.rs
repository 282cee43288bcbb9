//! Settings file types for opsdesk.
//!
//! `Settings` represents the `config.toml` in the data directory: chat
//! service credentials, issue tracker credentials, relay options, and extra
//! ticket forms. All fields have defaults so a partial file still loads.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_COMPANY: &str = "BuildOps";
pub const DEFAULT_CHAT_BACKEND: &str = "buildops-be.glean.com";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Company name injected into ERP-context prompts.
    #[serde(default = "default_company")]
    pub company: String,

    #[serde(default)]
    pub glean: GleanSettings,

    #[serde(default)]
    pub jira: JiraSettings,

    #[serde(default)]
    pub relay: RelaySettings,

    #[serde(default)]
    pub voice: VoiceSettings,

    /// Additional ticket forms beyond the built-in `issue` form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ticket_forms: Vec<TicketSchema>,
}

fn default_company() -> String {
    DEFAULT_COMPANY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company: default_company(),
            glean: GleanSettings::default(),
            jira: JiraSettings::default(),
            relay: RelaySettings::default(),
            voice: VoiceSettings::default(),
            ticket_forms: Vec::new(),
        }
    }
}

/// AI chat service credentials.
///
/// `token` is only read from or written to the file when the keychain is
/// unavailable; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GleanSettings {
    /// Optional user to act as (sent as `X-Glean-ActAs`).
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Backend host name (no scheme).
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Relay base URL. When set, chat requests go through `{relay_url}/glean`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
}

fn default_backend() -> String {
    DEFAULT_CHAT_BACKEND.to_string()
}

fn redacted(token: &str) -> &'static str {
    if token.is_empty() { "" } else { "[redacted]" }
}

impl fmt::Debug for GleanSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GleanSettings")
            .field("email", &self.email)
            .field("token", &redacted(&self.token))
            .field("backend", &self.backend)
            .field("relay_url", &self.relay_url)
            .finish()
    }
}

impl Default for GleanSettings {
    fn default() -> Self {
        Self {
            email: String::new(),
            token: String::new(),
            backend: default_backend(),
            relay_url: None,
        }
    }
}

/// Issue tracker credentials. `token` is handled like [`GleanSettings::token`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraSettings {
    /// Site host name, e.g. `acme.atlassian.net`.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Project key, upper case.
    #[serde(default)]
    pub project: String,
    /// Relay base URL. When set, issue tracker requests go through it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<String>,
}

impl fmt::Debug for JiraSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraSettings")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("token", &redacted(&self.token))
            .field("project", &self.project)
            .field("relay_url", &self.relay_url)
            .finish()
    }
}

/// Relay server options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    #[serde(default = "default_relay_host")]
    pub host: String,
    #[serde(default = "default_relay_port")]
    pub port: u16,
    /// The single origin allowed by CORS.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    /// Issue tracker base URL. Defaults to `https://{jira.domain}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_base: Option<String>,
    /// Chat backend hosts must end with this suffix.
    #[serde(default = "default_backend_suffix")]
    pub allowed_backend_suffix: String,
}

fn default_relay_host() -> String {
    "127.0.0.1".to_string()
}

fn default_relay_port() -> u16 {
    8787
}

fn default_allowed_origin() -> String {
    "http://localhost:8000".to_string()
}

fn default_backend_suffix() -> String {
    ".glean.com".to_string()
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_relay_port(),
            allowed_origin: default_allowed_origin(),
            jira_base: None,
            allowed_backend_suffix: default_backend_suffix(),
        }
    }
}

/// Speech output for the `listen` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Text-to-speech command; the spoken text is written to its stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// A declarative ticket form: form inputs mapped to issue fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSchema {
    pub name: String,
    /// Issue type used when the form does not override it.
    pub issue_type: String,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

/// One form input mapped to one issue field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Form input name, e.g. `priority`.
    pub input: String,
    /// Target field id, e.g. `priority` or `customfield_10042`.
    pub target: String,
    #[serde(default)]
    pub transform: FieldTransform,
    #[serde(default)]
    pub required: bool,
}

/// How a form value is shaped before it lands in the issue payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTransform {
    /// Plain string.
    #[default]
    Text,
    /// `{ "name": value }`
    Named,
    /// `{ "key": value }`
    Keyed,
    /// `{ "value": value }`
    Choice,
    /// JSON number.
    Number,
    /// Comma-separated list to a string array.
    Labels,
    /// One-paragraph rich-text document.
    RichText,
}
