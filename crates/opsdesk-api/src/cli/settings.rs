//! Settings commands: show, set-glean, set-jira.
//!
//! `set-*` commands start from the file on disk and the keychain, not from
//! the environment, so a token passed via `OPSDESK_*_TOKEN` is never written
//! out. Saved tokens go to the keychain; the file only holds one when the
//! keychain is unavailable.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Input, Password};
use opsdesk_infra::config::{
    load_settings, save_settings, settings_path, validate_glean, validate_jira,
};
use opsdesk_infra::keychain::KeychainStore;
use opsdesk_infra::secret::{
    GLEAN_TOKEN_ACCOUNT, JIRA_TOKEN_ACCOUNT, TokenSource, mask, persist_token, saved_token,
};
use opsdesk_types::config::{GleanSettings, JiraSettings, Settings};

use crate::state::AppState;

/// Flag values for `settings set-glean`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct GleanUpdate {
    pub token: Option<String>,
    pub backend: Option<String>,
    pub email: Option<String>,
    pub relay_url: Option<String>,
}

/// Flag values for `settings set-jira`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct JiraUpdate {
    pub domain: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub project: Option<String>,
    pub relay_url: Option<String>,
}

/// An empty relay URL clears it.
fn merge_relay(current: &Option<String>, update: Option<String>) -> Option<String> {
    match update {
        Some(url) if url.trim().is_empty() => None,
        Some(url) => Some(url),
        None => current.clone(),
    }
}

pub fn merge_glean(current: &GleanSettings, update: GleanUpdate) -> GleanSettings {
    GleanSettings {
        email: update.email.unwrap_or_else(|| current.email.clone()),
        token: update.token.unwrap_or_else(|| current.token.clone()),
        backend: update.backend.unwrap_or_else(|| current.backend.clone()),
        relay_url: merge_relay(&current.relay_url, update.relay_url),
    }
}

pub fn merge_jira(current: &JiraSettings, update: JiraUpdate) -> JiraSettings {
    JiraSettings {
        domain: update.domain.unwrap_or_else(|| current.domain.clone()),
        email: update.email.unwrap_or_else(|| current.email.clone()),
        token: update.token.unwrap_or_else(|| current.token.clone()),
        project: update.project.unwrap_or_else(|| current.project.clone()),
        relay_url: merge_relay(&current.relay_url, update.relay_url),
    }
}

fn prompt_text(prompt: &str, current: &str) -> Result<String> {
    let input = Input::<String>::new().with_prompt(prompt);
    let input = if current.is_empty() {
        input
    } else {
        input.default(current.to_string())
    };
    Ok(input.interact_text()?)
}

fn prompt_token(prompt: &str, current: &str) -> Result<String> {
    if !current.is_empty() {
        let replace = Password::new()
            .with_prompt(format!("{prompt} (leave empty to keep {})", mask(current)))
            .allow_empty_password(true)
            .interact()?;
        return Ok(if replace.is_empty() { current.to_string() } else { replace });
    }
    Ok(Password::new().with_prompt(prompt).interact()?)
}

fn source_label(source: Option<TokenSource>) -> &'static str {
    match source {
        Some(TokenSource::Env) => "env",
        Some(TokenSource::Keychain) => "keychain",
        Some(TokenSource::File) => "file",
        None => "-",
    }
}

/// Configure the chat service, prompting for anything not given as a flag.
pub async fn set_glean(state: &AppState, mut update: GleanUpdate, json: bool) -> Result<()> {
    let store = KeychainStore::new();
    let mut settings = load_settings(&state.data_dir).await;
    let mut current = settings.glean.clone();
    current.token = saved_token(&store, GLEAN_TOKEN_ACCOUNT, &current.token);

    if update.backend.is_none() {
        update.backend = Some(prompt_text("Backend host", &current.backend)?);
    }
    if update.token.is_none() {
        update.token = Some(prompt_token("API token", &current.token)?);
    }

    let mut glean = validate_glean(&merge_glean(&current, update))?;
    let masked = mask(&glean.token);
    let stored_in = persist_token(&store, GLEAN_TOKEN_ACCOUNT, &mut glean.token);
    settings.glean = glean;
    let path = save_settings(&state.data_dir, &settings).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "saved": true,
                "path": path.display().to_string(),
                "token": masked,
                "token_source": source_label(Some(stored_in)),
            })
        );
    } else {
        println!(
            "  {} Chat service settings saved to {} (token {} in {})",
            style("✓").green().bold(),
            style(path.display()).dim(),
            masked,
            source_label(Some(stored_in))
        );
    }
    Ok(())
}

/// Configure the issue tracker, prompting for anything not given as a flag.
pub async fn set_jira(state: &AppState, mut update: JiraUpdate, json: bool) -> Result<()> {
    let store = KeychainStore::new();
    let mut settings = load_settings(&state.data_dir).await;
    let mut current = settings.jira.clone();
    current.token = saved_token(&store, JIRA_TOKEN_ACCOUNT, &current.token);

    if update.domain.is_none() {
        update.domain = Some(prompt_text("Site (e.g. acme.atlassian.net)", &current.domain)?);
    }
    if update.email.is_none() {
        update.email = Some(prompt_text("Email", &current.email)?);
    }
    if update.project.is_none() {
        update.project = Some(prompt_text("Project key", &current.project)?);
    }
    if update.token.is_none() {
        update.token = Some(prompt_token("API token", &current.token)?);
    }

    let mut jira = validate_jira(&merge_jira(&current, update))?;
    let masked = mask(&jira.token);
    let summary = format!("{} / {}", jira.domain, jira.project);
    let stored_in = persist_token(&store, JIRA_TOKEN_ACCOUNT, &mut jira.token);
    settings.jira = jira;
    let path = save_settings(&state.data_dir, &settings).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "saved": true,
                "path": path.display().to_string(),
                "token": masked,
                "token_source": source_label(Some(stored_in)),
            })
        );
    } else {
        println!(
            "  {} Issue tracker settings saved for {} (token {} in {})",
            style("✓").green().bold(),
            style(summary).bold(),
            masked,
            source_label(Some(stored_in))
        );
    }
    Ok(())
}

/// Settings with every token replaced by its mask.
fn masked_settings(settings: &Settings) -> Settings {
    let mut masked = settings.clone();
    masked.glean.token = mask(&settings.glean.token);
    masked.jira.token = mask(&settings.jira.token);
    masked
}

/// Show current settings. Tokens are masked.
pub fn show(state: &AppState, json: bool) -> Result<()> {
    let settings = &state.settings;

    if json {
        println!("{}", serde_json::to_string_pretty(&masked_settings(settings))?);
        return Ok(());
    }

    let sources = state.token_sources;
    let or_dash = |value: &str| if value.is_empty() { "-".to_string() } else { value.to_string() };

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Setting").fg(Color::White),
        Cell::new("Value").fg(Color::White),
        Cell::new("Source").fg(Color::White),
    ]);

    let rows: Vec<(&str, String, &str)> = vec![
        ("company", settings.company.clone(), ""),
        ("glean.backend", settings.glean.backend.clone(), ""),
        ("glean.email", or_dash(&settings.glean.email), ""),
        ("glean.token", mask(&settings.glean.token), source_label(sources.glean)),
        ("glean.relay_url", or_dash(settings.glean.relay_url.as_deref().unwrap_or("")), ""),
        ("jira.domain", or_dash(&settings.jira.domain), ""),
        ("jira.email", or_dash(&settings.jira.email), ""),
        ("jira.project", or_dash(&settings.jira.project), ""),
        ("jira.token", mask(&settings.jira.token), source_label(sources.jira)),
        ("jira.relay_url", or_dash(settings.jira.relay_url.as_deref().unwrap_or("")), ""),
        (
            "relay.listen",
            format!("{}:{}", settings.relay.host, settings.relay.port),
            "",
        ),
        ("relay.allowed_origin", settings.relay.allowed_origin.clone(), ""),
        ("voice.command", or_dash(settings.voice.command.as_deref().unwrap_or("")), ""),
        ("ticket_forms", settings.ticket_forms.len().to_string(), ""),
    ];

    for (name, value, source) in rows {
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(value),
            Cell::new(source).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  {}", style(settings_path(&state.data_dir).display()).dim());
    println!("{table}");
    println!();

    Ok(())
}
