//! Settings file loader for opsdesk.
//!
//! Reads `config.toml` from the data directory (`~/.opsdesk/` in production)
//! and deserializes it into [`Settings`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use opsdesk_types::config::{GleanSettings, JiraSettings, Settings};
use opsdesk_types::error::SettingsError;

const SETTINGS_FILE: &str = "config.toml";

/// Resolve the data directory.
///
/// Priority: `OPSDESK_DATA_DIR`, then `~/.opsdesk`, then `./.opsdesk`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OPSDESK_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".opsdesk");
    }

    PathBuf::from(".opsdesk")
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// Load settings from `{data_dir}/config.toml`.
///
/// - Missing file: [`Settings::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_settings(data_dir: &Path) -> Settings {
    let path = settings_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return Settings::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return Settings::default();
        }
    };

    match toml::from_str::<Settings>(&content) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            Settings::default()
        }
    }
}

/// Write settings to `{data_dir}/config.toml`, creating the directory.
///
/// On unix the file is owner-only (0600), since it may carry tokens when the
/// keychain is unavailable.
pub async fn save_settings(
    data_dir: &Path,
    settings: &Settings,
) -> Result<PathBuf, SettingsError> {
    let content =
        toml::to_string_pretty(settings).map_err(|e| SettingsError::Serialize(e.to_string()))?;

    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| SettingsError::Io(format!("{}: {e}", data_dir.display())))?;

    let path = settings_path(data_dir);
    let io_error = |e: std::io::Error| SettingsError::Io(format!("{}: {e}", path.display()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        use tokio::io::AsyncWriteExt;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&path)
            .await
            .map_err(io_error)?;
        // `mode` only applies to new files.
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(io_error)?;
        file.write_all(content.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
    }

    #[cfg(not(unix))]
    tokio::fs::write(&path, content).await.map_err(io_error)?;

    tracing::info!(path = %path.display(), "settings saved");
    Ok(path)
}

/// Strip a scheme and trailing slashes: `https://acme.atlassian.net/` becomes
/// `acme.atlassian.net`.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    domain.trim_end_matches('/').to_string()
}

fn normalize_relay_url(url: Option<&str>) -> Option<String> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Normalize issue tracker settings and require every field.
///
/// The domain loses its scheme and trailing slash; the project key is
/// upper-cased.
pub fn validate_jira(jira: &JiraSettings) -> Result<JiraSettings, SettingsError> {
    let normalized = JiraSettings {
        domain: normalize_domain(&jira.domain),
        email: jira.email.trim().to_string(),
        token: jira.token.trim().to_string(),
        project: jira.project.trim().to_uppercase(),
        relay_url: normalize_relay_url(jira.relay_url.as_deref()),
    };

    let missing: Vec<&'static str> = [
        ("jira.domain", normalized.domain.is_empty()),
        ("jira.email", normalized.email.is_empty()),
        ("jira.token", normalized.token.is_empty()),
        ("jira.project", normalized.project.is_empty()),
    ]
    .into_iter()
    .filter_map(|(name, is_missing)| is_missing.then_some(name))
    .collect();

    if !missing.is_empty() {
        return Err(SettingsError::Incomplete(missing));
    }
    Ok(normalized)
}

/// Normalize chat service settings. Only the token is required; a blank
/// backend falls back to the default host.
pub fn validate_glean(glean: &GleanSettings) -> Result<GleanSettings, SettingsError> {
    let backend = normalize_domain(&glean.backend);
    let normalized = GleanSettings {
        email: glean.email.trim().to_string(),
        token: glean.token.trim().to_string(),
        backend: if backend.is_empty() {
            GleanSettings::default().backend
        } else {
            backend
        },
        relay_url: normalize_relay_url(glean.relay_url.as_deref()),
    };

    if normalized.token.is_empty() {
        return Err(SettingsError::Incomplete(vec!["glean.token"]));
    }
    Ok(normalized)
}
