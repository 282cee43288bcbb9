//! Token resolution.
//!
//! Tokens resolve in priority order (first match wins):
//! 1. Environment: `OPSDESK_GLEAN_TOKEN`, `OPSDESK_JIRA_TOKEN`
//! 2. A [`TokenStore`], normally the OS keychain
//! 3. The settings file (only when the keychain was unavailable at save time)
//!
//! Tokens handed to the clients are wrapped in `SecretString` so they never
//! show up in `Debug` output or logs.

use opsdesk_types::config::Settings;
use opsdesk_types::error::SettingsError;

pub const GLEAN_TOKEN_ENV: &str = "OPSDESK_GLEAN_TOKEN";
pub const JIRA_TOKEN_ENV: &str = "OPSDESK_JIRA_TOKEN";

/// Token store account names.
pub const GLEAN_TOKEN_ACCOUNT: &str = "glean.token";
pub const JIRA_TOKEN_ACCOUNT: &str = "jira.token";

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    Keychain,
    File,
}

/// Persistent token storage outside the settings file.
pub trait TokenStore {
    fn get(&self, account: &str) -> Result<Option<String>, SettingsError>;
    fn set(&self, account: &str, value: &str) -> Result<(), SettingsError>;
}

/// Source of each token after [`resolve_tokens`]; `None` means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenSources {
    pub glean: Option<TokenSource>,
    pub jira: Option<TokenSource>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First non-blank of env, stored, file.
fn pick(
    env_value: Option<String>,
    stored: Option<String>,
    file_value: &str,
) -> Option<(String, TokenSource)> {
    if let Some(v) = non_blank(env_value) {
        return Some((v, TokenSource::Env));
    }
    if let Some(v) = non_blank(stored) {
        return Some((v, TokenSource::Keychain));
    }
    non_blank(Some(file_value.to_string())).map(|v| (v, TokenSource::File))
}

fn env_var(key: &str) -> Option<String> {
    // Non-unicode values are treated as unset.
    std::env::var(key).ok()
}

/// A store that cannot be read is treated as empty.
fn stored(store: &impl TokenStore, account: &str) -> Option<String> {
    match store.get(account) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(account, error = %e, "token store unavailable");
            None
        }
    }
}

/// The token a `settings set-*` prompt starts from: stored, else file.
/// The environment is ignored so an env token is never written out.
pub fn saved_token(store: &impl TokenStore, account: &str, file_value: &str) -> String {
    pick(None, stored(store, account), file_value)
        .map(|(v, _)| v)
        .unwrap_or_default()
}

/// Fill both tokens in `settings` from env, store, then file.
pub fn resolve_tokens(settings: &mut Settings, store: &impl TokenStore) -> TokenSources {
    resolve_with(settings, store, env_var)
}

fn resolve_with(
    settings: &mut Settings,
    store: &impl TokenStore,
    env: impl Fn(&str) -> Option<String>,
) -> TokenSources {
    let glean = pick(
        env(GLEAN_TOKEN_ENV),
        stored(store, GLEAN_TOKEN_ACCOUNT),
        &settings.glean.token,
    );
    let jira = pick(
        env(JIRA_TOKEN_ENV),
        stored(store, JIRA_TOKEN_ACCOUNT),
        &settings.jira.token,
    );

    let sources = TokenSources {
        glean: glean.as_ref().map(|(_, s)| *s),
        jira: jira.as_ref().map(|(_, s)| *s),
    };
    settings.glean.token = glean.map(|(v, _)| v).unwrap_or_default();
    settings.jira.token = jira.map(|(v, _)| v).unwrap_or_default();
    sources
}

/// Move a token into the store, clearing it from `token` so it is not
/// written to the settings file. When the store refuses it, the token stays
/// in place and lands in the file instead.
pub fn persist_token(store: &impl TokenStore, account: &str, token: &mut String) -> TokenSource {
    match store.set(account, token) {
        Ok(()) => {
            token.clear();
            TokenSource::Keychain
        }
        Err(e) => {
            tracing::warn!(
                account,
                error = %e,
                "keychain unavailable, token kept in settings file"
            );
            TokenSource::File
        }
    }
}

/// Mask a token for display: the last four characters survive.
pub fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 8 => "****".to_string(),
        n => {
            let tail: String = chars[n - 4..].iter().collect();
            format!("****{tail}")
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory store; `broken` makes every call fail like a headless
    /// machine without a secret service.
    #[derive(Default)]
    pub struct MemoryStore {
        pub entries: Mutex<HashMap<String, String>>,
        pub broken: bool,
    }

    impl MemoryStore {
        pub fn with(account: &str, value: &str) -> Self {
            let store = Self::default();
            store
                .entries
                .lock()
                .unwrap()
                .insert(account.to_string(), value.to_string());
            store
        }
    }

    impl TokenStore for MemoryStore {
        fn get(&self, account: &str) -> Result<Option<String>, SettingsError> {
            if self.broken {
                return Err(SettingsError::Keychain("no secret service".to_string()));
            }
            Ok(self.entries.lock().unwrap().get(account).cloned())
        }

        fn set(&self, account: &str, value: &str) -> Result<(), SettingsError> {
            if self.broken {
                return Err(SettingsError::Keychain("no secret service".to_string()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(account.to_string(), value.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn test_env_value_wins() {
        assert_eq!(
            pick(Some("from-env".to_string()), Some("stored".to_string()), "from-file"),
            Some(("from-env".to_string(), TokenSource::Env))
        );
    }

    #[test]
    fn test_store_beats_file() {
        assert_eq!(
            pick(Some("  ".to_string()), Some("stored".to_string()), "from-file"),
            Some(("stored".to_string(), TokenSource::Keychain))
        );
        assert_eq!(
            pick(None, None, " from-file "),
            Some(("from-file".to_string(), TokenSource::File))
        );
        assert_eq!(pick(None, Some(String::new()), ""), None);
    }

    #[test]
    fn test_resolve_tokens_fills_settings() {
        let store = MemoryStore::with(GLEAN_TOKEN_ACCOUNT, "glean-from-keychain");
        let mut settings = Settings::default();
        settings.jira.token = "jira-from-file".to_string();

        let env = |key: &str| (key == JIRA_TOKEN_ENV).then(|| "jira-from-env".to_string());
        let sources = resolve_with(&mut settings, &store, env);

        assert_eq!(sources.glean, Some(TokenSource::Keychain));
        assert_eq!(sources.jira, Some(TokenSource::Env));
        assert_eq!(settings.glean.token, "glean-from-keychain");
        assert_eq!(settings.jira.token, "jira-from-env");
    }

    #[test]
    fn test_unreadable_store_falls_back_to_file() {
        let store = MemoryStore {
            broken: true,
            ..MemoryStore::default()
        };
        let mut settings = Settings::default();
        settings.glean.token = "legacy".to_string();

        let sources = resolve_with(&mut settings, &store, |_| None);
        assert_eq!(sources.glean, Some(TokenSource::File));
        assert_eq!(sources.jira, None);
        assert_eq!(settings.glean.token, "legacy");
    }

    #[test]
    fn test_persist_token_moves_token_out_of_settings() {
        let store = MemoryStore::default();
        let mut token = "secret-token".to_string();
        assert_eq!(
            persist_token(&store, JIRA_TOKEN_ACCOUNT, &mut token),
            TokenSource::Keychain
        );
        assert!(token.is_empty());
        assert_eq!(saved_token(&store, JIRA_TOKEN_ACCOUNT, ""), "secret-token");
    }

    #[test]
    fn test_persist_token_keeps_token_when_store_fails() {
        let store = MemoryStore {
            broken: true,
            ..MemoryStore::default()
        };
        let mut token = "secret-token".to_string();
        assert_eq!(
            persist_token(&store, GLEAN_TOKEN_ACCOUNT, &mut token),
            TokenSource::File
        );
        assert_eq!(token, "secret-token");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("abcdefghijkl"), "****ijkl");
    }
}
