//! OS keychain storage for API tokens.
//!
//! Uses the `keyring` crate (macOS Keychain, Linux Secret Service, Windows
//! Credential Manager). Entries live under the `opsdesk` service with one
//! account per token, see [`GLEAN_TOKEN_ACCOUNT`](crate::secret::GLEAN_TOKEN_ACCOUNT).

use opsdesk_types::error::SettingsError;

use crate::secret::TokenStore;

/// Token store backed by the OS keychain.
pub struct KeychainStore {
    service_name: String,
}

impl KeychainStore {
    /// Keychain store with the default service name "opsdesk".
    pub fn new() -> Self {
        Self {
            service_name: "opsdesk".to_string(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, SettingsError> {
        keyring::Entry::new(&self.service_name, account)
            .map_err(|e| SettingsError::Keychain(format!("keychain entry error: {e}")))
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeychainStore {
    fn get(&self, account: &str) -> Result<Option<String>, SettingsError> {
        match self.entry(account)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SettingsError::Keychain(format!("keychain get error: {e}"))),
        }
    }

    fn set(&self, account: &str, value: &str) -> Result<(), SettingsError> {
        self.entry(account)?
            .set_password(value)
            .map_err(|e| SettingsError::Keychain(format!("keychain set error: {e}")))
    }
}
