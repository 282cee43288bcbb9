use thiserror::Error;

/// Errors from one chat exchange (question in, answer out).
///
/// All variants are terminal for the current exchange; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The response produced no parsable turn.
    #[error("the chat service returned no response; check the token and backend host")]
    EmptyResponse,

    /// A turn was found but it contained no text.
    #[error("the chat service response was empty")]
    EmptyAnswer,

    /// Non-2xx from an upstream service.
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// User-initiated stop.
    #[error("cancelled")]
    Cancelled,
}

impl ExchangeError {
    /// Whether this error must stay out of user-facing error output.
    pub fn is_silent(&self) -> bool {
        matches!(self, ExchangeError::Cancelled)
    }
}

/// Errors from building or submitting a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("unknown ticket form '{0}'")]
    UnknownForm(String),

    #[error("issue tracker returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Errors from reading, validating, or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings incomplete, missing: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("settings io error: {0}")]
    Io(String),

    #[error("settings parse error: {0}")]
    Parse(String),

    #[error("settings serialize error: {0}")]
    Serialize(String),

    #[error("{0}")]
    Keychain(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display() {
        let err = ExchangeError::Upstream {
            service: "chat",
            status: 401,
            message: "invalid token".to_string(),
        };
        assert_eq!(err.to_string(), "chat returned 401: invalid token");
    }

    #[test]
    fn test_only_cancelled_is_silent() {
        assert!(ExchangeError::Cancelled.is_silent());
        assert!(!ExchangeError::EmptyAnswer.is_silent());
        assert!(!ExchangeError::EmptyResponse.is_silent());
    }

    #[test]
    fn test_incomplete_settings_lists_fields() {
        let err = SettingsError::Incomplete(vec!["jira.domain", "jira.token"]);
        assert_eq!(
            err.to_string(),
            "settings incomplete, missing: jira.domain, jira.token"
        );
    }
}
