//! AI chat service request/response types.
//!
//! The same [`ChatChunk`] shape is used for a non-streaming response body and
//! for every line of a streaming (newline-delimited JSON) response. Streaming
//! chunks are cumulative: a later chunk's AI turn supersedes the previous one.

use serde::{Deserialize, Deserializer, Serialize};

/// Author role of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "GLEAN_AI")]
    Ai,
    /// Any role string this crate does not know about.
    #[default]
    #[serde(other)]
    Other,
}

/// One text fragment of a turn.
///
/// Fragments may also carry citations or structured results; only a
/// string-valued `text` is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(
        default,
        deserialize_with = "string_only",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// One authored message within an exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    #[serde(default)]
    pub author: Author,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub fragments: Vec<Fragment>,
    /// Turn-level follow-up suggestions.
    #[serde(
        default,
        deserialize_with = "nullable_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub follow_up_prompts: Vec<String>,
}

impl ChatTurn {
    /// A user turn with a single text fragment.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            fragments: vec![Fragment::text(text)],
            follow_up_prompts: Vec::new(),
        }
    }
}

/// One decoded response object (or one streaming line).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_session_tracking_token: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub messages: Vec<ChatTurn>,
    /// Chunk-level follow-up suggestions.
    #[serde(
        default,
        deserialize_with = "nullable_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub follow_up_prompts: Vec<String>,
}

/// Request body for the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    pub stream: bool,
    pub save_chat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_session_tracking_token: Option<String>,
}

impl ChatRequest {
    /// A single-question request. `save_chat` is always false.
    pub fn question(text: impl Into<String>, stream: bool, token: Option<&str>) -> Self {
        Self {
            messages: vec![ChatTurn::user(text)],
            stream,
            save_chat: false,
            chat_session_tracking_token: token.map(str::to_string),
        }
    }
}

/// The finalized result of one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub text: String,
    pub session_token: Option<String>,
    pub follow_ups: Vec<String>,
}

/// How an exchange ended, from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Answered(FinalAnswer),
    /// The user stopped the exchange. Not an error.
    Cancelled,
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
