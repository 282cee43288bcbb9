//! Per-assistant conversation state.

use opsdesk_types::chat::FinalAnswer;

/// What one assistant remembers between exchanges.
///
/// Once a session token is recorded, it is sent with every following request
/// until [`ConversationState::clear`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    token: Option<String>,
    answer: Option<String>,
    follow_ups: Vec<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }

    /// Record a successful answer. An answer without a token keeps the
    /// current one.
    pub fn record(&mut self, answer: &FinalAnswer, max_follow_ups: usize) {
        self.answer = Some(answer.text.clone());
        self.follow_ups = answer
            .follow_ups
            .iter()
            .take(max_follow_ups)
            .cloned()
            .collect();
        if let Some(token) = &answer.session_token {
            self.token = Some(token.clone());
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
