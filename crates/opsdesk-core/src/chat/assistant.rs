//! One assistant instance: a chat backend plus its conversation state.
//!
//! The voice-style and text assistants differ only by [`AssistantProfile`];
//! each owns its own [`ConversationState`] and may run concurrently with the
//! other. A single exchange per assistant is enforced by `&mut self`.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use opsdesk_types::chat::{ChatRequest, ExchangeOutcome, FinalAnswer};
use opsdesk_types::error::ExchangeError;

use super::backend::ChatBackend;
use super::extract::{Joiner, answer_from_response};
use super::reducer::ReducerOptions;
use super::state::ConversationState;
use super::stream::{AnswerEvent, answer_events};
use crate::erp::ErpTopic;

/// How an assistant talks to the backend and what it keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistantProfile {
    pub streaming: bool,
    pub options: ReducerOptions,
    pub max_follow_ups: usize,
}

impl AssistantProfile {
    /// Streaming, space-joined, three follow-ups.
    pub fn voice() -> Self {
        Self {
            streaming: true,
            options: ReducerOptions {
                live_joiner: Joiner::Space,
                final_joiner: Joiner::Space,
            },
            max_follow_ups: 3,
        }
    }

    /// Non-streaming, newline-joined, four follow-ups.
    pub fn text() -> Self {
        Self {
            streaming: false,
            options: ReducerOptions {
                live_joiner: Joiner::Newline,
                final_joiner: Joiner::Newline,
            },
            max_follow_ups: 4,
        }
    }
}

pub struct Assistant<B: ChatBackend> {
    backend: B,
    profile: AssistantProfile,
    state: ConversationState,
    topic: Option<ErpTopic>,
}

impl<B: ChatBackend> Assistant<B> {
    pub fn new(backend: B, profile: AssistantProfile) -> Self {
        Self {
            backend,
            profile,
            state: ConversationState::new(),
            topic: None,
        }
    }

    pub fn profile(&self) -> &AssistantProfile {
        &self.profile
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn topic(&self) -> Option<&ErpTopic> {
        self.topic.as_ref()
    }

    /// Scope following questions to an ERP. A different topic starts a new
    /// conversation.
    pub fn set_topic(&mut self, topic: Option<ErpTopic>) {
        if self.topic != topic {
            self.state.clear();
        }
        self.topic = topic;
    }

    /// Forget the session token and the last answer.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Run one exchange.
    ///
    /// `on_update` receives every live snapshot; each one replaces the
    /// previous. On success the answer is recorded in the state. Failure and
    /// cancellation leave the state as it was.
    pub async fn ask<F>(
        &mut self,
        question: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> Result<ExchangeOutcome, ExchangeError>
    where
        F: FnMut(&str),
    {
        let prompt = match &self.topic {
            Some(topic) => topic.question(question),
            None => question.to_string(),
        };
        let request = ChatRequest::question(prompt, self.profile.streaming, self.state.token());

        tracing::info!(
            streaming = self.profile.streaming,
            has_token = request.chat_session_tracking_token.is_some(),
            erp = self.topic.as_ref().map(|t| t.erp.as_str()),
            "sending chat request"
        );

        let result = if self.profile.streaming {
            self.exchange_streaming(request, cancel, &mut on_update).await
        } else {
            self.exchange_once(&request, cancel).await
        };

        match result {
            Ok(answer) => {
                self.state.record(&answer, self.profile.max_follow_ups);
                Ok(ExchangeOutcome::Answered(answer))
            }
            Err(ExchangeError::Cancelled) => {
                tracing::info!("chat exchange cancelled");
                Ok(ExchangeOutcome::Cancelled)
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat exchange failed");
                Err(e)
            }
        }
    }

    async fn exchange_streaming<F>(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
        on_update: &mut F,
    ) -> Result<FinalAnswer, ExchangeError>
    where
        F: FnMut(&str),
    {
        let bytes = self.backend.stream(request);
        let mut events = answer_events(bytes, self.profile.options, cancel.clone());

        while let Some(event) = events.next().await {
            match event? {
                AnswerEvent::Partial(text) => on_update(&text),
                AnswerEvent::Final(answer) => return Ok(answer),
            }
        }
        Err(ExchangeError::EmptyResponse)
    }

    async fn exchange_once(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<FinalAnswer, ExchangeError> {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExchangeError::Cancelled),
            chunk = self.backend.complete(request) => chunk?,
        };
        answer_from_response(&chunk, self.profile.options.final_joiner)
    }
}
