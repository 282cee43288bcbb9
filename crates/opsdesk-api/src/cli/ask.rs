//! `opsdesk ask`: one question, one answer.
//!
//! Runs the text assistant once. `--stream` switches to the streaming path
//! and, for markdown output, echoes the answer as it grows. Ctrl+C stops the
//! exchange without an error.

use std::io::Write;
use std::time::Duration;

use anyhow::bail;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, field};

use opsdesk_core::chat::assistant::{Assistant, AssistantProfile};
use opsdesk_core::erp::{self, ErpTopic};
use opsdesk_core::render::{render_markdown, to_speech_text};
use opsdesk_observe::attrs;
use opsdesk_types::chat::ExchangeOutcome;
use opsdesk_types::error::ExchangeError;

use super::AnswerFormat;
use crate::state::AppState;

/// Resolve `--erp NAME` against the catalog.
pub fn resolve_topic(state: &AppState, name: Option<&str>) -> anyhow::Result<Option<ErpTopic>> {
    let Some(name) = name else {
        return Ok(None);
    };
    match erp::find(name) {
        Some(found) => Ok(Some(ErpTopic::new(state.settings.company.clone(), found.name))),
        None => bail!("unknown ERP '{name}'. Run: opsdesk erp list"),
    }
}

/// Span for one exchange. Outcome fields are filled in by [`record_outcome`].
pub fn exchange_span(profile: &str, topic: Option<&ErpTopic>) -> tracing::Span {
    let span = tracing::info_span!(
        "chat_exchange",
        chat.profile = profile,
        chat.erp = field::Empty,
        chat.outcome = field::Empty,
        chat.answer_chars = field::Empty,
    );
    if let Some(topic) = topic {
        span.record(attrs::CHAT_ERP, topic.erp.as_str());
    }
    span
}

pub fn record_outcome(span: &tracing::Span, result: &Result<ExchangeOutcome, ExchangeError>) {
    let outcome = match result {
        Ok(ExchangeOutcome::Answered(answer)) => {
            span.record(attrs::CHAT_ANSWER_CHARS, answer.text.chars().count());
            "answered"
        }
        Ok(ExchangeOutcome::Cancelled) => "cancelled",
        Err(_) => "failed",
    };
    span.record(attrs::CHAT_OUTCOME, outcome);
}

/// Prints the growing part of live snapshots.
///
/// Snapshots are cumulative. When one extends what is already on screen only
/// the new tail is printed; a snapshot that rewrites earlier text is skipped
/// and the final answer settles it.
#[derive(Debug, Default)]
pub struct LiveEcho {
    shown: String,
}

impl LiveEcho {
    pub fn advance(&mut self, snapshot: &str) -> Option<String> {
        let tail = snapshot.strip_prefix(self.shown.as_str())?;
        if tail.is_empty() {
            return None;
        }
        let tail = tail.to_string();
        self.shown = snapshot.to_string();
        Some(tail)
    }

    /// What is left to print of the final answer, or `None` when the screen
    /// no longer matches it.
    pub fn remainder<'a>(&self, final_text: &'a str) -> Option<&'a str> {
        final_text.strip_prefix(self.shown.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}

pub fn format_answer(text: &str, format: AnswerFormat) -> String {
    match format {
        AnswerFormat::Markdown => text.to_string(),
        AnswerFormat::Html => render_markdown(text),
        AnswerFormat::Speech => to_speech_text(text),
    }
}

pub fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub fn print_follow_ups(follow_ups: &[String]) {
    if follow_ups.is_empty() {
        return;
    }
    println!();
    println!("  {}", style("Follow-up questions:").dim());
    for (i, question) in follow_ups.iter().enumerate() {
        println!("  {} {question}", style(format!("{}.", i + 1)).cyan().bold());
    }
}

/// Cancel `cancel` on the first Ctrl+C. The returned handle must be aborted
/// once the exchange is over so a later Ctrl+C behaves normally.
pub fn cancel_on_ctrl_c(cancel: &CancellationToken) -> tokio::task::JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}

pub async fn ask(
    state: &AppState,
    question: &str,
    erp: Option<&str>,
    stream: bool,
    format: AnswerFormat,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let topic = resolve_topic(state, erp)?;
    let profile = AssistantProfile {
        streaming: stream,
        ..AssistantProfile::text()
    };
    let mut assistant = Assistant::new(state.glean_client()?, profile);
    assistant.set_topic(topic);

    let echo_live = stream && format == AnswerFormat::Markdown && !json;
    let spinner = (!echo_live && !json && !quiet).then(thinking_spinner);
    let mut echo = LiveEcho::default();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(&cancel);
    let span = exchange_span("text", assistant.topic());

    let result = assistant
        .ask(question, &cancel, |snapshot| {
            if !echo_live {
                return;
            }
            if let Some(tail) = echo.advance(snapshot) {
                print!("{tail}");
                let _ = std::io::stdout().flush();
            }
        })
        .instrument(span.clone())
        .await;

    ctrl_c.abort();
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    record_outcome(&span, &result);

    let answer = match result? {
        ExchangeOutcome::Answered(answer) => answer,
        ExchangeOutcome::Cancelled => {
            if !json {
                eprintln!("\n  {}", style("Cancelled.").dim());
            }
            return Ok(());
        }
    };

    if json {
        let body = serde_json::json!({
            "text": format_answer(&answer.text, format),
            "follow_ups": answer.follow_ups,
            "session_token": answer.session_token,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match (format, echo.remainder(&answer.text)) {
        (AnswerFormat::Markdown, Some(rest)) => println!("{rest}"),
        (AnswerFormat::Markdown, None) => {
            if !echo.is_empty() {
                println!();
            }
            println!("{}", answer.text);
        }
        (format, _) => println!("{}", format_answer(&answer.text, format)),
    }

    if !quiet {
        print_follow_ups(&answer.follow_ups);
    }
    Ok(())
}
