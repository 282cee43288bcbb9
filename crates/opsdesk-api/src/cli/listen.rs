//! `opsdesk listen`: the voice-style assistant in a terminal loop.
//!
//! Each line typed at the prompt is one utterance. Answers stream in as they
//! are generated; Ctrl+C while an answer is streaming stops it. The finished
//! answer is projected to plain text and handed to `[voice].command` when one
//! is configured.

use std::io::Write;
use std::process::Stdio;

use anyhow::anyhow;
use console::style;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use opsdesk_core::chat::assistant::{Assistant, AssistantProfile};
use opsdesk_core::chat::backend::ChatBackend;
use opsdesk_core::erp::ErpTopic;
use opsdesk_core::render::to_speech_text;
use opsdesk_types::chat::ExchangeOutcome;
use opsdesk_types::config::VoiceSettings;
use opsdesk_types::error::ExchangeError;

use super::ask::{LiveEcho, exchange_span, print_follow_ups, record_outcome, resolve_topic};
use super::input::{InputEvent, ListenInput, Utterance};
use crate::state::AppState;

pub async fn listen(state: &AppState, erp: Option<&str>) -> anyhow::Result<()> {
    let topic = resolve_topic(state, erp)?;
    let mut assistant = Assistant::new(state.glean_client()?, AssistantProfile::voice());
    assistant.set_topic(topic);

    print_banner(assistant.topic(), &state.settings.voice);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, _writer) =
        ListenInput::new(prompt).map_err(|e| anyhow!("failed to initialize input: {e}"))?;

    loop {
        let line = match input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D or type /exit to quit.").dim());
                continue;
            }
            InputEvent::Utterance(line) => line,
        };

        let question = match Utterance::parse(&line) {
            None => continue,
            Some(Utterance::Exit) => break,
            Some(Utterance::Help) => {
                print_help();
                continue;
            }
            Some(Utterance::Reset) => {
                assistant.reset();
                println!("  {} Started a new conversation.", style("✓").green().bold());
                continue;
            }
            Some(Utterance::FollowUp(n)) => match assistant.state().follow_ups().get(n - 1) {
                Some(question) => {
                    println!("  {} {question}", style("→").dim());
                    question.clone()
                }
                None => {
                    println!("  {} No follow-up question {n}.", style("?").yellow().bold());
                    continue;
                }
            },
            Some(Utterance::Ask(question)) => question,
        };

        match exchange(&mut assistant, &mut input, &question).await {
            Ok(ExchangeOutcome::Answered(answer)) => {
                if let Err(e) = speak(&state.settings.voice, &to_speech_text(&answer.text)).await {
                    tracing::warn!(error = %e, "speech command failed");
                    eprintln!(
                        "  {} Could not run the speech command: {e}",
                        style("!").yellow().bold()
                    );
                }
                print_follow_ups(assistant.state().follow_ups());
                println!();
            }
            Ok(ExchangeOutcome::Cancelled) => {
                println!("  {}", style("Stopped.").dim());
            }
            Err(e) if e.is_silent() => {}
            Err(e) => {
                eprintln!("  {} {e}", style("!").red().bold());
                eprintln!("  {}", style("Ask again, or /exit to quit.").dim());
            }
        }
    }

    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}

/// Run one exchange while still reading the prompt, so Ctrl+C can stop it.
async fn exchange<B: ChatBackend>(
    assistant: &mut Assistant<B>,
    input: &mut ListenInput,
    question: &str,
) -> Result<ExchangeOutcome, ExchangeError> {
    let cancel = CancellationToken::new();
    let span = exchange_span("voice", assistant.topic());
    let mut echo = LiveEcho::default();

    print!("\n  {} ", style("Assistant").cyan().bold());
    let _ = std::io::stdout().flush();

    let result = {
        let exchange = assistant
            .ask(question, &cancel, |snapshot| {
                if let Some(tail) = echo.advance(snapshot) {
                    print!("{tail}");
                    let _ = std::io::stdout().flush();
                }
            })
            .instrument(span.clone());
        tokio::pin!(exchange);

        loop {
            tokio::select! {
                result = &mut exchange => break result,
                event = input.read_line() => {
                    // Lines typed while an answer streams are dropped.
                    if matches!(event, InputEvent::Interrupted | InputEvent::Eof) {
                        cancel.cancel();
                    }
                }
            }
        }
    };

    if let Ok(ExchangeOutcome::Answered(answer)) = &result {
        match echo.remainder(&answer.text) {
            Some(rest) => print!("{rest}"),
            None => print!("\n  {}", answer.text),
        }
    }
    println!();

    record_outcome(&span, &result);
    result
}

/// Pipe `text` to the configured speech command's stdin. No-op without one.
async fn speak(voice: &VoiceSettings, text: &str) -> std::io::Result<()> {
    let Some(command) = voice.command.as_deref() else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }

    let mut child = tokio::process::Command::new(command)
        .args(&voice.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }

    let status = child.wait().await?;
    if !status.success() {
        tracing::warn!(status = %status, command, "speech command exited with failure");
    }
    Ok(())
}

fn print_banner(topic: Option<&ErpTopic>, voice: &VoiceSettings) {
    println!();
    println!("  {} {}", style("opsdesk").cyan().bold(), style("listening").dim());
    if let Some(topic) = topic {
        println!("  {} {}", style("ERP:").dim(), style(&topic.erp).bold());
    }
    if voice.command.is_none() {
        println!(
            "  {}",
            style("No speech command configured; answers are shown only.").dim()
        );
    }
    println!("  {}", style("Type /help for commands. Ctrl+C stops an answer.").dim());
    println!();
}

fn print_help() {
    println!();
    println!("  {}", style("Commands").bold());
    println!("    {}   pick a suggested follow-up", style("1, 2, 3").cyan());
    println!("    {}    start a new conversation", style("/reset").cyan());
    println!("    {}     leave", style("/exit").cyan());
    println!("    {}     this help", style("/help").cyan());
    println!();
}
