//! Streaming answer reduction.
//!
//! A streaming response body is newline-delimited JSON where every line is a
//! cumulative [`ChatChunk`]: each chunk's AI turn holds the whole answer so
//! far, not a delta. [`StreamingAnswerReducer`] turns body bytes into the
//! sequence of live snapshots and one final [`FinalAnswer`].

use opsdesk_types::chat::{ChatChunk, ChatTurn, FinalAnswer};
use opsdesk_types::error::ExchangeError;

use super::extract::{Joiner, extract_text, follow_ups_of, select_ai_turn};

/// Splits arbitrary byte pieces into complete lines.
///
/// Works on raw bytes so a multi-byte UTF-8 sequence split across two pieces
/// is only decoded once the whole line has arrived.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a piece and return every line it completed, without the
    /// terminator. The trailing partial line is retained.
    pub fn push(&mut self, piece: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(piece);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    /// Drain the final unterminated line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(decode_line(&line))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Joiners for the two views of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReducerOptions {
    /// Used for the live snapshots emitted by [`StreamingAnswerReducer::feed`].
    pub live_joiner: Joiner,
    /// Used when re-extracting the final answer.
    pub final_joiner: Joiner,
}

impl Default for ReducerOptions {
    fn default() -> Self {
        Self {
            live_joiner: Joiner::Space,
            final_joiner: Joiner::Space,
        }
    }
}

/// Folds cumulative chunks into live snapshots and a final answer.
///
/// Live snapshots overwrite each other; callers must display the latest one
/// in place of the previous one, never append.
#[derive(Debug)]
pub struct StreamingAnswerReducer {
    options: ReducerOptions,
    lines: LineBuffer,
    parsed_chunks: usize,
    saw_turn: bool,
    last_answer_turn: Option<ChatTurn>,
    session_token: Option<String>,
    follow_ups: Vec<String>,
    skipped: usize,
}

impl StreamingAnswerReducer {
    pub fn new(options: ReducerOptions) -> Self {
        Self {
            options,
            lines: LineBuffer::new(),
            parsed_chunks: 0,
            saw_turn: false,
            last_answer_turn: None,
            session_token: None,
            follow_ups: Vec::new(),
            skipped: 0,
        }
    }

    /// Feed one piece of body bytes. Returns one snapshot per chunk it
    /// completed whose answer text is non-empty.
    pub fn feed(&mut self, piece: &[u8]) -> Vec<String> {
        let lines = self.lines.push(piece);
        lines
            .iter()
            .filter_map(|line| self.consume_line(line))
            .collect()
    }

    /// Number of blank or unparsable lines skipped so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Flush the trailing partial line and produce the final answer.
    ///
    /// # Errors
    ///
    /// - [`ExchangeError::EmptyResponse`] when no chunk parsed or none carried a turn.
    /// - [`ExchangeError::EmptyAnswer`] when no turn carried text.
    pub fn finish(mut self) -> Result<FinalAnswer, ExchangeError> {
        // A trailing line can only complete the answer, never emit a snapshot
        // the caller would still see, so its return value is dropped.
        if let Some(line) = self.lines.finish() {
            let _ = self.consume_line(&line);
        }

        if self.skipped > 0 {
            tracing::warn!(
                skipped_lines = self.skipped,
                parsed_chunks = self.parsed_chunks,
                "skipped unparsable lines in chat stream"
            );
        }

        if self.parsed_chunks == 0 || !self.saw_turn {
            return Err(ExchangeError::EmptyResponse);
        }

        let turn = self.last_answer_turn.ok_or(ExchangeError::EmptyAnswer)?;
        let text = extract_text(&turn, self.options.final_joiner);
        if text.is_empty() {
            return Err(ExchangeError::EmptyAnswer);
        }

        Ok(FinalAnswer {
            text,
            session_token: self.session_token,
            follow_ups: self.follow_ups,
        })
    }

    fn consume_line(&mut self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.skipped += 1;
            return None;
        }

        let chunk: ChatChunk = match serde_json::from_str(trimmed) {
            Ok(chunk) => chunk,
            Err(e) => {
                self.skipped += 1;
                tracing::debug!(
                    error = %e,
                    line_len = trimmed.len(),
                    "skipping unparsable chat stream line"
                );
                return None;
            }
        };
        self.parsed_chunks += 1;

        if let Some(token) = &chunk.chat_session_tracking_token {
            self.session_token = Some(token.clone());
        }
        let follow_ups = follow_ups_of(&chunk);
        if !follow_ups.is_empty() {
            self.follow_ups = follow_ups;
        }

        let turn = select_ai_turn(&chunk.messages)?;
        self.saw_turn = true;

        let text = extract_text(turn, self.options.live_joiner);
        if text.is_empty() {
            return None;
        }
        self.last_answer_turn = Some(turn.clone());
        Some(text)
    }
}
