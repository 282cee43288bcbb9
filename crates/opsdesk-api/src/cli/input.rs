//! Async line input for the `listen` loop.
//!
//! Stands in for speech recognition: each submitted line is one utterance.
//! Ctrl+C arrives as [`InputEvent::Interrupted`] even while an answer is
//! streaming, which is how the loop stops an exchange.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// What the user did at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum InputEvent {
    Utterance(String),
    /// Ctrl+D.
    Eof,
    /// Ctrl+C.
    Interrupted,
}

/// What a submitted line asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Utterance {
    Ask(String),
    /// `1`, `2`, ... picks a suggested follow-up (1-based).
    FollowUp(usize),
    Reset,
    Exit,
    Help,
}

impl Utterance {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(match line {
            "/exit" | "/quit" => Utterance::Exit,
            "/reset" | "/new" => Utterance::Reset,
            "/help" => Utterance::Help,
            _ => match line.parse::<usize>() {
                Ok(n) if n > 0 => Utterance::FollowUp(n),
                _ => Utterance::Ask(line.to_string()),
            },
        })
    }
}

pub struct ListenInput {
    rl: Readline,
}

impl ListenInput {
    /// Returns the input handler and a `SharedWriter` for printing without
    /// clobbering the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    self.rl.add_history_entry(line.clone());
                }
                InputEvent::Utterance(line)
            }
            Ok(ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utterances() {
        assert_eq!(Utterance::parse("   "), None);
        assert_eq!(Utterance::parse("/exit"), Some(Utterance::Exit));
        assert_eq!(Utterance::parse("/reset"), Some(Utterance::Reset));
        assert_eq!(Utterance::parse("2"), Some(Utterance::FollowUp(2)));
        assert_eq!(
            Utterance::parse("0"),
            Some(Utterance::Ask("0".to_string()))
        );
        assert_eq!(
            Utterance::parse(" what is a PO? "),
            Some(Utterance::Ask("what is a PO?".to_string()))
        );
    }
}
