//! Turn selection and text extraction.
//!
//! Shared by the streaming reducer and the non-streaming path so both apply
//! the same selection, extraction, and empty-answer rules.

use opsdesk_types::chat::{Author, ChatChunk, ChatTurn, FinalAnswer};
use opsdesk_types::error::ExchangeError;

/// Separator placed between fragments of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    /// For live and spoken display.
    Space,
    /// For final rendered display.
    Newline,
}

impl Joiner {
    fn as_str(self) -> &'static str {
        match self {
            Joiner::Space => " ",
            Joiner::Newline => "\n",
        }
    }
}

/// Pick the turn that holds the answer: the last AI turn, else the last turn.
pub fn select_ai_turn(turns: &[ChatTurn]) -> Option<&ChatTurn> {
    turns
        .iter()
        .rev()
        .find(|turn| turn.author == Author::Ai)
        .or_else(|| turns.last())
}

/// Join the string fragments of a turn and trim the result.
pub fn extract_text(turn: &ChatTurn, joiner: Joiner) -> String {
    let parts: Vec<&str> = turn
        .fragments
        .iter()
        .filter_map(|fragment| fragment.text.as_deref())
        .collect();
    parts.join(joiner.as_str()).trim().to_string()
}

/// Follow-up prompts of a chunk: the answering turn's own, else the chunk's.
pub fn follow_ups_of(chunk: &ChatChunk) -> Vec<String> {
    match select_ai_turn(&chunk.messages) {
        Some(turn) if !turn.follow_up_prompts.is_empty() => turn.follow_up_prompts.clone(),
        _ => chunk.follow_up_prompts.clone(),
    }
}

/// Extract the answer of a chunk's selected turn, if there is a turn at all.
pub fn chunk_text(chunk: &ChatChunk, joiner: Joiner) -> Option<String> {
    select_ai_turn(&chunk.messages).map(|turn| extract_text(turn, joiner))
}

/// Turn one non-streaming response body into a [`FinalAnswer`].
///
/// # Errors
///
/// - [`ExchangeError::EmptyResponse`] when the body has no turn.
/// - [`ExchangeError::EmptyAnswer`] when the selected turn has no text.
pub fn answer_from_response(
    chunk: &ChatChunk,
    joiner: Joiner,
) -> Result<FinalAnswer, ExchangeError> {
    let text = chunk_text(chunk, joiner).ok_or(ExchangeError::EmptyResponse)?;
    if text.is_empty() {
        return Err(ExchangeError::EmptyAnswer);
    }
    Ok(FinalAnswer {
        text,
        session_token: chunk.chat_session_tracking_token.clone(),
        follow_ups: follow_ups_of(chunk),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_types::chat::Fragment;

    fn turn(author: Author, texts: &[&str]) -> ChatTurn {
        ChatTurn {
            author,
            fragments: texts.iter().map(|t| Fragment::text(*t)).collect(),
            follow_up_prompts: Vec::new(),
        }
    }

    #[test]
    fn test_selects_last_ai_turn() {
        let turns = vec![
            turn(Author::Ai, &["old"]),
            turn(Author::User, &["question"]),
            turn(Author::Ai, &["new"]),
            turn(Author::User, &["trailing"]),
        ];
        let selected = select_ai_turn(&turns).unwrap();
        assert_eq!(extract_text(selected, Joiner::Space), "new");
    }

    #[test]
    fn test_falls_back_to_last_turn_without_ai() {
        let turns = vec![turn(Author::User, &["first"]), turn(Author::Other, &["second"])];
        let selected = select_ai_turn(&turns).unwrap();
        assert_eq!(extract_text(selected, Joiner::Space), "second");
        assert!(select_ai_turn(&[]).is_none());
    }

    #[test]
    fn test_extract_skips_non_text_fragments_and_trims() {
        let mut t = turn(Author::Ai, &["  Hello", "world  "]);
        t.fragments.insert(1, Fragment { text: None });
        assert_eq!(extract_text(&t, Joiner::Space), "Hello world");
        assert_eq!(extract_text(&t, Joiner::Newline), "Hello\nworld");
    }

    #[test]
    fn test_follow_ups_prefer_turn_level() {
        let mut ai = turn(Author::Ai, &["answer"]);
        ai.follow_up_prompts = vec!["turn-level".to_string()];
        let chunk = ChatChunk {
            chat_session_tracking_token: None,
            messages: vec![ai],
            follow_up_prompts: vec!["chunk-level".to_string()],
        };
        assert_eq!(follow_ups_of(&chunk), vec!["turn-level".to_string()]);
    }

    #[test]
    fn test_follow_ups_fall_back_to_chunk_level() {
        let chunk = ChatChunk {
            chat_session_tracking_token: None,
            messages: vec![turn(Author::Ai, &["answer"])],
            follow_up_prompts: vec!["chunk-level".to_string()],
        };
        assert_eq!(follow_ups_of(&chunk), vec!["chunk-level".to_string()]);
    }

    #[test]
    fn test_answer_from_response() {
        let chunk = ChatChunk {
            chat_session_tracking_token: Some("tok".to_string()),
            messages: vec![turn(Author::User, &["q"]), turn(Author::Ai, &["line one", "line two"])],
            follow_up_prompts: Vec::new(),
        };
        let answer = answer_from_response(&chunk, Joiner::Newline).unwrap();
        assert_eq!(answer.text, "line one\nline two");
        assert_eq!(answer.session_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_answer_from_response_errors() {
        let empty = ChatChunk::default();
        assert_eq!(
            answer_from_response(&empty, Joiner::Newline),
            Err(ExchangeError::EmptyResponse)
        );

        let blank = ChatChunk {
            messages: vec![turn(Author::Ai, &["   "])],
            ..ChatChunk::default()
        };
        assert_eq!(
            answer_from_response(&blank, Joiner::Newline),
            Err(ExchangeError::EmptyAnswer)
        );
    }
}
