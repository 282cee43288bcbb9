//! Markdown to plain prose for speech output.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Passes applied in order; each replaces matches with the given template.
static PASSES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // headings
        (r"(?m)^[ \t]*#{1,6}[ \t]*", ""),
        // emphasis, longest markers first
        (r"\*\*\*(.+?)\*\*\*", "$1"),
        (r"\*\*(.+?)\*\*", "$1"),
        (r"\*(.+?)\*", "$1"),
        (r"\b___(.+?)___\b", "$1"),
        (r"\b__(.+?)__\b", "$1"),
        (r"\b_(.+?)_\b", "$1"),
        // code: delimiters and fence language tag go, content stays
        (r"(?s)```\w*\n?(.*?)```", "$1"),
        (r"`([^`\n]*)`", "$1"),
        // images before links so `![alt](src)` never leaves a `!alt`
        // targets may hold one level of balanced parentheses
        (r"!\[[^\]\n]*\]\((?:[^()\n]|\([^()\n]*\))*\)", ""),
        (r"\[([^\]\n]+)\]\((?:[^()\n]|\([^()\n]*\))*\)", "$1"),
        // rules, then list and quote markers
        (r"(?m)^[ \t]*[-*_]{3,}[ \t]*$", ""),
        (r"(?m)^[ \t]*[-*+][ \t]+", ""),
        (r"(?m)^[ \t]*\d+\.[ \t]+", ""),
        (r"(?m)^[ \t]*>[ \t]?", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid regex"), replacement))
    .collect()
});

static PAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([.!?:;,]?)[ \t]*\n(?:[ \t]*\n)+[ \t]*").expect("valid regex")
});
static LEFTOVER_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*+|#+|`+").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Project Markdown into text a speech engine can read aloud.
///
/// Blank-line runs become a spoken pause (`". "`, or just a space when the
/// paragraph already ends in punctuation); single newlines become spaces.
pub fn to_speech_text(markdown: &str) -> String {
    let mut text = markdown.replace("\r\n", "\n");
    for (pattern, replacement) in PASSES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    let text = PAUSE.replace_all(&text, |caps: &Captures| match &caps[1] {
        "" => ". ".to_string(),
        punct => format!("{punct} "),
    });
    let text = text.replace('\n', " ");
    let text = strip_leftover_syntax(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Drop marker runs the passes left behind. Backticks always go; `#` only
/// at the start of a word, so "C#" survives; `*` only when whitespace or the
/// text edge is on either side, so "2*3" survives.
fn strip_leftover_syntax(text: &str) -> String {
    let at_edge = |c: Option<char>| c.is_none_or(char::is_whitespace);

    LEFTOVER_SYNTAX
        .replace_all(text, |caps: &Captures| {
            let Some(run) = caps.get(0) else {
                return String::new();
            };
            let before = text[..run.start()].chars().next_back();
            let after = text[run.end()..].chars().next();
            let leftover = match run.as_str().chars().next() {
                Some('#') => at_edge(before),
                Some('*') => at_edge(before) || at_edge(after),
                _ => true,
            };
            if leftover {
                String::new()
            } else {
                run.as_str().to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_bold_and_link() {
        let text = to_speech_text("## Title\n\n**Hi** [link](http://x)");
        assert_eq!(text, "Title. Hi link");
        for c in ['#', '*', '[', ']', '(', ')'] {
            assert!(!text.contains(c), "found {c:?} in {text:?}");
        }
    }

    #[test]
    fn test_image_is_removed_entirely() {
        assert_eq!(
            to_speech_text("See ![diagram](http://x/d.png) above and [docs](http://x)."),
            "See above and docs."
        );
    }

    #[test]
    fn test_link_target_with_parentheses() {
        let text =
            to_speech_text("Read [docs](https://x/Foo_(bar)) and ![img](http://x/a_(b).png) now");
        assert_eq!(text, "Read docs and now");
    }

    #[test]
    fn test_code_keeps_content_without_delimiters() {
        assert_eq!(
            to_speech_text("Run `sync now` then:\n\n```bash\nretry job\n```"),
            "Run sync now then: retry job"
        );
    }

    #[test]
    fn test_lists_and_quotes_become_prose() {
        assert_eq!(
            to_speech_text("Steps:\n- open settings\n- click save\n1. wait\n> note this"),
            "Steps: open settings click save wait note this"
        );
    }

    #[test]
    fn test_pause_after_punctuation_is_not_doubled() {
        assert_eq!(to_speech_text("Done.\n\n\nNext part"), "Done. Next part");
        assert_eq!(to_speech_text("First\n \nSecond"), "First. Second");
    }

    #[test]
    fn test_underscores_inside_words_survive() {
        assert_eq!(
            to_speech_text("the job_cost_code field is _required_"),
            "the job_cost_code field is required"
        );
    }

    #[test]
    fn test_stray_markers_are_dropped() {
        assert_eq!(to_speech_text("a * b ** c # d ` e"), "a b c d e");
        assert_eq!(to_speech_text("***all***"), "all");
        assert_eq!(to_speech_text("above\n\n---\n\nbelow"), "above. below");
        assert_eq!(to_speech_text("**unclosed bold"), "unclosed bold");
    }

    #[test]
    fn test_prose_symbols_survive() {
        assert_eq!(
            to_speech_text("We use C# and F#, rated 2*3 = 6."),
            "We use C# and F#, rated 2*3 = 6."
        );
    }
}
