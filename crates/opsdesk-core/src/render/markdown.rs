//! Markdown to HTML for untrusted model output.
//!
//! The input is escaped before any structural pass runs, so every later
//! pattern only ever sees escaped literal text. Passes run in a fixed order:
//! code blocks, inline code, headings, emphasis, rules, quotes, tables,
//! lists, and finally paragraph wrapping.
//!
//! Code is stashed behind placeholders as soon as it is converted and put
//! back after paragraph wrapping, so no later pass can rewrite code content.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const BLOCK_OPEN: char = '\u{E000}';
const INLINE_OPEN: char = '\u{E001}';
const STASH_CLOSE: char = '\u{E002}';

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\w*\n?(.*?)```").expect("valid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));

static HEADINGS: LazyLock<[(Regex, &'static str); 4]> = LazyLock::new(|| {
    [
        (Regex::new(r"(?m)^#### (.+)$").expect("valid regex"), "<h4>$1</h4>"),
        (Regex::new(r"(?m)^### (.+)$").expect("valid regex"), "<h3>$1</h3>"),
        (Regex::new(r"(?m)^## (.+)$").expect("valid regex"), "<h2>$1</h2>"),
        (Regex::new(r"(?m)^# (.+)$").expect("valid regex"), "<h1>$1</h1>"),
    ]
});

static EMPHASIS: LazyLock<[(Regex, &'static str); 6]> = LazyLock::new(|| {
    [
        (Regex::new(r"\*\*\*(.+?)\*\*\*").expect("valid regex"), "<strong><em>$1</em></strong>"),
        (Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"), "<strong>$1</strong>"),
        (Regex::new(r"\*(.+?)\*").expect("valid regex"), "<em>$1</em>"),
        (Regex::new(r"___(.+?)___").expect("valid regex"), "<strong><em>$1</em></strong>"),
        (Regex::new(r"__(.+?)__").expect("valid regex"), "<strong>$1</strong>"),
        (Regex::new(r"_(.+?)_").expect("valid regex"), "<em>$1</em>"),
    ]
});

static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^---+$").expect("valid regex"));
static QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^&gt; (.+)$").expect("valid regex"));

static TABLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^\|.+\|\n?)+").expect("valid regex"));
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[\s\-|:]+\|$").expect("valid regex"));

static UNORDERED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^[ \t]*[-*+] .+\n?)+").expect("valid regex"));
static UNORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[-*+] ").expect("valid regex"));
static ORDERED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^[ \t]*\d+\. .+\n?)+").expect("valid regex"));
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*\d+\. ").expect("valid regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid regex"));
static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<(?:h[1-6]|ul|ol|li|pre|blockquote|table|hr|p)|\x{E000})")
        .expect("valid regex")
});
static STASHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{E000}\x{E001}](\d+)\x{E002}").expect("valid regex"));

/// Render Markdown to an HTML fragment that carries no markup from the input.
pub fn render_markdown(markdown: &str) -> String {
    let mut stash = Vec::new();
    let mut html = escape_html(&markdown.replace("\r\n", "\n"));

    html = FENCED_CODE
        .replace_all(&html, |caps: &Captures| {
            let block = format!("<pre><code>{}</code></pre>", caps[1].trim());
            stash_html(&mut stash, BLOCK_OPEN, block)
        })
        .into_owned();
    html = INLINE_CODE
        .replace_all(&html, |caps: &Captures| {
            stash_html(&mut stash, INLINE_OPEN, format!("<code>{}</code>", &caps[1]))
        })
        .into_owned();

    for (pattern, replacement) in HEADINGS.iter().chain(EMPHASIS.iter()) {
        html = pattern.replace_all(&html, *replacement).into_owned();
    }

    html = RULE.replace_all(&html, "<hr>").into_owned();
    html = QUOTE.replace_all(&html, "<blockquote>$1</blockquote>").into_owned();

    html = TABLE_BLOCK.replace_all(&html, |caps: &Captures| render_table(&caps[0])).into_owned();
    html = UNORDERED_BLOCK
        .replace_all(&html, |caps: &Captures| render_list(&caps[0], "ul", &UNORDERED_MARKER))
        .into_owned();
    html = ORDERED_BLOCK
        .replace_all(&html, |caps: &Captures| render_list(&caps[0], "ol", &ORDERED_MARKER))
        .into_owned();

    html = wrap_paragraphs(&html);

    STASHED
        .replace_all(&html, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| stash.get(idx).cloned())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Escape the HTML metacharacters and drop the placeholder sentinels.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            BLOCK_OPEN | INLINE_OPEN | STASH_CLOSE => {}
            _ => out.push(c),
        }
    }
    out
}

fn stash_html(stash: &mut Vec<String>, open: char, html: String) -> String {
    stash.push(html);
    format!("{open}{}{STASH_CLOSE}", stash.len() - 1)
}

fn render_table(block: &str) -> String {
    let lines: Vec<&str> = block
        .trim()
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.len() < 2 || !TABLE_SEPARATOR.is_match(lines[1].trim()) {
        return block.to_string();
    }

    let header: String = table_cells(lines[0])
        .map(|cell| format!("<th>{cell}</th>"))
        .collect();
    let body: String = lines[2..]
        .iter()
        .map(|row| {
            let cells: String = table_cells(row).map(|cell| format!("<td>{cell}</td>")).collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();

    format!(
        "<table><thead><tr>{header}</tr></thead><tbody>{body}</tbody></table>{}",
        trailing_newline(block)
    )
}

fn table_cells(row: &str) -> impl Iterator<Item = &str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(str::trim)
}

fn render_list(block: &str, tag: &str, marker: &Regex) -> String {
    let items: String = block
        .trim()
        .split('\n')
        .map(|line| format!("<li>{}</li>", marker.replace(line, "").trim()))
        .collect();
    format!("<{tag}>{items}</{tag}>{}", trailing_newline(block))
}

fn trailing_newline(block: &str) -> &'static str {
    if block.ends_with('\n') { "\n" } else { "" }
}

fn wrap_paragraphs(html: &str) -> String {
    PARAGRAPH_BREAK
        .split(html)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            if BLOCK_START.is_match(chunk) {
                chunk.to_string()
            } else {
                format!("<p>{}</p>", chunk.replace('\n', "<br>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_escaped() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(
            render_markdown(r#"say "hi" & 'bye'"#),
            "<p>say &quot;hi&quot; &amp; &#39;bye&#39;</p>"
        );
    }

    #[test]
    fn test_bold_then_italic() {
        assert_eq!(
            render_markdown("**bold** and *italic*"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn test_triple_markers_are_bold_italic() {
        assert_eq!(render_markdown("***x***"), "<p><strong><em>x</em></strong></p>");
        assert_eq!(render_markdown("___y___"), "<p><strong><em>y</em></strong></p>");
        assert_eq!(
            render_markdown("__strong__ and _em_"),
            "<p><strong>strong</strong> and <em>em</em></p>"
        );
    }

    #[test]
    fn test_two_by_two_table() {
        let md = "| Name | Value |\n|------|:-----:|\n|  a  | 1 |\n| b |  2  |";
        assert_eq!(
            render_markdown(md),
            "<table><thead><tr><th>Name</th><th>Value</th></tr></thead>\
             <tbody><tr><td>a</td><td>1</td></tr><tr><td>b</td><td>2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_pipe_block_without_separator_stays_text() {
        assert_eq!(render_markdown("| a |\n| b |"), "<p>| a |<br>| b |</p>");
    }

    #[test]
    fn test_code_block_content_is_not_reprocessed() {
        let md = "```rust\n# not a heading\n**not bold**\n\n- not a list\n```";
        assert_eq!(
            render_markdown(md),
            "<pre><code># not a heading\n**not bold**\n\n- not a list</code></pre>"
        );
    }

    #[test]
    fn test_inline_code_keeps_markers() {
        assert_eq!(
            render_markdown("use `a*b*c` and `x_y_z` here"),
            "<p>use <code>a*b*c</code> and <code>x_y_z</code> here</p>"
        );
    }

    #[test]
    fn test_code_is_escaped_once() {
        assert_eq!(render_markdown("`<b>`"), "<p><code>&lt;b&gt;</code></p>");
    }

    #[test]
    fn test_headings_and_paragraph_breaks() {
        assert_eq!(
            render_markdown("# Title\n\nBody text\nsecond line\n\n#### Small"),
            "<h1>Title</h1>\n<p>Body text<br>second line</p>\n<h4>Small</h4>"
        );
    }

    #[test]
    fn test_crlf_input_matches_lf_input() {
        let crlf = "# Title\r\n\r\nBody text\r\nsecond line\r\n\r\n- one\r\n- two";
        let lf = crlf.replace("\r\n", "\n");
        let html = render_markdown(crlf);
        assert_eq!(html, render_markdown(&lf));
        assert!(!html.contains('\r'));
        assert!(html.starts_with("<h1>Title</h1>"));
    }

    #[test]
    fn test_lists_group_contiguous_runs() {
        assert_eq!(
            render_markdown("- one\n- two\n\n1. first\n2. second"),
            "<ul><li>one</li><li>two</li></ul>\n<ol><li>first</li><li>second</li></ol>"
        );
    }

    #[test]
    fn test_list_followed_by_paragraph() {
        assert_eq!(
            render_markdown("+ item\n\nAfter the list."),
            "<ul><li>item</li></ul>\n<p>After the list.</p>"
        );
    }

    #[test]
    fn test_rule_and_quote() {
        assert_eq!(
            render_markdown("> quoted text\n\n---"),
            "<blockquote>quoted text</blockquote>\n<hr>"
        );
    }

    #[test]
    fn test_sentinels_in_input_are_dropped() {
        let md = format!("a{BLOCK_OPEN}0{STASH_CLOSE}b");
        assert_eq!(render_markdown(&md), "<p>a0b</p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_markdown(""), "");
        assert_eq!(render_markdown("\n\n\n"), "");
    }
}
