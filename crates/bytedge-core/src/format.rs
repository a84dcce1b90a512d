// ABOUTME: Converts the small markup subset used by agent answers into display text.
// ABOUTME: Ordered substitutions (emphasis, bullets, inline code, line breaks) over a pluggable Markup.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static STRONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid emphasis regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[•▸]\s").expect("valid bullet regex"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid inline code regex"));

/// Target representation for formatted text.
pub trait Markup {
    /// Strong emphasis around `text`
    fn strong(&self, text: &str) -> String;
    /// Replacement for a leading bullet glyph and the whitespace after it
    fn bullet(&self) -> String;
    /// Inline code around `text`
    fn code(&self, text: &str) -> String;
    /// Replacement for a newline
    fn line_break(&self) -> String;
    /// Applied to the raw input before any substitution
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }
}

/// The markup the chat widget renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html;

impl Markup for Html {
    fn strong(&self, text: &str) -> String {
        format!("<strong>{text}</strong>")
    }

    fn bullet(&self) -> String {
        r#"<span class="bullet">•</span> "#.to_string()
    }

    fn code(&self, text: &str) -> String {
        format!("<code>{text}</code>")
    }

    fn line_break(&self) -> String {
        "<br>".to_string()
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
        }
        out
    }
}

/// Format `text` as HTML.
pub fn format(text: &str) -> String {
    format_with(text, &Html)
}

/// Format `text` with any markup. The order of the passes matters: each pass
/// must only see the raw syntax it owns, never output of a later pass.
pub fn format_with<M: Markup + ?Sized>(text: &str, markup: &M) -> String {
    let escaped = markup.escape(text);
    let strong = STRONG_RE.replace_all(&escaped, |caps: &Captures| markup.strong(&caps[1]));
    let bullets = BULLET_RE.replace_all(&strong, |_: &Captures| markup.bullet());
    let code = CODE_RE.replace_all(&bullets, |caps: &Captures| markup.code(&caps[1]));
    code.replace('\n', &markup.line_break())
}
