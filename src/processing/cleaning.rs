//! Normalization applied to extracted text before chunking.

use regex::Regex;
use std::sync::LazyLock;

static MARKUP_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[A-Za-z]+(?:\{[^{}]*\})?").expect("valid markup regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

/// Strip markup-like commands and collapse whitespace runs.
///
/// Commands are a backslash followed by ASCII letters, with an optional brace group
/// (`\textbf{word}`, `\newline`). Runs of two or more whitespace characters become one space,
/// and the result is trimmed. Text matching neither pattern passes through unchanged.
pub fn clean_text(text: &str) -> String {
    let without_markup = MARKUP_COMMAND.replace_all(text, "");
    let collapsed = WHITESPACE_RUN.replace_all(&without_markup, " ");
    collapsed.trim().to_string()
}
