//! Text normalization before tokenization and cleanup after detokenization.

use regex::Regex;
use std::sync::OnceLock;

/// Artifact the tokenizer emits for pieces outside its vocabulary.
pub const UNKNOWN_TOKEN_MARKER: &str = "<unk>";

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();
static DOUBLE_QUOTES: OnceLock<Regex> = OnceLock::new();
static SINGLE_QUOTES: OnceLock<Regex> = OnceLock::new();

fn whitespace_run() -> &'static Regex {
    WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").expect("static whitespace regex"))
}

fn double_quotes() -> &'static Regex {
    DOUBLE_QUOTES.get_or_init(|| Regex::new(r"[“”«»]").expect("static quote regex"))
}

fn single_quotes() -> &'static Regex {
    SINGLE_QUOTES.get_or_init(|| Regex::new(r"[‘’´`]").expect("static quote regex"))
}

/// Options that differ between model profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextOptions {
    /// Map typographic quotes to their ASCII forms during normalization
    pub canonicalize_quotes: bool,
    /// Collapse runs of the same punctuation character during cleanup
    pub collapse_punctuation: bool,
}

/// Trim the input and collapse every internal whitespace run to one space.
///
/// With `canonicalize_quotes`, curly and angle quotes become `"` and
/// apostrophe-like marks become `'`.
pub fn normalize_text(text: &str, options: TextOptions) -> String {
    let collapsed = whitespace_run().replace_all(text.trim(), " ");
    if !options.canonicalize_quotes {
        return collapsed.into_owned();
    }
    let text = double_quotes().replace_all(&collapsed, "\"");
    single_quotes().replace_all(&text, "'").into_owned()
}

/// Clean a detokenized hypothesis.
///
/// Removes every unknown-token marker, collapses whitespace, trims the ends
/// and, with `collapse_punctuation`, squeezes repeated `.`, `,`, `!` or `?`.
/// Applying it twice gives the same result as applying it once.
pub fn clean_output(text: &str, options: TextOptions) -> String {
    let mut text = text.to_string();
    // Removal can splice a new marker together ("<un<unk>k>"), so repeat.
    while text.contains(UNKNOWN_TOKEN_MARKER) {
        text = text.replace(UNKNOWN_TOKEN_MARKER, "");
    }

    let text = whitespace_run().replace_all(text.trim(), " ");
    if options.collapse_punctuation {
        collapse_repeated_punctuation(&text)
    } else {
        text.into_owned()
    }
}

fn collapse_repeated_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous: Option<char> = None;
    for c in text.chars() {
        if matches!(c, '.' | ',' | '!' | '?') && previous == Some(c) {
            continue;
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

/// Flatten line breaks so the classifier sees a single line.
pub fn flatten_newlines(text: &str) -> String {
    text.replace('\n', " ")
}
