//! Snippet markers and highlighting.

use serde::Deserialize;

/// Largest token count FTS5 accepts for `snippet()`.
const MAX_SNIPPET_TOKENS: u8 = 64;

/// Markers placed around highlighted terms in result snippets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SnippetStyle {
    pub open: String,
    pub close: String,
    pub ellipsis: String,
    pub max_tokens: u8,
}

impl Default for SnippetStyle {
    fn default() -> Self {
        Self {
            open: "<b>".to_string(),
            close: "</b>".to_string(),
            ellipsis: "…".to_string(),
            max_tokens: 20,
        }
    }
}

impl SnippetStyle {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            ..Self::default()
        }
    }

    pub fn ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.ellipsis = ellipsis.into();
        self
    }

    pub fn max_tokens(mut self, tokens: u8) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Token count passed to FTS5, clamped to the range it accepts.
    pub(crate) fn token_limit(&self) -> i64 {
        i64::from(self.max_tokens.clamp(1, MAX_SNIPPET_TOKENS))
    }

    /// Wraps every occurrence of `term` in `text` with the markers.
    pub(crate) fn highlight(&self, text: &str, term: &str) -> String {
        if term.is_empty() {
            return text.to_string();
        }
        text.replace(term, &format!("{}{}{}", self.open, term, self.close))
    }
}

/// Drops repeated snippets, keeping the first occurrence of each.
pub(crate) fn dedup_snippets(snippets: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for snippet in snippets {
        if !snippet.is_empty() && !unique.contains(&snippet) {
            unique.push(snippet);
        }
    }
    unique
}
