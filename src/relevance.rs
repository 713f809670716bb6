//! Keyword relevance gate between fetching and extraction.

use regex::{Regex, RegexBuilder};

/// Terms that mark a page as worth sending to extraction.
pub const DEFAULT_KEYWORD_PATTERN: &str =
    r"(model card|model-card|card|documentation|AI|health|derm|vision)";

#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    pattern: Regex,
}

impl RelevanceClassifier {
    /// Compile `pattern` case-insensitively.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// True iff the keyword pattern occurs in `title + "\n" + body_text`.
    pub fn is_relevant(&self, title: &str, body_text: &str) -> bool {
        self.pattern.is_match(&format!("{}\n{}", title, body_text))
    }
}

impl Default for RelevanceClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_PATTERN).expect("default keyword pattern compiles")
    }
}
