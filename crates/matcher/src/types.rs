use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Build-time options for the keyword automaton.
///
/// `MatcherConfig` is cheap to clone and serde-friendly so it can be embedded
/// in higher-level pipeline configs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MatcherConfig {
    /// Fold ASCII letters to lowercase on both keywords and scanned text.
    ///
    /// Only ASCII is folded so every character maps to exactly one character
    /// and match offsets stay aligned with the original text.
    #[serde(default)]
    pub ascii_case_insensitive: bool,
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ascii_case_insensitive(mut self, yes: bool) -> Self {
        self.ascii_case_insensitive = yes;
        self
    }
}

/// A single keyword occurrence.
///
/// Offsets are character (Unicode scalar) positions in the scanned text, not
/// byte offsets. `end` is exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Match {
    /// Character offset (inclusive) of the first matched character.
    pub start: usize,
    /// Character offset (exclusive) one past the last matched character.
    pub end: usize,
    /// Insertion position of the matched keyword in the dictionary.
    pub keyword_id: usize,
}

impl Match {
    /// Number of characters covered by the match.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open character span of the match.
    #[inline]
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Errors produced while building a [`crate::Matcher`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("duplicate keyword {keyword:?} at positions {first} and {second}")]
    DuplicateKeyword {
        keyword: String,
        first: usize,
        second: usize,
    },
    #[error("empty keyword at position {position}")]
    EmptyKeyword { position: usize },
    #[error("keyword dictionary too large: {states} automaton states")]
    TooManyStates { states: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_case_sensitive() {
        let cfg = MatcherConfig::default();
        assert!(!cfg.ascii_case_insensitive);
        assert!(MatcherConfig::new().with_ascii_case_insensitive(true).ascii_case_insensitive);
    }

    #[test]
    fn match_span_helpers() {
        let m = Match {
            start: 3,
            end: 8,
            keyword_id: 0,
        };
        assert_eq!(m.len(), 5);
        assert_eq!(m.span(), 3..8);
        assert!(!m.is_empty());
    }

    #[test]
    fn duplicate_error_mentions_keyword() {
        let err = MatchError::DuplicateKeyword {
            keyword: "neural networks".into(),
            first: 0,
            second: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("neural networks"));
        assert!(msg.contains("0 and 4"));
    }
}
