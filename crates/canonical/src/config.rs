//! Configuration types for span canonicalization.
//!
//! [`CanonicalizeConfig`] controls how matched keyword spans are rewritten and
//! how raw text is prepared before keyword matching.
//!
//! # Versioning
//!
//! Any change to rewriting behavior must be accompanied by a `version` bump so
//! that preprocessed corpora produced under an older version stay
//! distinguishable from new ones.
//!
//! # Examples
//!
//! ```rust
//! use canonical::CanonicalizeConfig;
//!
//! let config = CanonicalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert_eq!(config.join_char, '_');
//! assert!(config.resolve_chains);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// Configuration for the canonicalizer.
///
/// Cheap to clone and serializable so it can live inside the pipeline's YAML
/// config:
///
/// ```json
/// {
///   "version": 1,
///   "join_char": "_",
///   "resolve_chains": true,
///   "whole_words": false,
///   "normalize_unicode": false,
///   "lowercase": false
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalizeConfig {
    /// Version of the rewriting rules. Must be >= 1.
    pub version: u32,

    /// Character substituted for spaces inside a canonical term, turning a
    /// collocation such as `hidden unit` into the single token `hidden_unit`.
    ///
    /// Must not be whitespace, otherwise merged collocations would split
    /// again during tokenization.
    pub join_char: char,

    /// Follow multi-hop mapping chains (`a -> b -> c`) to their terminal
    /// term. When `false`, a single flat lookup is performed.
    pub resolve_chains: bool,

    /// Only rewrite matches that start and end on word boundaries.
    ///
    /// Off by default: every reported match is rewritten. When on, a keyword
    /// such as `network` is left alone inside an already merged
    /// `neural_network`.
    #[serde(default)]
    pub whole_words: bool,

    /// Apply Unicode NFKC normalization in [`crate::Canonicalizer`] before
    /// matching. [`crate::apply`] never normalizes.
    #[serde(default)]
    pub normalize_unicode: bool,

    /// Lowercase text in [`crate::Canonicalizer`] before matching.
    #[serde(default)]
    pub lowercase: bool,
}

impl CanonicalizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_join_char(mut self, join_char: char) -> Self {
        self.join_char = join_char;
        self
    }

    pub fn with_resolve_chains(mut self, resolve: bool) -> Self {
        self.resolve_chains = resolve;
        self
    }

    pub fn with_whole_words(mut self, whole_words: bool) -> Self {
        self.whole_words = whole_words;
        self
    }

    pub fn with_normalize_unicode(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.join_char.is_whitespace() {
            return Err(CanonicalError::InvalidConfig(format!(
                "join_char must not be whitespace (got {:?})",
                self.join_char
            )));
        }
        Ok(())
    }
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            join_char: '_',
            resolve_chains: true,
            whole_words: false,
            normalize_unicode: false,
            lowercase: false,
        }
    }
}
