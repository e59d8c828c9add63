//! YAML configuration for the docsim pipeline.
//!
//! Every stage is optional in the file; missing fields take the defaults
//! shown below.
//!
//! ```yaml
//! version: "1.0"
//! name: "nips papers"
//!
//! matcher:
//!   ascii_case_insensitive: false
//!
//! canonical:
//!   version: 1
//!   join_char: "_"
//!   resolve_chains: true
//!   whole_words: true
//!   normalize_unicode: true
//!   lowercase: true
//!
//! tokens:
//!   min_len: 5
//!   extra_stopwords: []
//!   placeholder_tags: ["-PRON-"]
//!
//! dedup:
//!   version: 1
//!   shingle_width: 3
//!   max_hamming_distance: 3
//!   num_blocks: 4
//!   max_edit_distance: 2
//!   use_parallel: false
//!
//! index:
//!   normalization: "frobenius"
//!   use_parallel: true
//!   compression: "zstd"
//!   compression_level: 3
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use canonical::{default_stopwords, CanonicalizeConfig, TokenFilter, PRONOUN_PLACEHOLDER};
use dedup::DedupConfig;
use index::{CompressionCodec, CompressionConfig, IndexConfig, ScoreNormalization};
use matcher::MatcherConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsimConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub matcher: MatcherYamlConfig,

    #[serde(default)]
    pub canonical: CanonicalYamlConfig,

    #[serde(default)]
    pub tokens: TokenYamlConfig,

    #[serde(default)]
    pub dedup: DedupYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,
}

impl DocsimConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DocsimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        self.canonical_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("canonical: {e}")))?;
        self.tokens.validate()?;
        self.dedup_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("dedup: {e}")))?;
        self.index.validate()?;
        Ok(())
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig::new().with_ascii_case_insensitive(self.matcher.ascii_case_insensitive)
    }

    pub fn canonical_config(&self) -> CanonicalizeConfig {
        let c = &self.canonical;
        CanonicalizeConfig {
            version: c.version,
            ..CanonicalizeConfig::default()
        }
        .with_join_char(c.join_char)
        .with_resolve_chains(c.resolve_chains)
        .with_whole_words(c.whole_words)
        .with_normalize_unicode(c.normalize_unicode)
        .with_lowercase(c.lowercase)
    }

    /// Default stopwords plus `tokens.extra_stopwords`, built once.
    pub fn token_filter(&self) -> TokenFilter {
        let mut stopwords = (*default_stopwords()).clone();
        stopwords.extend(self.tokens.extra_stopwords.iter().map(|w| w.to_lowercase()));
        TokenFilter::new(Arc::new(stopwords))
            .with_min_len(self.tokens.min_len)
            .with_placeholder_tags(self.tokens.placeholder_tags.iter().cloned())
    }

    pub fn dedup_config(&self) -> DedupConfig {
        let d = &self.dedup;
        DedupConfig {
            version: d.version,
            ..DedupConfig::default()
        }
        .with_shingle_width(d.shingle_width)
        .with_max_hamming_distance(d.max_hamming_distance)
        .with_num_blocks(d.num_blocks)
        .with_max_edit_distance(d.max_edit_distance)
        .with_seed(d.seed)
        .with_parallel(d.use_parallel)
    }

    pub fn index_config(&self) -> IndexConfig {
        let i = &self.index;
        let codec = match i.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        IndexConfig::new()
            .with_normalization(i.normalization)
            .with_parallel(i.use_parallel)
            .with_compression(CompressionConfig::new(codec, i.compression_level))
    }
}

impl Default for DocsimConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            matcher: MatcherYamlConfig::default(),
            canonical: CanonicalYamlConfig::default(),
            tokens: TokenYamlConfig::default(),
            dedup: DedupYamlConfig::default(),
            index: IndexYamlConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherYamlConfig {
    #[serde(default)]
    pub ascii_case_insensitive: bool,
}

/// Canonical rewriting stage.
///
/// Unlike the library defaults, text is NFKC-normalized and lowercased
/// before matching, so dictionaries are expected in lowercase, and only
/// whole-word matches are rewritten so a second pass leaves merged terms
/// such as `colour_space` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_join_char")]
    pub join_char: char,

    #[serde(default = "true_value")]
    pub resolve_chains: bool,

    #[serde(default = "true_value")]
    pub whole_words: bool,

    #[serde(default = "true_value")]
    pub normalize_unicode: bool,

    #[serde(default = "true_value")]
    pub lowercase: bool,
}

impl Default for CanonicalYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            join_char: '_',
            resolve_chains: true,
            whole_words: true,
            normalize_unicode: true,
            lowercase: true,
        }
    }
}

/// Token filter applied after canonical rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenYamlConfig {
    /// Tokens must be strictly longer than this many characters.
    #[serde(default = "default_min_len")]
    pub min_len: usize,

    #[serde(default)]
    pub extra_stopwords: Vec<String>,

    #[serde(default = "default_placeholder_tags")]
    pub placeholder_tags: Vec<String>,
}

impl TokenYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.extra_stopwords.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigLoadError::Validation(
                "tokens.extra_stopwords must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TokenYamlConfig {
    fn default() -> Self {
        Self {
            min_len: default_min_len(),
            extra_stopwords: Vec::new(),
            placeholder_tags: default_placeholder_tags(),
        }
    }
}

/// Near-duplicate keyword detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_shingle_width")]
    pub shingle_width: usize,

    #[serde(default = "default_max_hamming")]
    pub max_hamming_distance: u32,

    #[serde(default = "default_num_blocks")]
    pub num_blocks: usize,

    #[serde(default = "default_max_edit")]
    pub max_edit_distance: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub use_parallel: bool,
}

impl Default for DedupYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            shingle_width: default_shingle_width(),
            max_hamming_distance: default_max_hamming(),
            num_blocks: default_num_blocks(),
            max_edit_distance: default_max_edit(),
            seed: default_seed(),
            use_parallel: false,
        }
    }
}

/// Similarity index build and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    #[serde(default)]
    pub normalization: ScoreNormalization,

    #[serde(default = "true_value")]
    pub use_parallel: bool,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_codecs = ["zstd", "none"];
        if !valid_codecs.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "index.compression must be one of: {valid_codecs:?}"
            )));
        }
        if self.compression == "zstd" && !(1..=22).contains(&self.compression_level) {
            return Err(ConfigLoadError::Validation(
                "index.compression_level must be within 1..=22".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            normalization: ScoreNormalization::default(),
            use_parallel: true,
            compression: default_compression(),
            compression_level: default_compression_level(),
        }
    }
}

// Helper functions for serde defaults
fn default_version() -> u32 {
    1
}
fn true_value() -> bool {
    true
}
fn default_join_char() -> char {
    '_'
}
fn default_min_len() -> usize {
    5
}
fn default_placeholder_tags() -> Vec<String> {
    vec![PRONOUN_PLACEHOLDER.to_string()]
}
fn default_shingle_width() -> usize {
    3
}
fn default_max_hamming() -> u32 {
    3
}
fn default_num_blocks() -> usize {
    4
}
fn default_max_edit() -> usize {
    2
}
fn default_seed() -> u64 {
    DedupConfig::default().seed
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_compression_level() -> i32 {
    3
}
