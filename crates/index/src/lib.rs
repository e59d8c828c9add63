//! # Document similarity index
//!
//! Precomputes an all-pairs similarity matrix over dense document vectors
//! (topic weights or factorized features) and serves ranked neighbor lists.
//!
//! ## Scores
//!
//! By default the matrix is the Gram matrix scaled by one global normalizer,
//! `S = (V · Vᵗ) / ‖V‖_F`. These are globally scaled dot products, not
//! cosine similarities: values are not confined to `[-1, 1]`. Per-row cosine
//! normalization and raw inner products are available through
//! [`ScoreNormalization`]. A zero normalizer yields all-zero scores.
//!
//! ## Determinism
//!
//! Each entry is one sequential dot product and the upper triangle is
//! mirrored, so the matrix is exactly symmetric and bit-for-bit identical
//! whether rows are computed in parallel or not.
//!
//! ## Example
//!
//! ```
//! use index::{IndexConfig, SimilarityIndex};
//! use ndarray::array;
//!
//! let vectors = array![[1.0_f32, 0.0], [0.8, 0.2], [0.0, 1.0]];
//! let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
//! let index = SimilarityIndex::build(ids, vectors, &IndexConfig::default()).unwrap();
//!
//! let top = index.top_n(0, 2).unwrap();
//! assert_eq!(top[0].row, 0);
//! assert_eq!(top[1].row, 1);
//! ```

mod features;
mod lookup;
mod model;
mod page;
mod persist;
mod query;
mod similarity;

pub use crate::features::{DocumentFacets, FacetKind, FeatureVocabulary};
pub use crate::lookup::DocumentLookup;
pub use crate::model::{topic_matrix, Factorization, ProjectionModel, SparseVector, TopicInference};
pub use crate::page::{paginate, Page};
pub use crate::persist::{CompressionCodec, CompressionConfig, INDEX_SCHEMA_VERSION};
pub use crate::query::Neighbor;
pub use crate::similarity::SimilarityIndex;

use bincode::error::{DecodeError, EncodeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How raw inner products are scaled into scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Divide every entry by the Frobenius norm of the vector matrix.
    #[default]
    Frobenius,
    /// Divide entry `(i, j)` by `‖vᵢ‖ · ‖vⱼ‖`.
    Cosine,
    /// Raw inner products.
    None,
}

/// Index build and storage options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub normalization: ScoreNormalization,
    /// Compute matrix rows with rayon.
    #[serde(default)]
    pub use_parallel: bool,
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalization(mut self, normalization: ScoreNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

/// Errors raised while building, querying or persisting the index.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("row {row} out of range for corpus of {len} documents")]
    RowOutOfRange { row: usize, len: usize },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("unknown document id {0:?}")]
    UnknownDocument(String),
    #[error("duplicate document id {0:?}")]
    DuplicateDocument(String),
    #[error("feature {feature} out of range for dimension {dim}")]
    FeatureOutOfRange { feature: usize, dim: usize },
    #[error("topic {topic} out of range for model with {num_topics} topics")]
    TopicOutOfRange { topic: usize, num_topics: usize },
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
    #[error("unsupported index schema version {found} (expected {expected})")]
    SchemaVersion { expected: u16, found: u16 },
    #[error("corrupt index data: {0}")]
    Corrupt(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Decode(e.to_string())
    }
}
