//! On-disk form of a [`SimilarityIndex`].
//!
//! A saved index is a directory with two files:
//!
//! * `similarity.bin` holds a one-byte codec tag followed by the
//!   bincode-encoded matrix and vectors, optionally zstd-compressed.
//! * `lookup.json` maps document ids to rows.

use std::fs;
use std::path::Path;

use bincode::config::standard;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use zstd::stream::{decode_all, encode_all};

use crate::lookup::DocumentLookup;
use crate::similarity::{frobenius_norm, row_norms, SimilarityIndex};
use crate::{IndexError, ScoreNormalization};

/// Bumped whenever the encoded layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

pub(crate) const MATRIX_FILE: &str = "similarity.bin";
pub(crate) const LOOKUP_FILE: &str = "lookup.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    None,
    #[default]
    Zstd,
}

impl CompressionCodec {
    fn tag(self) -> u8 {
        match self {
            CompressionCodec::None => 0,
            CompressionCodec::Zstd => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, IndexError> {
        match tag {
            0 => Ok(CompressionCodec::None),
            1 => Ok(CompressionCodec::Zstd),
            other => Err(IndexError::Corrupt(format!("unknown codec tag {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default)]
    pub codec: CompressionCodec,
    /// Zstd level, 1 to 22.
    #[serde(default = "default_level")]
    pub level: i32,
}

fn default_level() -> i32 {
    3
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: default_level(),
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        let body = match self.codec {
            CompressionCodec::None => data.to_vec(),
            CompressionCodec::Zstd => encode_all(data, self.level)?,
        };
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(self.codec.tag());
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn decompress(data: &[u8]) -> Result<Vec<u8>, IndexError> {
    let Some((&tag, body)) = data.split_first() else {
        return Err(IndexError::Corrupt("empty matrix file".into()));
    };
    match CompressionCodec::from_tag(tag)? {
        CompressionCodec::None => Ok(body.to_vec()),
        CompressionCodec::Zstd => Ok(decode_all(body)?),
    }
}

#[derive(Serialize, Deserialize)]
struct StoredMatrix {
    schema_version: u16,
    normalization: ScoreNormalization,
    documents: u64,
    features: u64,
    /// Row-major `documents x features`.
    vectors: Vec<f32>,
    /// Row-major `documents x documents`.
    scores: Vec<f32>,
}

fn to_usize(n: u64) -> Result<usize, IndexError> {
    usize::try_from(n).map_err(|_| IndexError::Corrupt(format!("dimension {n} too large")))
}

fn shaped(data: Vec<f32>, rows: usize, cols: usize, what: &str) -> Result<Array2<f32>, IndexError> {
    Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| IndexError::Corrupt(format!("{what}: {e}")))
}

impl SimilarityIndex {
    /// Write the index into `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>, compression: &CompressionConfig) -> Result<(), IndexError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let stored = StoredMatrix {
            schema_version: INDEX_SCHEMA_VERSION,
            normalization: self.normalization,
            documents: self.len() as u64,
            features: self.dim() as u64,
            vectors: self.vectors.iter().copied().collect(),
            scores: self.scores.iter().copied().collect(),
        };
        let encoded = bincode::serde::encode_to_vec(&stored, standard())?;
        let payload = compression.compress(&encoded)?;
        fs::write(dir.join(MATRIX_FILE), &payload)?;

        let lookup = serde_json::to_vec_pretty(&self.lookup)
            .map_err(|e| IndexError::Encode(e.to_string()))?;
        fs::write(dir.join(LOOKUP_FILE), lookup)?;

        tracing::info!(
            path = %dir.display(),
            documents = self.len(),
            bytes = payload.len(),
            codec = ?compression.codec,
            "index saved"
        );
        Ok(())
    }

    /// Read an index written by [`SimilarityIndex::save`].
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, IndexError> {
        let dir = dir.as_ref();
        let raw = fs::read(dir.join(MATRIX_FILE))?;
        let decoded = decompress(&raw)?;
        let (stored, _): (StoredMatrix, usize) =
            bincode::serde::decode_from_slice(&decoded, standard())?;

        if stored.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::SchemaVersion {
                expected: INDEX_SCHEMA_VERSION,
                found: stored.schema_version,
            });
        }

        let n = to_usize(stored.documents)?;
        let dim = to_usize(stored.features)?;
        let vectors = shaped(stored.vectors, n, dim, "vectors")?;
        let scores = shaped(stored.scores, n, n, "scores")?;

        let lookup: DocumentLookup = serde_json::from_slice(&fs::read(dir.join(LOOKUP_FILE))?)?;
        if lookup.len() != n {
            return Err(IndexError::Corrupt(format!(
                "lookup has {} ids for {n} documents",
                lookup.len()
            )));
        }

        tracing::debug!(path = %dir.display(), documents = n, features = dim, "index loaded");
        Ok(SimilarityIndex {
            row_norms: row_norms(vectors.view()),
            frobenius: frobenius_norm(vectors.view()),
            lookup,
            vectors,
            scores,
            normalization: stored.normalization,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexConfig;
    use ndarray::array;
    use tempfile::tempdir;

    fn sample(cfg: &IndexConfig) -> SimilarityIndex {
        SimilarityIndex::build(
            ["p1.txt", "p2.txt", "p3.txt"],
            array![[0.5, 0.1], [0.4, 0.3], [0.0, 0.9]],
            cfg,
        )
        .unwrap()
    }

    #[test]
    fn save_load_preserves_queries() {
        for codec in [CompressionCodec::Zstd, CompressionCodec::None] {
            let dir = tempdir().unwrap();
            let cfg = IndexConfig::default();
            let index = sample(&cfg);
            index
                .save(dir.path(), &CompressionConfig::default().with_codec(codec))
                .unwrap();

            let loaded = SimilarityIndex::load(dir.path()).unwrap();
            assert_eq!(loaded.scores(), index.scores());
            assert_eq!(loaded.lookup(), index.lookup());
            assert_eq!(loaded.top_n(1, 3).unwrap(), index.top_n(1, 3).unwrap());
        }
    }

    #[test]
    fn loaded_index_answers_centroid_queries() {
        let dir = tempdir().unwrap();
        let cfg = IndexConfig::new().with_normalization(ScoreNormalization::Cosine);
        let index = sample(&cfg);
        index.save(dir.path(), &cfg.compression).unwrap();
        let loaded = SimilarityIndex::load(dir.path()).unwrap();

        let model = crate::ProjectionModel::new(Array2::eye(2));
        let q = crate::SparseVector::from_pairs(2, [(1, 1.0)]).unwrap();
        assert_eq!(
            loaded.query_by_centroid(&q, 3, &model).unwrap(),
            index.query_by_centroid(&q, 3, &model).unwrap()
        );
    }

    #[test]
    fn lookup_is_plain_json() {
        let dir = tempdir().unwrap();
        sample(&IndexConfig::default())
            .save(dir.path(), &CompressionConfig::default())
            .unwrap();
        let text = fs::read_to_string(dir.path().join(LOOKUP_FILE)).unwrap();
        let map: std::collections::BTreeMap<String, usize> = serde_json::from_str(&text).unwrap();
        assert_eq!(map["p3.txt"], 2);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let err = SimilarityIndex::load(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }

    #[test]
    fn bad_codec_tag_is_corrupt() {
        let dir = tempdir().unwrap();
        sample(&IndexConfig::default())
            .save(dir.path(), &CompressionConfig::default())
            .unwrap();
        fs::write(dir.path().join(MATRIX_FILE), [9u8, 0, 0]).unwrap();
        let err = SimilarityIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::Corrupt(_)));
    }

    #[test]
    fn mismatched_lookup_is_corrupt() {
        let dir = tempdir().unwrap();
        sample(&IndexConfig::default())
            .save(dir.path(), &CompressionConfig::default())
            .unwrap();
        fs::write(dir.path().join(LOOKUP_FILE), r#"{"p1.txt":0}"#).unwrap();
        let err = SimilarityIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, IndexError::Corrupt(_)));
    }
}
