//! Seams to externally trained models.
//!
//! Topic models and matrix factorizations are trained elsewhere; the index
//! only needs their inference side. [`ProjectionModel`] is a bundled
//! [`Factorization`] backed by a dense component matrix.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Sparse feature vector of a fixed dimension, sorted by feature id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    entries: Vec<(usize, f32)>,
}

impl SparseVector {
    /// All-zero vector.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Build from `(feature, weight)` pairs; repeated features are summed.
    pub fn from_pairs<I>(dim: usize, pairs: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (usize, f32)>,
    {
        let mut entries: Vec<(usize, f32)> = Vec::new();
        for (feature, weight) in pairs {
            if feature >= dim {
                return Err(IndexError::FeatureOutOfRange { feature, dim });
            }
            entries.push((feature, weight));
        }
        entries.sort_by_key(|&(feature, _)| feature);

        let mut merged: Vec<(usize, f32)> = Vec::with_capacity(entries.len());
        for (feature, weight) in entries {
            if let Some((last, acc)) = merged.last_mut() {
                if *last == feature {
                    *acc += weight;
                    continue;
                }
            }
            merged.push((feature, weight));
        }
        Ok(Self {
            dim,
            entries: merged,
        })
    }

    /// Entries must already be sorted, unique and below `dim`.
    pub(crate) fn from_sorted(dim: usize, entries: Vec<(usize, f32)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        debug_assert!(entries.last().map_or(true, |&(f, _)| f < dim));
        Self { dim, entries }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|&(_, w)| w == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn to_dense(&self) -> Array1<f32> {
        let mut dense = Array1::zeros(self.dim);
        for &(feature, weight) in &self.entries {
            dense[feature] = weight;
        }
        dense
    }
}

/// Stack sparse rows into a dense `rows x dim` matrix.
pub(crate) fn densify(rows: &[SparseVector], dim: usize) -> Result<Array2<f32>, IndexError> {
    let mut dense = Array2::zeros((rows.len(), dim));
    for (r, row) in rows.iter().enumerate() {
        if row.dim() != dim {
            return Err(IndexError::DimensionMismatch {
                expected: dim,
                found: row.dim(),
            });
        }
        for (feature, weight) in row.iter() {
            dense[[r, feature]] = weight;
        }
    }
    Ok(dense)
}

/// Inference side of a topic model (for example HDP).
pub trait TopicInference {
    fn num_topics(&self) -> usize;

    /// Sparse `(topic, weight)` distribution for a token sequence.
    fn infer(&self, tokens: &[String]) -> Vec<(usize, f32)>;
}

/// Dense `documents x topics` matrix from per-document topic inference.
pub fn topic_matrix<M, D>(model: &M, documents: &[D]) -> Result<Array2<f32>, IndexError>
where
    M: TopicInference + ?Sized,
    D: AsRef<[String]>,
{
    let num_topics = model.num_topics();
    let mut matrix = Array2::zeros((documents.len(), num_topics));
    for (row, tokens) in documents.iter().enumerate() {
        for (topic, weight) in model.infer(tokens.as_ref()) {
            if topic >= num_topics {
                return Err(IndexError::TopicOutOfRange { topic, num_topics });
            }
            matrix[[row, topic]] += weight;
        }
    }
    Ok(matrix)
}

/// Maps sparse feature vectors into a reduced dense space (for example NMF).
pub trait Factorization: Send + Sync {
    /// Dimension of accepted feature vectors.
    fn n_features(&self) -> usize;

    /// Dimension of the reduced space.
    fn n_components(&self) -> usize;

    fn transform(&self, features: &SparseVector) -> Result<Array1<f32>, IndexError>;

    /// Transform a whole corpus, one row per document.
    fn transform_rows(&self, rows: &[SparseVector]) -> Result<Array2<f32>, IndexError> {
        let mut out = Array2::zeros((rows.len(), self.n_components()));
        for (r, row) in rows.iter().enumerate() {
            out.row_mut(r).assign(&self.transform(row)?);
        }
        Ok(out)
    }
}

/// Linear projection onto fixed component rows: `out[k] = Σ_f H[k, f] · x[f]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionModel {
    /// `n_components x n_features`.
    components: Array2<f32>,
}

impl ProjectionModel {
    pub fn new(components: Array2<f32>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &Array2<f32> {
        &self.components
    }
}

impl Factorization for ProjectionModel {
    fn n_features(&self) -> usize {
        self.components.ncols()
    }

    fn n_components(&self) -> usize {
        self.components.nrows()
    }

    fn transform(&self, features: &SparseVector) -> Result<Array1<f32>, IndexError> {
        if features.dim() != self.n_features() {
            return Err(IndexError::DimensionMismatch {
                expected: self.n_features(),
                found: features.dim(),
            });
        }
        let mut out = Array1::zeros(self.n_components());
        for (k, component) in self.components.rows().into_iter().enumerate() {
            out[k] = features.iter().map(|(f, w)| component[f] * w).sum();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct FixedTopics;

    impl TopicInference for FixedTopics {
        fn num_topics(&self) -> usize {
            3
        }

        fn infer(&self, tokens: &[String]) -> Vec<(usize, f32)> {
            if tokens.is_empty() {
                return Vec::new();
            }
            vec![(tokens.len() % 3, 0.75), (2, 0.25)]
        }
    }

    #[test]
    fn sparse_vector_merges_and_sorts() {
        let v = SparseVector::from_pairs(5, [(3, 1.0), (1, 2.0), (3, 0.5)]).unwrap();
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(v.to_dense(), array![0.0, 2.0, 0.0, 1.5, 0.0]);
        assert_eq!(v.nnz(), 2);
    }

    #[test]
    fn sparse_vector_rejects_out_of_range() {
        let err = SparseVector::from_pairs(2, [(2, 1.0)]).unwrap_err();
        assert_eq!(err, IndexError::FeatureOutOfRange { feature: 2, dim: 2 });
    }

    #[test]
    fn topic_matrix_rows_follow_documents() {
        let docs = vec![
            vec!["kernel".to_string()],
            Vec::new(),
            vec!["a".to_string(), "b".to_string()],
        ];
        let m = topic_matrix(&FixedTopics, &docs).unwrap();
        assert_eq!(m, array![[0.0, 0.75, 0.25], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn projection_transforms_sparse_features() {
        let model = ProjectionModel::new(array![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]]);
        let x = SparseVector::from_pairs(3, [(0, 1.0), (2, 0.5)]).unwrap();
        assert_eq!(model.transform(&x).unwrap(), array![2.0, 0.5]);

        let rows = vec![x, SparseVector::zeros(3)];
        assert_eq!(
            model.transform_rows(&rows).unwrap(),
            array![[2.0, 0.5], [0.0, 0.0]]
        );
    }

    #[test]
    fn projection_checks_dimension() {
        let model = ProjectionModel::new(array![[1.0, 0.0]]);
        let err = model.transform(&SparseVector::zeros(3)).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }
}
