//! Metadata facets turned into sparse feature vectors.
//!
//! A document's keywords, authors and organizations each become a feature
//! named `<prefix>:<value>` (`kw:neural_network`, `au:Ada Lovelace`). The
//! vocabulary fixes the feature ids; the resulting rows feed a
//! [`Factorization`](crate::Factorization) or the index directly.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::model::{densify, SparseVector};
use crate::IndexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Keyword,
    Author,
    Organization,
}

impl FacetKind {
    pub fn prefix(self) -> &'static str {
        match self {
            FacetKind::Keyword => "kw",
            FacetKind::Author => "au",
            FacetKind::Organization => "org",
        }
    }

    pub fn feature_name(self, value: &str) -> String {
        format!("{}:{}", self.prefix(), value)
    }
}

/// Metadata attached to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFacets {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
}

impl DocumentFacets {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.authors.is_empty() && self.organizations.is_empty()
    }

    /// Feature names in facet order, repeats included.
    pub fn features(&self) -> impl Iterator<Item = String> + '_ {
        let kws = self.keywords.iter().map(|v| FacetKind::Keyword.feature_name(v));
        let aus = self.authors.iter().map(|v| FacetKind::Author.feature_name(v));
        let orgs = self
            .organizations
            .iter()
            .map(|v| FacetKind::Organization.feature_name(v));
        kws.chain(aus).chain(orgs)
    }
}

/// Fixed mapping from feature names to column ids.
///
/// Ids are assigned in sorted name order so the same corpus always yields
/// the same columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureVocabulary {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl FeatureVocabulary {
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a DocumentFacets>,
    {
        let names: BTreeSet<String> = documents
            .into_iter()
            .flat_map(|doc| doc.features())
            .collect();
        Self::from_names(names)
    }

    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut vocab = FeatureVocabulary::default();
        for name in names {
            if !vocab.ids.contains_key(&name) {
                vocab.ids.insert(name.clone(), vocab.names.len());
                vocab.names.push(name);
            }
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn feature(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Count vector for one document. Features outside the vocabulary are
    /// skipped; `None` yields the zero vector.
    pub fn vectorize(&self, facets: Option<&DocumentFacets>) -> SparseVector {
        let Some(facets) = facets else {
            return SparseVector::zeros(self.len());
        };
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for id in facets.features().filter_map(|name| self.id_of(&name)) {
            *counts.entry(id).or_insert(0.0) += 1.0;
        }
        SparseVector::from_sorted(self.len(), counts.into_iter().collect())
    }

    /// One row per document; documents without facets get a zero row.
    pub fn feature_rows<'a, I>(&self, documents: I) -> Vec<SparseVector>
    where
        I: IntoIterator<Item = Option<&'a DocumentFacets>>,
    {
        let mut missing = 0usize;
        let rows: Vec<SparseVector> = documents
            .into_iter()
            .map(|facets| {
                if facets.is_none() {
                    missing += 1;
                }
                self.vectorize(facets)
            })
            .collect();
        if missing > 0 {
            tracing::debug!(missing, "documents without facets mapped to zero rows");
        }
        rows
    }

    /// Dense `documents x features` matrix.
    pub fn feature_matrix(&self, rows: &[SparseVector]) -> Result<Array2<f32>, IndexError> {
        densify(rows, self.len())
    }
}

impl From<Vec<String>> for FeatureVocabulary {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<FeatureVocabulary> for Vec<String> {
    fn from(vocab: FeatureVocabulary) -> Self {
        vocab.names
    }
}
