use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Bidirectional map between external document ids and corpus rows.
///
/// Serialized as a JSON object `{ "id": row, ... }`; loading checks that
/// rows form exactly `0..len`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, usize>", try_from = "BTreeMap<String, usize>")]
pub struct DocumentLookup {
    ids: Vec<String>,
    rows: HashMap<String, usize>,
}

impl DocumentLookup {
    /// Rows are assigned in iteration order. Repeated ids are rejected.
    pub fn from_ids<I, S>(ids: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lookup = DocumentLookup::default();
        for id in ids {
            let id = id.into();
            if lookup.rows.contains_key(&id) {
                return Err(IndexError::DuplicateDocument(id));
            }
            lookup.rows.insert(id.clone(), lookup.ids.len());
            lookup.ids.push(id);
        }
        Ok(lookup)
    }

    pub fn row(&self, id: &str) -> Option<usize> {
        self.rows.get(id).copied()
    }

    pub fn id(&self, row: usize) -> Option<&str> {
        self.ids.get(row).map(String::as_str)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl From<DocumentLookup> for BTreeMap<String, usize> {
    fn from(lookup: DocumentLookup) -> Self {
        lookup.rows.into_iter().collect()
    }
}

impl TryFrom<BTreeMap<String, usize>> for DocumentLookup {
    type Error = IndexError;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self, Self::Error> {
        let len = map.len();
        let mut slots: Vec<Option<String>> = vec![None; len];
        for (id, row) in map {
            let Some(slot) = slots.get_mut(row) else {
                return Err(IndexError::RowOutOfRange { row, len });
            };
            if slot.is_some() {
                return Err(IndexError::Corrupt(format!("row {row} assigned twice")));
            }
            *slot = Some(id);
        }
        // Every slot is filled: `len` distinct rows below `len`.
        DocumentLookup::from_ids(slots.into_iter().flatten())
    }
}
