//! Source room name → canonical lab name translation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Exact-match dictionary from report room names to display names.
///
/// Lookups never normalize case or whitespace. A missing entry is not an
/// error: it tells the caller to leave the record out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMapper {
    entries: BTreeMap<String, String>,
}

impl NameMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Canonical name for a raw room name, `None` when unmapped
    pub fn translate(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    /// Layer another mapping on top of this one; its entries win
    pub fn extend(&mut self, other: NameMapper) {
        self.entries.extend(other.entries);
    }

    /// Distinct canonical names, sorted
    pub fn canonical_names(&self) -> Vec<&str> {
        self.entries
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
