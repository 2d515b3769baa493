//! Insertion-ordered multimap of header names to values.

use std::{collections::HashMap, fmt};

/// Header block keyed by name, preserving first-seen name order and the
/// order of repeated values under each name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
    // Position of each name in `entries`.
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append `value` under `name`, creating the name on first sight.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(&at) = self.index.get(&name) {
            self.entries[at].1.push(value);
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, vec![value]));
        }
    }

    /// Values recorded under `name`, in arrival order.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&at| self.entries[at].1.as_slice())
    }

    /// First value recorded under `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// Names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(name, values)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the map has no names.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Total number of values across all names.
    #[must_use]
    pub fn value_count(&self) -> usize { self.entries.iter().map(|(_, values)| values.len()).sum() }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<N, V> FromIterator<(N, V)> for HeaderMap
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}
