//! Result store keyed by identifier

use crate::traversal::item::ProcessingResult;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Append-only collection of processing results
///
/// Each identifier is inserted exactly once. A present key doubles as the
/// second dedup guard of the claim protocol.
#[derive(Debug)]
pub struct ResultStore<T> {
    results: DashMap<String, ProcessingResult<T>>,
}

impl<T> Default for ResultStore<T> {
    fn default() -> Self {
        Self {
            results: DashMap::new(),
        }
    }
}

impl<T> ResultStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a result unless one already exists for the identifier
    ///
    /// Returns false, leaving the stored result untouched, on a duplicate.
    pub fn insert(&self, result: ProcessingResult<T>) -> bool {
        match self.results.entry(result.item.identifier.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    "Discarding duplicate result for {}",
                    result.item.identifier
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(result);
                true
            }
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.results.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T: Clone> ResultStore<T> {
    /// Returns a copy of every result ordered by sequence id
    pub fn snapshot(&self) -> Vec<ProcessingResult<T>> {
        let mut results: Vec<_> = self
            .results
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        results.sort_by_key(|result| result.item.sequence_id);
        results
    }
}
