//! Visited set for the claim protocol

use dashmap::DashSet;

/// Thread-safe set of claimed identifiers
///
/// An identifier enters this set exactly once, when it is claimed for
/// dispatch. `DashSet::insert` is a single sharded-lock insert-if-absent, so
/// concurrent claimers of the same identifier cannot both win.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: DashSet<String>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the identifier if absent
    ///
    /// # Returns
    ///
    /// * `true` - The caller now owns the right to process this identifier
    /// * `false` - The identifier was already claimed
    pub fn try_insert(&self, identifier: &str) -> bool {
        if self.inner.contains(identifier) {
            return false;
        }
        self.inner.insert(identifier.to_string())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.inner.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
