//! Per-run shared traversal state and the claim protocol

use crate::traversal::frontier::Frontier;
use crate::traversal::item::{PendingItem, WorkItem};
use crate::traversal::store::ResultStore;
use crate::traversal::visited::VisitedSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The only mutable state shared between the driver loop and its workers
///
/// Constructed explicitly for each run and passed in, so independent
/// traversals can share a process without interfering.
#[derive(Debug)]
pub struct TraversalState<T> {
    visited: VisitedSet,
    frontier: Frontier,
    results: ResultStore<T>,
    in_flight: AtomicUsize,
}

impl<T> Default for TraversalState<T> {
    fn default() -> Self {
        Self {
            visited: VisitedSet::new(),
            frontier: Frontier::new(),
            results: ResultStore::new(),
            in_flight: AtomicUsize::new(0),
        }
    }
}

impl<T> TraversalState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims an identifier for dispatch
    ///
    /// Succeeds at most once per identifier for the lifetime of this state.
    /// A stored result also blocks the claim, which keeps caller-supplied
    /// state with earlier results from re-processing them.
    pub fn try_claim(&self, identifier: &str) -> bool {
        if self.results.contains(identifier) {
            return false;
        }
        self.visited.try_insert(identifier)
    }

    /// Claims and enqueues an item; returns whether it was enqueued
    pub fn claim_and_enqueue(&self, item: PendingItem) -> bool {
        if !self.try_claim(&item.identifier) {
            tracing::trace!("Already claimed: {}", item.identifier);
            return false;
        }
        tracing::debug!(
            "Claimed {} at depth {} (from {})",
            item.identifier,
            item.depth,
            item.discovered_from.as_deref().unwrap_or("-")
        );
        self.frontier.push(item);
        true
    }

    /// Claims each identifier discovered by `parent` and enqueues the winners
    ///
    /// Discovery order is preserved into the frontier. Returns the number of
    /// identifiers enqueued.
    pub fn enqueue_discovered(&self, parent: &WorkItem, discovered: &[String]) -> usize {
        discovered
            .iter()
            .filter(|identifier| {
                self.claim_and_enqueue(PendingItem::child_of(parent, identifier.as_str()))
            })
            .count()
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn results(&self) -> &ResultStore<T> {
        &self.results
    }

    /// Number of dispatched workers that have not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Marks one worker as dispatched; the guard marks it complete on drop
    ///
    /// The guard moves into the worker task, so the count drops even when the
    /// worker unwinds.
    pub fn begin_work(self: &Arc<Self>) -> InFlightGuard<T> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            state: Arc::clone(self),
        }
    }
}

/// Decrements the in-flight counter when dropped
pub struct InFlightGuard<T> {
    state: Arc<TraversalState<T>>,
}

impl<T> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
