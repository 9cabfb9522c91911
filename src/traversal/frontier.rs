//! FIFO frontier of claimed items awaiting a worker slot

use crate::traversal::item::{PendingItem, WorkItem};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Queue of claimed-but-not-yet-dispatched items
///
/// Items leave in insertion order. Sequence ids are handed out on `pop`, so
/// they reflect dispatch order rather than discovery order.
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<PendingItem>>,
    next_sequence: AtomicU64,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    /// Creates an empty frontier; the first dequeued item gets sequence id 1
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_sequence: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingItem>> {
        // The queue holds plain data, so a panicked holder cannot leave it torn
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a claimed item
    pub fn push(&self, item: PendingItem) {
        self.lock().push_back(item);
    }

    /// Appends several claimed items, preserving their order
    pub fn extend(&self, items: impl IntoIterator<Item = PendingItem>) {
        self.lock().extend(items);
    }

    /// Dequeues the oldest item and assigns its sequence id
    pub fn pop(&self) -> Option<WorkItem> {
        let pending = self.lock().pop_front()?;
        let sequence_id = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        Some(pending.into_work_item(sequence_id))
    }

    /// Removes every queued item without dispatching it
    pub fn drain(&self) -> Vec<PendingItem> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[cfg(test)]
    fn contains(&self, identifier: &str) -> bool {
        self.lock().iter().any(|item| item.identifier == identifier)
    }
}
