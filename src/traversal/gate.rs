//! Concurrency gate bounding simultaneous in-flight work

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// A fixed-capacity counting semaphore
///
/// Permits are `OwnedSemaphorePermit`s, so a permit is returned when it is
/// dropped on any exit path of the worker holding it, including a panic.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Creates a gate with `capacity` permits (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free permit
    ///
    /// # Returns
    ///
    /// The permit together with how long the caller waited for it. Fails only
    /// if the semaphore has been closed.
    pub async fn acquire(&self) -> Result<(OwnedSemaphorePermit, Duration), AcquireError> {
        let start = Instant::now();
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        Ok((permit, start.elapsed()))
    }

    /// Number of permits currently free
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Capacity fixed at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
