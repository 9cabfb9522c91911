//! Bounded-concurrency traversal engine
//!
//! The engine pulls claimed items from the frontier, gates each dispatch on a
//! concurrency permit and hands the item to a spawned worker. Workers record
//! their own result and feed newly discovered identifiers back through the
//! claim protocol; the driver loop only dispatches, reaps finished workers and
//! decides when the traversal is over.

use crate::traversal::gate::ConcurrencyGate;
use crate::traversal::item::{PendingItem, ProcessError, Processed, ProcessingResult, WorkItem};
use crate::traversal::state::TraversalState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Number of completed items between progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// The unit of work a traversal applies to every claimed item
///
/// Implementations fetch or compute whatever the item stands for and return
/// the canonical identifiers it leads to. Failures are returned in the
/// outcome, never raised: the engine records them against the node and keeps
/// going.
#[async_trait]
pub trait Processor: Send + Sync + 'static {
    /// Success payload stored on each result
    type Output: Clone + Send + Sync + 'static;

    /// Processes one work item
    ///
    /// Long-running work should watch `cancel` and return
    /// [`ProcessError::Cancelled`] once it fires.
    async fn process(&self, item: &WorkItem, cancel: &CancellationToken)
        -> Processed<Self::Output>;
}

/// Engine settings fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Capacity of the concurrency gate
    pub max_concurrency: usize,

    /// Items at this depth are processed but their discoveries are not claimed
    pub max_depth: u32,
}

/// Lifecycle of a traversal run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Root claimed and enqueued
    Seeded,
    /// Dispatching work
    Running,
    /// No further dispatches; waiting for in-flight workers
    Draining,
    /// All workers finished and all results stored
    Done,
}

impl EngineState {
    fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Seeded, Running)
                | (Seeded, Draining)
                | (Seeded, Done)
                | (Running, Draining)
                | (Draining, Done)
                | (Done, Seeded)
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Seeded => "seeded",
            EngineState::Running => "running",
            EngineState::Draining => "draining",
            EngineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a finished run hands back to the caller
#[derive(Debug, Clone)]
pub struct TraversalReport<T> {
    /// Every stored result, ordered by sequence id
    pub results: Vec<ProcessingResult<T>>,

    /// Number of results (one per processed identifier)
    pub row_count: usize,

    /// Whether the run ended because of cancellation
    pub cancelled: bool,

    /// Claimed items that were never dispatched
    pub abandoned: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// State the engine finished in
    pub final_state: EngineState,
}

impl<T> TraversalReport<T> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.row_count - self.succeeded()
    }

    /// Looks up the result for an identifier
    pub fn get(&self, identifier: &str) -> Option<&ProcessingResult<T>> {
        self.results.iter().find(|r| r.identifier() == identifier)
    }
}

/// Bookkeeping the driver keeps for each spawned worker
struct Dispatch {
    item: WorkItem,
    gate_wait: Duration,
    timestamp: DateTime<Utc>,
    started: Instant,
}

/// Drives a traversal with at most `max_concurrency` workers in flight
pub struct TraversalEngine<P: Processor> {
    processor: Arc<P>,
    config: EngineConfig,
    gate: ConcurrencyGate,
    state: Mutex<EngineState>,
}

impl<P: Processor> TraversalEngine<P> {
    /// Creates an engine; the gate capacity is fixed here for every run
    pub fn new(processor: P, config: EngineConfig) -> Self {
        Self {
            processor: Arc::new(processor),
            gate: ConcurrencyGate::new(config.max_concurrency),
            config,
            state: Mutex::new(EngineState::Seeded),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Free permits on the gate; equals the capacity whenever no work is in flight
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    fn transition(&self, next: EngineState) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == next {
            return;
        }
        if !current.can_transition_to(next) {
            warn!("Unexpected engine transition {} -> {}", *current, next);
        }
        debug!("Engine state {} -> {}", *current, next);
        *current = next;
    }

    /// Traverses from `root` with fresh per-run state
    pub async fn run(&self, root: &str, cancel: &CancellationToken) -> TraversalReport<P::Output> {
        self.run_with_state(root, Arc::new(TraversalState::new()), cancel)
            .await
    }

    /// Traverses from `root` using caller-supplied state
    ///
    /// If the state has already claimed or processed the root the run ends
    /// immediately with nothing dispatched.
    pub async fn run_with_state(
        &self,
        root: &str,
        state: Arc<TraversalState<P::Output>>,
        cancel: &CancellationToken,
    ) -> TraversalReport<P::Output> {
        let started = Instant::now();
        self.transition(EngineState::Seeded);

        if !state.claim_and_enqueue(PendingItem::root(root)) {
            info!("Root {} already claimed, nothing to traverse", root);
            self.transition(EngineState::Done);
            return self.report(&state, started, false, 0);
        }

        info!(
            "Starting traversal from {} (max concurrency {}, max depth {})",
            root,
            self.gate.capacity(),
            self.config.max_depth
        );

        let mut workers = FuturesUnordered::new();
        let mut completed = 0usize;
        let mut cancelled = cancel.is_cancelled();

        if !cancelled {
            self.transition(EngineState::Running);
        }

        while !cancelled {
            // Wait for a permit, reaping finished workers while we wait
            let acquire = self.gate.acquire();
            tokio::pin!(acquire);
            let acquired = loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break None,
                    acquired = &mut acquire => break Some(acquired),
                    Some((dispatch, joined)) = workers.next() => {
                        self.reap(&state, dispatch, joined, &mut completed, started);
                    }
                }
            };

            let (permit, gate_wait) = match acquired {
                Some(Ok(acquired)) => acquired,
                Some(Err(e)) => {
                    error!("Concurrency gate closed unexpectedly: {}", e);
                    cancelled = true;
                    break;
                }
                None => {
                    cancelled = true;
                    break;
                }
            };

            match state.frontier().pop() {
                Some(item) => {
                    workers.push(self.dispatch(&state, item, permit, gate_wait, cancel));
                }
                None => {
                    drop(permit);
                    if workers.is_empty() {
                        // Nothing queued and nothing running: no more work can appear
                        break;
                    }
                    // Frontier is transiently empty; a running worker may still discover more
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => cancelled = true,
                        Some((dispatch, joined)) = workers.next() => {
                            self.reap(&state, dispatch, joined, &mut completed, started);
                        }
                    }
                }
            }
        }

        self.transition(EngineState::Draining);
        if cancelled {
            info!(
                "Traversal cancelled, waiting for {} in-flight workers",
                state.in_flight()
            );
        }

        while let Some((dispatch, joined)) = workers.next().await {
            self.reap(&state, dispatch, joined, &mut completed, started);
        }

        let abandoned = state.frontier().drain().len();
        if abandoned > 0 {
            info!("{} claimed items were never dispatched", abandoned);
        }

        self.transition(EngineState::Done);
        let report = self.report(&state, started, cancelled, abandoned);
        info!(
            "Traversal finished: {} results ({} failed) in {:.2}s",
            report.row_count,
            report.failed(),
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Spawns a worker for `item`; the returned future resolves when it exits
    fn dispatch(
        &self,
        state: &Arc<TraversalState<P::Output>>,
        item: WorkItem,
        permit: OwnedSemaphorePermit,
        gate_wait: Duration,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = (Dispatch, Result<(), JoinError>)> {
        debug!(
            "Dispatching #{} {} at depth {} (waited {}ms for a permit)",
            item.sequence_id,
            item.identifier,
            item.depth,
            gate_wait.as_millis()
        );

        let dispatch = Dispatch {
            item: item.clone(),
            gate_wait,
            timestamp: Utc::now(),
            started: Instant::now(),
        };

        let guard = state.begin_work();
        let state = Arc::clone(state);
        let processor = Arc::clone(&self.processor);
        let cancel = cancel.clone();
        let max_depth = self.config.max_depth;
        let timestamp = dispatch.timestamp;

        let handle = tokio::spawn(async move {
            let _guard = guard;
            let started = Instant::now();
            let processed = processor.process(&item, &cancel).await;
            let elapsed = started.elapsed();
            drop(permit);

            record(&state, item, processed, elapsed, gate_wait, timestamp, max_depth);
        });

        async move { (dispatch, handle.await) }
    }

    /// Accounts for a finished worker; a panicked worker gets its result here
    fn reap(
        &self,
        state: &TraversalState<P::Output>,
        dispatch: Dispatch,
        joined: Result<(), JoinError>,
        completed: &mut usize,
        started: Instant,
    ) {
        if let Err(e) = joined {
            let error = if e.is_cancelled() {
                ProcessError::Cancelled
            } else {
                error!("Worker for {} panicked: {}", dispatch.item.identifier, e);
                ProcessError::Panicked {
                    message: e.to_string(),
                }
            };
            state.results().insert(ProcessingResult {
                elapsed: dispatch.started.elapsed(),
                gate_wait: dispatch.gate_wait,
                timestamp: dispatch.timestamp,
                item: dispatch.item,
                outcome: Err(error),
                discovered: Vec::new(),
            });
        }

        *completed += 1;
        if *completed % PROGRESS_INTERVAL == 0 {
            let secs = started.elapsed().as_secs_f64();
            let rate = if secs > 0.0 {
                *completed as f64 / secs
            } else {
                0.0
            };
            info!(
                "Progress: {} processed, {} queued, {} in flight ({:.1} items/s)",
                completed,
                state.frontier().len(),
                state.in_flight(),
                rate
            );
        }
    }

    fn report(
        &self,
        state: &TraversalState<P::Output>,
        started: Instant,
        cancelled: bool,
        abandoned: usize,
    ) -> TraversalReport<P::Output> {
        let results = state.results().snapshot();
        TraversalReport {
            row_count: results.len(),
            results,
            cancelled,
            abandoned,
            elapsed: started.elapsed(),
            final_state: self.state(),
        }
    }
}

/// Drops repeats and self references, keeping first-seen order
fn distinct_discoveries(identifier: &str, discovered: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    discovered
        .into_iter()
        .filter(|id| id != identifier && seen.insert(id.clone()))
        .collect()
}

/// Stores a worker's result, then claims its discoveries if depth allows
fn record<T>(
    state: &TraversalState<T>,
    item: WorkItem,
    processed: Processed<T>,
    elapsed: Duration,
    gate_wait: Duration,
    timestamp: DateTime<Utc>,
    max_depth: u32,
) {
    let discovered = match &processed.outcome {
        Ok(_) => distinct_discoveries(&item.identifier, processed.discovered),
        Err(e) => {
            warn!("Failed to process {}: {}", item.identifier, e);
            Vec::new()
        }
    };

    let children = if item.depth < max_depth {
        discovered.clone()
    } else {
        Vec::new()
    };
    let parent = item.clone();

    state.results().insert(ProcessingResult {
        item,
        outcome: processed.outcome,
        elapsed,
        gate_wait,
        discovered,
        timestamp,
    });

    if !children.is_empty() {
        let enqueued = state.enqueue_discovered(&parent, &children);
        debug!(
            "{} discovered {} identifiers, {} newly claimed",
            parent.identifier,
            children.len(),
            enqueued
        );
    }
}
