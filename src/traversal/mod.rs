//! Generic bounded-concurrency graph traversal
//!
//! The traversal starts from one root identifier and keeps processing newly
//! discovered identifiers until nothing new turns up. Every identifier is
//! dispatched at most once per run, no more than `max_concurrency` items are
//! processed at the same time, and a failure on one node never stops the rest.
//!
//! The work itself is supplied through the [`Processor`] trait; the crawler in
//! [`crate::crawler`] is one implementation of it.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use sumi_frontier::traversal::{EngineConfig, Processed, Processor, TraversalEngine, WorkItem};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Countdown;
//!
//! #[async_trait]
//! impl Processor for Countdown {
//!     type Output = ();
//!
//!     async fn process(&self, item: &WorkItem, _cancel: &CancellationToken) -> Processed<()> {
//!         let n: u32 = item.identifier.parse().unwrap_or(0);
//!         let next = if n > 0 { vec![(n - 1).to_string()] } else { vec![] };
//!         Processed::success((), next)
//!     }
//! }
//!
//! # async fn demo() {
//! let engine = TraversalEngine::new(Countdown, EngineConfig { max_concurrency: 4, max_depth: 10 });
//! let report = engine.run("5", &CancellationToken::new()).await;
//! assert_eq!(report.row_count, 6);
//! # }
//! ```

mod engine;
mod frontier;
mod gate;
mod item;
mod state;
mod store;
mod visited;

pub use engine::{EngineConfig, EngineState, Processor, TraversalEngine, TraversalReport};
pub use frontier::Frontier;
pub use gate::ConcurrencyGate;
pub use item::{PendingItem, ProcessError, Processed, ProcessingResult, StatusCode, WorkItem};
pub use state::{InFlightGuard, TraversalState};
pub use store::ResultStore;
pub use visited::VisitedSet;
