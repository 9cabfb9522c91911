//! Integration tests for the traversal engine
//!
//! These tests drive the engine with an in-memory graph instead of HTTP so
//! that the claim protocol, concurrency bound and cancellation can be checked
//! without network timing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sumi_frontier::output::write_csv;
use sumi_frontier::traversal::{
    EngineConfig, EngineState, ProcessError, Processed, Processor, TraversalEngine,
    TraversalState, WorkItem,
};
use tokio_util::sync::CancellationToken;

/// Processes identifiers by looking up their edges in a fixed graph
#[derive(Default)]
struct MapProcessor {
    edges: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    delay: Option<Duration>,
    current: AtomicUsize,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl MapProcessor {
    /// Builds a graph from `(node, "space separated successors")` pairs
    fn new(edges: &[(&str, &str)]) -> Self {
        Self {
            edges: edges
                .iter()
                .map(|(from, to)| {
                    (
                        from.to_string(),
                        to.split_whitespace().map(str::to_string).collect(),
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    fn failing(mut self, identifier: &str) -> Self {
        self.failing.insert(identifier.to_string());
        self
    }

    fn panicking(mut self, identifier: &str) -> Self {
        self.panicking.insert(identifier.to_string());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Processor for MapProcessor {
    type Output = ();

    async fn process(&self, item: &WorkItem, cancel: &CancellationToken) -> Processed<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let cancelled = match self.delay {
            Some(delay) => tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            },
            None => false,
        };

        self.current.fetch_sub(1, Ordering::SeqCst);

        if cancelled {
            return Processed::failure(ProcessError::Cancelled);
        }

        if self.panicking.contains(&item.identifier) {
            panic!("processor bug on {}", item.identifier);
        }

        let edges = self
            .edges
            .get(&item.identifier)
            .cloned()
            .unwrap_or_default();

        if self.failing.contains(&item.identifier) {
            // Links of a failed item must never be followed
            return Processed {
                outcome: Err(ProcessError::Transport {
                    message: "connection refused".to_string(),
                }),
                discovered: edges,
            };
        }

        Processed::success((), edges)
    }
}

fn build_engine(
    processor: MapProcessor,
    max_concurrency: usize,
    max_depth: u32,
) -> TraversalEngine<MapProcessor> {
    TraversalEngine::new(
        processor,
        EngineConfig {
            max_concurrency,
            max_depth,
        },
    )
}

/// A linear chain `0 -> 1 -> ... -> len-1`
fn chain(len: usize) -> Vec<(String, Vec<String>)> {
    (0..len)
        .map(|i| {
            let next = if i + 1 < len {
                vec![(i + 1).to_string()]
            } else {
                vec![]
            };
            (i.to_string(), next)
        })
        .collect()
}

fn processor_from(edges: Vec<(String, Vec<String>)>) -> MapProcessor {
    MapProcessor {
        edges: edges.into_iter().collect(),
        ..MapProcessor::default()
    }
}

#[tokio::test]
async fn test_diamond_graph_visits_each_node_once() {
    let processor = MapProcessor::new(&[
        ("A", "B C"),
        ("B", "A D"),
        ("C", "D"),
        ("D", ""),
    ]);
    let calls = Arc::clone(&processor.calls);
    let engine = build_engine(processor, 2, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(report.failed(), 0);
    assert!(!report.cancelled);
    assert_eq!(report.abandoned, 0);
    assert_eq!(report.final_state, EngineState::Done);

    let root = report.get("A").unwrap();
    assert_eq!(root.discovered.len(), 2);
    assert_eq!(root.item.depth, 0);
    assert_eq!(root.item.sequence_id, 1);
    assert!(root.item.discovered_from.is_none());

    let d = report.get("D").unwrap();
    assert_eq!(d.item.depth, 2);
    assert!(matches!(d.item.discovered_from.as_deref(), Some("B") | Some("C")));
}

#[tokio::test]
async fn test_discovered_identifiers_are_distinct() {
    let processor = MapProcessor::new(&[("A", "B C B A C"), ("B", ""), ("C", "")]);
    let engine = build_engine(processor, 2, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 3);
    let root = report.get("A").unwrap();
    assert_eq!(root.discovered, vec!["B".to_string(), "C".to_string()]);

    let mut buffer = Vec::new();
    write_csv(&mut buffer, &report.results).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let row: Vec<&str> = text.lines().nth(1).unwrap().split(',').collect();
    assert_eq!(row[0], "A");
    assert_eq!(row[5], "2");
}

#[tokio::test]
async fn test_results_ordered_by_sequence() {
    let processor = MapProcessor::new(&[("A", "B C"), ("B", "D"), ("C", "E")]);
    let engine = build_engine(processor, 3, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    let sequence: Vec<u64> = report.results.iter().map(|r| r.item.sequence_id).collect();
    assert_eq!(sequence, vec![1, 2, 3, 4, 5]);

    // Breadth-first: every item sits no shallower than the one dispatched before it
    let depths: Vec<u32> = report.results.iter().map(|r| r.item.depth).collect();
    assert!(depths.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_failing_node_recorded_without_discoveries() {
    let processor =
        MapProcessor::new(&[("A", "X B"), ("X", "Y"), ("B", "")]).failing("X");
    let engine = build_engine(processor, 2, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 3);
    assert_eq!(report.failed(), 1);
    assert!(report.get("Y").is_none());

    let failed = report.get("X").unwrap();
    assert!(!failed.is_success());
    assert!(failed.discovered.is_empty());
    assert_eq!(failed.error().map(|e| e.kind()), Some("transport_error"));
    assert_eq!(failed.status_label(), "transport_error");
}

#[tokio::test]
async fn test_depth_bound() {
    let engine = build_engine(processor_from(chain(5)), 2, 2);

    let report = engine.run("0", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 3);
    assert!(report.get("3").is_none());

    // The deepest item still reports what it found, it just is not followed
    let deepest = report.get("2").unwrap();
    assert_eq!(deepest.item.depth, 2);
    assert_eq!(deepest.discovered, vec!["3".to_string()]);
}

#[tokio::test]
async fn test_depth_zero_processes_root_only() {
    let processor = MapProcessor::new(&[("A", "B C")]);
    let engine = build_engine(processor, 4, 0);

    let report = engine.run("A", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 1);
    assert_eq!(report.get("A").unwrap().discovered.len(), 2);
}

#[tokio::test]
async fn test_cycles_terminate() {
    let processor = MapProcessor::new(&[
        ("A", "B"),
        ("B", "C A"),
        ("C", "A B C"),
    ]);
    let engine = build_engine(processor, 3, 100);

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.run("A", &CancellationToken::new()),
    )
    .await
    .expect("traversal of a cyclic graph did not terminate");

    assert_eq!(report.row_count, 3);
}

#[tokio::test]
async fn test_no_permit_leak() {
    let processor = MapProcessor::new(&[("A", "B C D"), ("C", "E")]).failing("B");
    let engine = build_engine(processor, 2, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 5);
    assert_eq!(engine.available_permits(), 2);
}

#[tokio::test]
async fn test_worker_panic_recorded() {
    let processor = MapProcessor::new(&[("A", "P B"), ("P", "C"), ("B", "")]).panicking("P");
    let engine = build_engine(processor, 2, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 3);
    assert!(report.get("C").is_none());
    let panicked = report.get("P").unwrap();
    assert_eq!(panicked.error().map(|e| e.kind()), Some("panicked"));
    assert_eq!(engine.available_permits(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_cap_never_exceeded() {
    let children: Vec<String> = (0..20).map(|i| format!("leaf-{}", i)).collect();
    let edges = vec![("root".to_string(), children)];
    let processor = processor_from(edges).with_delay(Duration::from_millis(20));
    let peak = Arc::clone(&processor.peak);
    let engine = build_engine(processor, 3, 1);

    let report = engine.run("root", &CancellationToken::new()).await;

    assert_eq!(report.row_count, 21);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak >= 1);
    assert!(peak <= 3, "observed {} concurrent items", peak);
    assert_eq!(engine.available_permits(), 3);

    assert!(report
        .results
        .iter()
        .filter(|r| r.item.depth == 1)
        .all(|r| r.item.discovered_from.as_deref() == Some("root")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancellation_mid_run() {
    let processor = processor_from(chain(1000)).with_delay(Duration::from_millis(10));
    let engine = build_engine(processor, 2, 10_000);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), engine.run("0", &cancel))
        .await
        .expect("cancelled traversal did not stop");

    assert!(report.cancelled);
    assert_eq!(report.final_state, EngineState::Done);
    assert!(report.row_count < 1000);
    assert_eq!(engine.available_permits(), 2);
    assert_eq!(engine.state(), EngineState::Done);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let processor = MapProcessor::new(&[("A", "B")]);
    let calls = Arc::clone(&processor.calls);
    let engine = build_engine(processor, 2, 5);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = engine.run("A", &cancel).await;

    assert!(report.cancelled);
    assert_eq!(report.row_count, 0);
    assert_eq!(report.abandoned, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shared_state_skips_claimed_identifiers() {
    let processor = MapProcessor::new(&[("A", "B C"), ("B", "D")]);
    let engine = build_engine(processor, 2, 5);

    let state = Arc::new(TraversalState::new());
    assert!(state.try_claim("B"));

    let report = engine
        .run_with_state("A", Arc::clone(&state), &CancellationToken::new())
        .await;

    // B was claimed elsewhere, so neither B nor what only B leads to is processed
    assert_eq!(report.row_count, 2);
    assert!(report.get("C").is_some());
    assert!(report.get("D").is_none());
}

#[tokio::test]
async fn test_csv_export_is_idempotent() {
    let processor = MapProcessor::new(&[("A", "B C"), ("B", "C")]).failing("C");
    let engine = build_engine(processor, 2, 5);

    let report = engine.run("A", &CancellationToken::new()).await;

    let mut first = Vec::new();
    let mut second = Vec::new();
    write_csv(&mut first, &report.results).unwrap();
    write_csv(&mut second, &report.results).unwrap();
    assert_eq!(first, second);

    let text = String::from_utf8(first).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Identifier,StatusCode,"));
    assert!(lines[1].starts_with("A,ok,"));
    assert!(lines.iter().any(|l| l.starts_with("C,transport_error,")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_runs_in_parallel() {
    let first = build_engine(processor_from(chain(10)), 2, 20);
    let second = build_engine(
        MapProcessor::new(&[("A", "B C"), ("C", "D")]),
        2,
        20,
    );

    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(first.run("0", &cancel), second.run("A", &cancel));

    assert_eq!(a.row_count, 10);
    assert_eq!(b.row_count, 4);
    assert_eq!(a.results[0].item.sequence_id, 1);
    assert_eq!(b.results[0].item.sequence_id, 1);
}

#[tokio::test]
async fn test_engine_reusable_across_runs() {
    let engine = build_engine(processor_from(chain(3)), 2, 5);
    let cancel = CancellationToken::new();

    let first = engine.run("0", &cancel).await;
    let second = engine.run("0", &cancel).await;

    assert_eq!(first.row_count, 3);
    assert_eq!(second.row_count, 3);
    assert_eq!(engine.state(), EngineState::Done);
}
