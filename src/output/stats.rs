//! Traversal statistics
//!
//! Aggregates latency and outcome figures either from an in-memory result
//! snapshot or from a run persisted in the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::traversal::{ProcessingResult, StatusCode};
use crate::SumiError;
use std::collections::BTreeMap;
use std::time::Duration;

/// Min / max / mean of a set of durations, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationSummary {
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
}

impl DurationSummary {
    fn from_durations(durations: impl Iterator<Item = Duration>) -> Self {
        let millis: Vec<u64> = durations.map(|d| d.as_millis() as u64).collect();
        if millis.is_empty() {
            return Self::default();
        }

        Self {
            min_ms: millis.iter().copied().min().unwrap_or(0),
            max_ms: millis.iter().copied().max().unwrap_or(0),
            mean_ms: millis.iter().sum::<u64>() as f64 / millis.len() as f64,
        }
    }
}

/// Statistics over one traversal's results
#[derive(Debug, Clone, Default)]
pub struct TraversalStatistics {
    /// Number of processed identifiers
    pub total: usize,

    /// Results with a success outcome
    pub succeeded: usize,

    /// Results with an error outcome
    pub failed: usize,

    /// Count per status column value (HTTP status or error kind)
    pub by_status: BTreeMap<String, usize>,

    /// Count per error kind, failures only
    pub by_error_kind: BTreeMap<&'static str, usize>,

    /// Count per depth
    pub by_depth: BTreeMap<u32, usize>,

    /// Processing time
    pub elapsed: DurationSummary,

    /// Time spent waiting for a concurrency permit
    pub gate_wait: DurationSummary,

    /// Sum of discovered identifiers over all results
    pub total_discovered: usize,
}

impl TraversalStatistics {
    /// Computes statistics over a result snapshot
    pub fn from_results<T: StatusCode>(results: &[ProcessingResult<T>]) -> Self {
        let mut stats = Self {
            total: results.len(),
            elapsed: DurationSummary::from_durations(results.iter().map(|r| r.elapsed)),
            gate_wait: DurationSummary::from_durations(results.iter().map(|r| r.gate_wait)),
            ..Self::default()
        };

        for result in results {
            match result.error() {
                None => stats.succeeded += 1,
                Some(error) => {
                    stats.failed += 1;
                    *stats.by_error_kind.entry(error.kind()).or_insert(0) += 1;
                }
            }
            *stats.by_status.entry(result.status_label()).or_insert(0) += 1;
            *stats.by_depth.entry(result.item.depth).or_insert(0) += 1;
            stats.total_discovered += result.discovered.len();
        }

        stats
    }

    /// Share of successful results, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64 * 100.0
        }
    }
}

/// Prints traversal statistics to stdout in a formatted manner
pub fn print_statistics(stats: &TraversalStatistics) {
    println!("=== Traversal Statistics ===\n");

    println!("Overview:");
    println!("  Identifiers processed: {}", stats.total);
    println!("  Identifiers discovered: {}", stats.total_discovered);
    println!();

    println!("Timing (ms):");
    println!(
        "  Processing: min {} / max {} / mean {:.1}",
        stats.elapsed.min_ms, stats.elapsed.max_ms, stats.elapsed.mean_ms
    );
    println!(
        "  Gate wait:  min {} / max {} / mean {:.1}",
        stats.gate_wait.min_ms, stats.gate_wait.max_ms, stats.gate_wait.mean_ms
    );
    println!();

    println!("Results by Status:");
    let mut status_counts: Vec<_> = stats.by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));
    for (status, count) in status_counts {
        let percentage = if stats.total > 0 {
            (*count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!("Results by Depth:");
    for (depth, count) in &stats.by_depth {
        println!("  {}: {}", depth, count);
    }
    println!();

    if !stats.by_error_kind.is_empty() {
        println!("Error Summary:");
        for (kind, count) in &stats.by_error_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} identifiers successfully processed)",
        stats.success_rate(),
        stats.succeeded,
        stats.total
    );
}

/// Statistics for a persisted run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub run: RunRecord,
    pub total_results: u64,
    pub failed_results: u64,
    pub total_links: u64,
    pub by_status: BTreeMap<String, u64>,
}

/// Loads statistics for the latest run from storage
///
/// # Returns
///
/// * `Ok(Some(RunStatistics))` - Statistics for the most recent run
/// * `Ok(None)` - The database holds no runs
/// * `Err(SumiError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<Option<RunStatistics>, SumiError> {
    let Some(run) = storage.get_latest_run()? else {
        return Ok(None);
    };

    Ok(Some(RunStatistics {
        total_results: storage.count_results(run.id)?,
        failed_results: storage.count_failed(run.id)?,
        total_links: storage.count_links(run.id)?,
        by_status: storage.count_by_status(run.id)?,
        run,
    }))
}

/// Prints persisted run statistics to stdout
pub fn print_run_statistics(stats: &RunStatistics) {
    println!("=== Run {} ===\n", stats.run.id);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Config hash: {}", stats.run.config_hash);
    println!();

    println!("  Results: {}", stats.total_results);
    println!("  Failed: {}", stats.failed_results);
    println!("  Links: {}", stats.total_links);
    println!();

    if !stats.by_status.is_empty() {
        println!("Results by Status:");
        for (status, count) in &stats.by_status {
            println!("  {}: {}", status, count);
        }
    }
}
