//! Sumi-Frontier main entry point
//!
//! This is the command-line interface for the Sumi-Frontier crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_frontier::config::{load_config_with_hash, Config};
use sumi_frontier::crawler::build_crawler;
use sumi_frontier::output::{
    export_csv, load_statistics, print_run_statistics, print_statistics, record_run,
    TraversalStatistics,
};
use sumi_frontier::storage::{open_storage, Storage};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Frontier: a bounded-concurrency site crawler
///
/// Sumi-Frontier walks a website breadth-first from a root URL, keeps at
/// most a fixed number of requests in flight, and records the status,
/// latency, and outgoing links of every page it visits.
#[derive(Parser, Debug)]
#[command(name = "sumi-frontier")]
#[command(version = "1.0.0")]
#[command(about = "A bounded-concurrency site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the latest run from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Write the CSV export here instead of the configured path
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        let csv_path = cli
            .csv
            .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));
        handle_crawl(&config, &config_hash, &csv_path).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_frontier=info,warn"),
            1 => EnvFilter::new("sumi_frontier=debug,info"),
            2 => EnvFilter::new("sumi_frontier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Frontier Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root: {}", config.crawler.root);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    match &config.output.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Database: (disabled)"),
    }

    println!("\nScope ({}):", config.scope.len());
    if config.scope.is_empty() {
        println!("  - host of the root URL only");
    }
    for entry in &config.scope {
        println!("  - {}", entry.domain);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the latest stored run
fn handle_stats(config: &Config) -> Result<()> {
    let Some(database_path) = &config.output.database_path else {
        anyhow::bail!("No database-path configured; nothing to report");
    };

    println!("Database: {}\n", database_path);
    let storage = open_storage(Path::new(database_path))
        .with_context(|| format!("Failed to open database {}", database_path))?;

    match load_statistics(&storage)? {
        Some(stats) => print_run_statistics(&stats),
        None => println!("No runs recorded yet"),
    }

    Ok(())
}

/// Handles the main crawl operation
///
/// The crawler is built before a run is opened, and a run that has been
/// opened is always closed, so a failed start never leaves a `running` row.
async fn handle_crawl(config: &Config, config_hash: &str, csv_path: &Path) -> Result<()> {
    let (crawler, root) = build_crawler(config).context("Failed to set up the crawler")?;

    let mut storage = match &config.output.database_path {
        Some(path) => {
            let mut storage = open_storage(Path::new(path))
                .with_context(|| format!("Failed to open database {}", path))?;
            let run_id = storage.create_run(config_hash)?;
            tracing::info!("Recording as run {} in {}", run_id, path);
            Some((storage, run_id))
        }
        None => None,
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            signal_token.cancel();
        }
    });

    tracing::info!("Starting crawl at {}", root);
    let report = crawler.run(&root, &cancel).await;

    tracing::info!(
        "Crawl {} after {:.1}s: {} pages, {} failed, {} abandoned",
        if report.cancelled { "interrupted" } else { "completed" },
        report.elapsed.as_secs_f64(),
        report.row_count,
        report.failed(),
        report.abandoned
    );

    // Close the run before anything else can fail
    if let Some((storage, run_id)) = storage.as_mut() {
        record_run(storage, *run_id, &report)
            .with_context(|| format!("Failed to store run {}", run_id))?;
    }

    export_csv(csv_path, &report.results)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    println!("✓ Results exported to: {}", csv_path.display());

    print_statistics(&TraversalStatistics::from_results(&report.results));

    Ok(())
}
