//! Crawler module: the web-page instantiation of the traversal engine
//!
//! This module contains the crawling adapters, including:
//! - HTTP fetching with transport error classification
//! - HTML parsing and link extraction
//! - The page processor that ties both to the domain scope

mod fetcher;
mod parser;
mod processor;

pub use fetcher::{build_http_client, FetchError, FetchedContent, Fetcher, HttpFetcher};
pub use parser::{parse_html, ExtractError, HtmlLinkExtractor, LinkExtractor, ParsedPage};
pub use processor::{PageOutcome, PageProcessor, ScopePredicate};

use crate::config::Config;
use crate::traversal::{EngineConfig, TraversalEngine, TraversalReport};
use crate::url::{canonicalize, DomainScope};
use crate::SumiError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The engine configured for crawling over HTTP
pub type Crawler = TraversalEngine<PageProcessor<HttpFetcher, HtmlLinkExtractor>>;

/// Builds a crawler from configuration
///
/// # Returns
///
/// * `Ok((Crawler, String))` - The engine and the canonical root to start from
/// * `Err(SumiError)` - Invalid root, root outside the scope, or HTTP client failure
pub fn build_crawler(config: &Config) -> Result<(Crawler, String), SumiError> {
    let root = canonicalize(&config.crawler.root)?;
    let scope = DomainScope::from_config(config)?;

    if !scope.contains(&root) {
        return Err(SumiError::RootOutOfScope(root));
    }

    tracing::debug!("Traversal scope: {:?}", scope.patterns());

    let fetcher = HttpFetcher::from_config(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )?;
    let predicate: ScopePredicate = Arc::new(move |identifier: &str| scope.contains(identifier));
    let processor = PageProcessor::new(fetcher, HtmlLinkExtractor, predicate);

    let engine = TraversalEngine::new(
        processor,
        EngineConfig {
            max_concurrency: config.crawler.max_concurrency as usize,
            max_depth: config.crawler.max_depth,
        },
    );

    Ok((engine, root))
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Canonicalize the root and build the domain scope
/// 2. Build the HTTP client
/// 3. Traverse until nothing new is discovered or `cancel` fires
///
/// Per-page failures are recorded in the report, never returned here.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Stops new dispatches and aborts in-flight fetches
///
/// # Returns
///
/// * `Ok(TraversalReport)` - Crawl finished (possibly cancelled)
/// * `Err(SumiError)` - Crawl could not start
pub async fn run_crawl(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<TraversalReport<PageOutcome>, SumiError> {
    let (crawler, root) = build_crawler(config)?;
    Ok(crawler.run(&root, cancel).await)
}
