//! Page processor: the crawler's unit of work

use crate::crawler::fetcher::{FetchedContent, Fetcher};
use crate::crawler::parser::LinkExtractor;
use crate::traversal::{ProcessError, Processed, Processor, StatusCode, WorkItem};
use crate::url::canonicalize;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Decides whether a canonical identifier may be traversed
pub type ScopePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// What a successfully fetched page records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    /// HTTP status code
    pub status_code: u16,

    /// Body size in bytes
    pub content_length: usize,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page title, for HTML pages that have one
    pub title: Option<String>,
}

impl StatusCode for PageOutcome {
    fn status_code(&self) -> Option<u16> {
        Some(self.status_code)
    }
}

/// Fetches a page, extracts its links and keeps the canonical in-scope ones
pub struct PageProcessor<F, E> {
    fetcher: F,
    extractor: E,
    scope: ScopePredicate,
}

impl<F, E> PageProcessor<F, E>
where
    F: Fetcher,
    E: LinkExtractor,
{
    pub fn new(fetcher: F, extractor: E, scope: ScopePredicate) -> Self {
        Self {
            fetcher,
            extractor,
            scope,
        }
    }

    /// Canonicalizes, scope-filters and de-duplicates raw links
    ///
    /// Discovery order is kept. The page's own identifier is dropped.
    fn filter_links(&self, source: &str, links: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        links
            .into_iter()
            .filter_map(|link| match canonicalize(&link) {
                Ok(canonical) => Some(canonical),
                Err(e) => {
                    tracing::trace!("Skipping link {}: {}", link, e);
                    None
                }
            })
            .filter(|canonical| canonical != source && (self.scope)(canonical))
            .filter(|canonical| seen.insert(canonical.clone()))
            .collect()
    }

    fn extract(&self, item: &WorkItem, fetched: &FetchedContent) -> Processed<PageOutcome> {
        let mut outcome = PageOutcome {
            status_code: fetched.status_code,
            content_length: fetched.body.len(),
            content_type: fetched.content_type.clone(),
            title: None,
        };

        if !fetched.is_html() {
            tracing::debug!(
                "Not following links in {} ({})",
                item.identifier,
                fetched.content_type.as_deref().unwrap_or("unknown")
            );
            return Processed::success(outcome, Vec::new());
        }

        // Relative links resolve against where the request ended up
        let base_url = match Url::parse(&fetched.final_url).or_else(|_| Url::parse(&item.identifier))
        {
            Ok(url) => url,
            Err(e) => {
                return Processed::failure(ProcessError::MalformedContent {
                    message: format!("no base URL for {}: {}", item.identifier, e),
                })
            }
        };

        match self.extractor.extract(&base_url, &fetched.body) {
            Ok(parsed) => {
                outcome.title = parsed.title;
                let discovered = self.filter_links(&item.identifier, parsed.links);
                Processed::success(outcome, discovered)
            }
            Err(e) => Processed::failure(ProcessError::MalformedContent {
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl<F, E> Processor for PageProcessor<F, E>
where
    F: Fetcher + 'static,
    E: LinkExtractor + 'static,
{
    type Output = PageOutcome;

    async fn process(&self, item: &WorkItem, cancel: &CancellationToken) -> Processed<PageOutcome> {
        let fetched = match self.fetcher.fetch(&item.identifier, cancel).await {
            Ok(fetched) => fetched,
            Err(e) => return Processed::failure(e.into()),
        };

        if !fetched.is_success() {
            return Processed::failure(ProcessError::Protocol {
                status_code: fetched.status_code,
            });
        }

        self.extract(item, &fetched)
    }
}
