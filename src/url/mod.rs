//! URL handling module for Sumi-Frontier
//!
//! This module provides identifier canonicalization, domain extraction,
//! wildcard matching, and the domain scope used to restrict a traversal.

mod domain;
mod matcher;
mod normalize;

use crate::config::Config;
use crate::UrlError;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_pattern;
pub use normalize::canonicalize;

/// The set of hosts a traversal is allowed to enter
///
/// A scope is a list of host patterns (see [`matches_pattern`]). Identifiers
/// whose host matches none of the patterns are dropped before they reach the
/// claim protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    patterns: Vec<String>,
}

impl DomainScope {
    /// Creates a scope from explicit host patterns
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Creates a scope covering only the host of `root`
    ///
    /// # Returns
    ///
    /// * `Ok(DomainScope)` - Scope with a single exact pattern
    /// * `Err(UrlError)` - The root has no host
    pub fn same_host(root: &str) -> Result<Self, UrlError> {
        let domain = extract_domain(root).ok_or(UrlError::MissingDomain)?;
        Ok(Self::new(vec![domain]))
    }

    /// Builds the scope described by a configuration
    ///
    /// Uses the `[[scope]]` entries when present, otherwise the root's host.
    pub fn from_config(config: &Config) -> Result<Self, UrlError> {
        if config.scope.is_empty() {
            Self::same_host(&config.crawler.root)
        } else {
            Ok(Self::new(
                config.scope.iter().map(|e| e.domain.clone()).collect(),
            ))
        }
    }

    /// Returns true if the identifier's host is inside this scope
    pub fn contains(&self, identifier: &str) -> bool {
        match extract_domain(identifier) {
            Some(host) => self.patterns.iter().any(|p| matches_pattern(p, &host)),
            None => false,
        }
    }

    /// The patterns making up this scope
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
