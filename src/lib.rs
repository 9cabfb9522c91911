//! Sumi-Frontier: a bounded-concurrency breadth-first traversal engine
//!
//! This crate implements a generic traversal engine that discovers work as it
//! goes, caps the number of simultaneously in-flight operations, and records
//! per-node latency and outcome telemetry. The web crawler in [`crawler`] is
//! one instantiation of the engine; any other bounded fan-out workload can
//! plug in through the [`traversal::Processor`] trait.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod traversal;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Frontier operations
///
/// Per-node failures never surface here; they are recorded as
/// [`traversal::ProcessError`] on the node's result instead.
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Root identifier {0} is outside the traversal scope")]
    RootOutOfScope(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Frontier operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use traversal::{
    EngineConfig, EngineState, ProcessError, Processed, ProcessingResult, Processor,
    TraversalEngine, TraversalReport, TraversalState, WorkItem,
};
pub use crate::url::{canonicalize, extract_domain, DomainScope};
