use serde::Deserialize;

/// Main configuration structure for Sumi-Frontier
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub scope: Vec<ScopeEntry>,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root identifier the traversal starts from
    pub root: String,

    /// Maximum depth to traverse from the root (root is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of simultaneously in-flight fetches
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV export
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path to the SQLite database file; persistence is skipped when absent
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

/// Host pattern the traversal may enter
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,
}
