use url::Url;

/// Extracts the domain from a URL string
///
/// The host is lowercased and a leading `www.` is dropped, so that
/// `https://www.Example.com/` and `https://example.com/` report the same domain.
///
/// # Arguments
///
/// * `url` - The absolute URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL does not parse or has no host
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::extract_domain;
///
/// assert_eq!(extract_domain("https://example.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("https://WWW.EXAMPLE.COM/"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("https://sub.example.com/"), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    match host.strip_prefix("www.") {
        Some(stripped) if !stripped.is_empty() => Some(stripped.to_string()),
        _ => Some(host),
    }
}
