/// Checks if a host matches a scope pattern
///
/// Both sides are compared case-insensitively and with any leading `www.`
/// removed. Two kinds of pattern are supported:
/// 1. Exact: `example.com` matches only `example.com` (and `www.example.com`)
/// 2. Wildcard: `*.example.com` matches `example.com` and every subdomain of it
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::matches_pattern;
///
/// assert!(matches_pattern("example.com", "WWW.example.com"));
/// assert!(!matches_pattern("example.com", "blog.example.com"));
/// assert!(matches_pattern("*.example.com", "api.v2.example.com"));
/// assert!(!matches_pattern("*.example.com", "myexample.com"));
/// ```
pub fn matches_pattern(pattern: &str, host: &str) -> bool {
    let host = bare_host(host);
    if host.is_empty() {
        return false;
    }

    match pattern.strip_prefix("*.") {
        Some(base) => {
            let base = bare_host(base);
            !base.is_empty()
                && (host == base
                    || (host.len() > base.len()
                        && host.ends_with(&base)
                        && host.as_bytes()[host.len() - base.len() - 1] == b'.'))
        }
        None => host == bare_host(pattern),
    }
}

fn bare_host(host: &str) -> String {
    let lowered = host.trim().to_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}
