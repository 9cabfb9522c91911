use crate::UrlError;
use url::Url;

/// Canonicalizes a URL into the identifier used as the traversal's uniqueness key
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http:// and https://; require a host
/// 3. Lowercase scheme, host and path
/// 4. Drop the default port, the query string and the fragment
/// 5. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (the root path becomes empty)
///
/// Two inputs that canonicalize to the same string are the same node.
///
/// # Arguments
///
/// * `url_str` - The absolute URL string to canonicalize
///
/// # Returns
///
/// * `Ok(String)` - Canonical identifier
/// * `Err(UrlError)` - Failed to parse the URL or unsupported scheme
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::canonicalize;
///
/// let id = canonicalize("HTTPS://Example.COM/Docs/?page=2#intro").unwrap();
/// assert_eq!(id, "https://example.com/docs");
/// ```
pub fn canonicalize(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if host.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    // Url::port() is None when the port equals the scheme default
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = normalize_path(url.path());

    Ok(format!("{}://{}{}", url.scheme(), authority, path).to_lowercase())
}

/// Normalizes a URL path by removing dot segments and trailing slashes
///
/// The returned path is either empty (root) or starts with a single `/`.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return String::new();
    }

    format!("/{}", segments.join("/"))
}
