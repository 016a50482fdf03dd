//! Link normalization and same-site checks

use url::Url;

/// Turns an `href` found on a page into an absolute URL
///
/// # Normalization Steps
///
/// 1. An `href` that already carries a scheme is returned unchanged
/// 2. Protocol-relative (`//host/...`) gets `https:` prepended
/// 3. Root-relative (`/path`) is joined to the site origin
/// 4. Anything else is joined to the site origin with a `/` separator
///
/// The result is never empty for non-empty input, and normalizing an
/// already-normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use avitolog::normalize_url;
///
/// let base = "https://www.avito.ru";
/// assert_eq!(normalize_url("/moskva/avtomobili", base), "https://www.avito.ru/moskva/avtomobili");
/// assert_eq!(normalize_url("//img.avito.st/1.jpg", base), "https://img.avito.st/1.jpg");
/// assert_eq!(normalize_url("https://example.com/x", base), "https://example.com/x");
/// ```
pub fn normalize_url(href: &str, base_url: &str) -> String {
    if href.is_empty() {
        return String::new();
    }

    let origin = base_url.trim_end_matches('/');
    let href = href.trim();

    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }

    if href.starts_with('/') {
        return format!("{}{}", origin, href);
    }

    // Url::parse only accepts absolute URLs, so success means a scheme is present
    match Url::parse(href) {
        Ok(_) => href.to_string(),
        Err(_) => format!("{}/{}", origin, href),
    }
}

/// Returns true if `url` points at the same site as `base_url` (or one of its subdomains)
pub fn is_same_site(url: &str, base_url: &str) -> bool {
    let (Ok(candidate), Ok(base)) = (Url::parse(url), Url::parse(base_url)) else {
        return false;
    };

    let (Some(host), Some(base_host)) = (candidate.host_str(), base.host_str()) else {
        return false;
    };

    let root = base_host.strip_prefix("www.").unwrap_or(base_host);
    let host = host.to_lowercase();
    host == root || host.ends_with(&format!(".{}", root))
}
