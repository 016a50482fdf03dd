//! URL classification for the target site
//!
//! The site's URL layout is what separates listing pages from navigation, so
//! the path fragments come from [`SiteConfig`] rather than being hard-coded.

use crate::config::SiteConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Numeric listing id at the end of a path: `…_<digits>` or `…/<digits>`
static ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)$|/(\d+)$").expect("valid regex"));

/// Extracts the site-assigned id from a listing URL or href
///
/// Query strings and fragments are ignored.
///
/// # Examples
///
/// ```
/// use avitolog::extract::item_id;
///
/// assert_eq!(item_id("/moskva/velosipedy/gornyy_2871634578?slocation=1").as_deref(), Some("2871634578"));
/// assert_eq!(item_id("/moskva/velosipedy"), None);
/// ```
pub fn item_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let captures = ITEM_ID.captures(path)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}

/// Returns true if `url` is a single listing's own page
pub fn is_item_url(url: &str, site: &SiteConfig) -> bool {
    url.contains(&site.item_path)
}

/// Returns true if `url` is an aggregated catalog view
pub fn is_catalog_url(url: &str, site: &SiteConfig) -> bool {
    url.contains(&site.catalog_path)
}

/// Returns true if `url` is an aggregate listing page worth expanding into subcategories
pub fn is_aggregate_url(url: &str, site: &SiteConfig) -> bool {
    url.contains(&site.aggregate_path)
}

/// Returns true if `url` leads to account or service pages rather than content
pub fn is_excluded(url: &str, site: &SiteConfig) -> bool {
    site.excluded_paths
        .iter()
        .any(|fragment| url.contains(fragment.as_str()))
}
