//! Catalog pages
//!
//! A catalog page aggregates items and nested catalogs with markup of its
//! own. Candidate URLs are collected first; item URLs are then enriched
//! directly and everything else is probed with a one-listing standard
//! discovery, which bounds the fan-out to one fetch chain per URL.

use super::listings::{capacity, ListingDiscoverer};
use super::patterns::{is_excluded, is_item_url, item_id};
use super::rules::link_containing;
use crate::config::SiteConfig;
use crate::crawler::{Document, Node};
use crate::models::Listing;
use crate::normalize::{is_same_site, normalize_url};
use crate::Result;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

const CATALOG_CONTAINERS: &str = "div.items-items, div.catalog-items";

/// Items inside a catalog container, most specific first
const CATALOG_ITEMS: &[&str] = &[
    "div[data-item-id]",
    "div.item-wrapper",
    "div.catalog-item",
    "div.item",
];

/// Model tiles that link to nested catalogs or items
const CATALOG_CARDS: &str = "div.catalog-card, div.catalog-list-item, div.item-panel";

/// Deduplicated, capped list of absolute URLs in discovery order
#[derive(Debug)]
struct UrlSet {
    urls: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl UrlSet {
    fn new(limit: usize) -> Self {
        Self {
            urls: Vec::new(),
            seen: HashSet::new(),
            cap: capacity(limit),
        }
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.cap
    }

    fn push(&mut self, url: String) {
        if !self.is_full() && self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }

    fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    fn len(&self) -> usize {
        self.urls.len()
    }
}

/// The item link of a catalog entry, else its first link
fn entry_href<'a>(entry: Node<'a>, site: &SiteConfig) -> Option<&'a str> {
    link_containing(entry, &site.item_path).or_else(|| {
        entry
            .first("a[href]")
            .and_then(|anchor| anchor.attr_non_empty("href"))
    })
}

/// Collects the URLs a catalog page points at, capped at `limit` (`0` means unbounded)
///
/// # Collection Order
///
/// 1. Item entries inside catalog containers (first matching selector per container)
/// 2. Catalog cards
/// 3. If still empty: every link to an item page
/// 4. If still empty: every same-site link that is not an account/service page
///    and not the catalog itself
pub fn collect_catalog_urls(
    document: &Document,
    site: &SiteConfig,
    catalog_url: &str,
    limit: usize,
) -> Vec<String> {
    let mut urls = UrlSet::new(limit);

    for container in document.select(CATALOG_CONTAINERS) {
        for selector in CATALOG_ITEMS {
            let before = urls.len();
            for entry in container.select(selector) {
                if let Some(href) = entry_href(entry, site) {
                    urls.push(normalize_url(href, site.origin()));
                }
            }
            if urls.len() > before {
                tracing::debug!("Found {} item URLs using selector: {}", urls.len() - before, selector);
                break;
            }
        }
    }

    for card in document.select(CATALOG_CARDS) {
        if let Some(href) = card.first("a[href]").and_then(|a| a.attr_non_empty("href")) {
            urls.push(normalize_url(href, site.origin()));
        }
    }

    if urls.is_empty() {
        tracing::debug!("Using fallback link scan for catalog page {}", catalog_url);
        let anchors = document.select("a[href]");

        for href in anchors.iter().filter_map(|a| a.attr_non_empty("href")) {
            if href.contains(site.item_path.as_str()) {
                urls.push(normalize_url(href, site.origin()));
            }
        }

        if urls.is_empty() {
            for href in anchors.iter().filter_map(|a| a.attr_non_empty("href")) {
                if is_excluded(href, site) {
                    continue;
                }
                let url = normalize_url(href, site.origin());
                if url == catalog_url || !is_same_site(&url, site.origin()) {
                    continue;
                }
                tracing::trace!("Found potential subcategory or item: {}", url);
                urls.push(url);
            }
        }
    }

    urls.urls
}

impl ListingDiscoverer {
    /// Catalog path: collect candidate URLs, then enrich items and probe the rest
    pub(crate) async fn discover_catalog(
        &self,
        catalog_url: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        tracing::info!("Handling catalog page {}", catalog_url);
        let urls = {
            let page = self.fetcher.fetch(catalog_url, cancel).await?;
            collect_catalog_urls(&page.document, &self.site, catalog_url, limit)
        };
        tracing::info!("Processing {} URLs from catalog {}", urls.len(), catalog_url);

        let cap = capacity(limit);
        let mut listings = Vec::new();

        for (i, url) in urls.iter().enumerate() {
            if listings.len() >= cap {
                break;
            }
            if i > 0 {
                self.fetcher
                    .governor()
                    .pause(self.catalog_delay, cancel)
                    .await?;
            }

            tracing::debug!("Processing catalog URL {} of {}: {}", i + 1, urls.len(), url);

            if is_item_url(url, &self.site) {
                let summary = Listing {
                    id: item_id(url).unwrap_or_default(),
                    category_url: catalog_url.to_string(),
                    ..Listing::from_url(url.as_str())
                };

                match self.enricher.enrich(summary.clone(), cancel).await {
                    Ok(listing) => listings.push(listing),
                    Err(e) if e.is_canceled() => return Err(e),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Failed to fetch catalog item");
                        if !summary.id.is_empty() {
                            listings.push(summary);
                        }
                    }
                }
            } else {
                match self.discover_standard(url, 1, cancel).await {
                    Ok(found) => {
                        if !found.is_empty() {
                            tracing::debug!("Found {} listings under {}", found.len(), url);
                        }
                        let room = cap - listings.len();
                        listings.extend(found.into_iter().take(room));
                    }
                    Err(e) if e.is_canceled() => return Err(e),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Skipping catalog entry");
                    }
                }
            }
        }

        Ok(listings)
    }
}
