//! Listing discovery on category and search pages
//!
//! # Extraction Order
//!
//! 1. Inside the results container, try each item-card selector; the first
//!    one that produces a valid listing decides the set
//! 2. Otherwise scan the whole page for links to item pages
//! 3. Enrich every summary that has a URL, one at a time
//!
//! Catalog URLs are routed to [`super::catalog`] instead.

use super::enrich::ListingEnricher;
use super::patterns::{is_catalog_url, item_id};
use super::rules::{first_attr, first_text, link_containing, verbatim, AttrReader};
use crate::config::{Config, SiteConfig};
use crate::crawler::{Document, Node, PageFetcher};
use crate::models::Listing;
use crate::normalize::{normalize_url, parse_price};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const RESULTS_CONTAINER: &str = "div[data-marker='catalog-serp']";

/// Item cards, most specific first
const ITEM_CARDS: &[&str] = &[
    "div[data-marker='item']",
    "div[data-marker='item-card']",
    "div.iva-item-root",
    "div.styles-item-m0DD4",
    "div.js-item",
    "div.item",
    "div.item-card",
];

const CARD_TITLES: &[&str] = &[
    "h3[itemprop='name']",
    "*[data-marker='item-title']",
    "div.title",
    "h3.title",
    "a.title",
    "div.snippet-title",
];

/// Any heading-like descendant, used when no titled region exists
const CARD_HEADINGS: &[&str] = &["h3", "h2", "a.snippet-link"];

const CARD_PRICES: &[&str] = &[
    "*[data-marker='item-price']",
    "span.price-text-_YGDY",
    "span.price",
    "div.price",
    "span[itemprop='price']",
    "div.snippet-price",
];

const CARD_LOCATIONS: &[&str] = &[
    "div.geo-georeferences",
    "*[data-marker='item-address']",
    ".item-address",
    ".snippet-address",
];

const CARD_THUMBNAILS: &[AttrReader] = &[("src", verbatim), ("data-src", verbatim)];

/// Title regions inside a bare item link
const LINK_TITLES: &[&str] = &["h3", "h4", "h2", "div.title", "div.snippet-title"];

/// Price regions around a bare item link
const LINK_PRICES: &[&str] = &["span.price", "div.price", "*[data-marker='item-price']"];

/// Converts a result limit into a count; `0` means unbounded
pub(crate) fn capacity(limit: usize) -> usize {
    if limit == 0 {
        usize::MAX
    } else {
        limit
    }
}

/// Builds a summary from one item card
fn parse_card(card: Node<'_>, site: &SiteConfig) -> Listing {
    let href = link_containing(card, &site.item_path);
    let url = href
        .map(|href| normalize_url(href, site.origin()))
        .unwrap_or_default();

    let id = card
        .attr_non_empty("data-item-id")
        .map(str::to_string)
        .or_else(|| href.and_then(item_id))
        .unwrap_or_default();

    let title = first_text(card, CARD_TITLES)
        .or_else(|| first_text(card, CARD_HEADINGS))
        .or_else(|| item_link_text(card, site))
        .unwrap_or_default();

    let price = first_text(card, CARD_PRICES)
        .map(|text| parse_price(&text))
        .unwrap_or_default();

    let location = first_text(card, CARD_LOCATIONS).unwrap_or_default();

    let image_urls = card
        .first("img")
        .and_then(|img| first_attr(img, CARD_THUMBNAILS))
        .map(|src| vec![normalize_url(src, site.origin())])
        .unwrap_or_default();

    Listing {
        id,
        title,
        price,
        url,
        image_urls,
        location,
        ..Listing::default()
    }
}

/// Text of the first item link in `card` that has any
fn item_link_text(card: Node<'_>, site: &SiteConfig) -> Option<String> {
    card.select("a[href]")
        .into_iter()
        .filter(|a| {
            a.attr("href")
                .is_some_and(|href| href.contains(site.item_path.as_str()))
        })
        .map(|a| a.text())
        .find(|text| !text.is_empty())
}

/// Runs the item-card cascade under `scope`
fn extract_cards(scope: Node<'_>, site: &SiteConfig, limit: usize) -> Vec<Listing> {
    for selector in ITEM_CARDS {
        let listings: Vec<Listing> = scope
            .select(selector)
            .into_iter()
            .map(|card| parse_card(card, site))
            .filter(Listing::is_valid)
            .take(capacity(limit))
            .collect();

        if !listings.is_empty() {
            tracing::debug!("Found {} listings using selector: {}", listings.len(), selector);
            return listings;
        }
    }
    Vec::new()
}

/// Treats every titled link to an item page as a listing
///
/// Links are deduplicated by absolute URL; the price is looked up around the
/// link first, then inside it.
fn scan_item_links(scope: Node<'_>, site: &SiteConfig, limit: usize) -> Vec<Listing> {
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for anchor in scope.select("a[href]") {
        if listings.len() >= capacity(limit) {
            break;
        }

        let Some(href) = anchor.attr_non_empty("href") else {
            continue;
        };
        if !href.contains(site.item_path.as_str()) {
            continue;
        }

        let Some(title) = first_text(anchor, LINK_TITLES)
            .or_else(|| Some(anchor.text()).filter(|text| !text.is_empty()))
        else {
            continue;
        };

        let url = normalize_url(href, site.origin());
        if !seen.insert(url.clone()) {
            continue;
        }

        let price = anchor
            .parent()
            .and_then(|parent| first_text(parent, LINK_PRICES))
            .or_else(|| first_text(anchor, LINK_PRICES))
            .map(|text| parse_price(&text))
            .unwrap_or_default();

        listings.push(Listing {
            id: item_id(href).unwrap_or_default(),
            title,
            price,
            url,
            ..Listing::default()
        });
    }

    tracing::debug!("Found {} listings by scanning item links", listings.len());
    listings
}

/// Extracts listing summaries from a fetched category or search page
///
/// Every summary records `page_url` as its category.
pub fn extract_page_listings(
    document: &Document,
    site: &SiteConfig,
    page_url: &str,
    limit: usize,
) -> Vec<Listing> {
    let mut listings = match document.first(RESULTS_CONTAINER) {
        Some(container) => extract_cards(container, site, limit),
        None => {
            tracing::debug!("No results container on {}", page_url);
            Vec::new()
        }
    };

    if listings.is_empty() {
        listings = scan_item_links(document.root(), site, limit);
    }

    for listing in listings.iter_mut() {
        listing.category_url = page_url.to_string();
    }
    listings
}

/// Extracts listing summaries from a saved HTML page without any network access
///
/// The whole document is searched for item cards; if none match, links to item
/// pages are used instead. A page without listings yields an empty list.
pub fn extract_listings_from_html(html: &str, site: &SiteConfig) -> Vec<Listing> {
    let document = Document::parse(html);
    let listings = extract_cards(document.root(), site, 0);
    if !listings.is_empty() {
        return listings;
    }

    tracing::debug!("No item cards matched, falling back to item links");
    scan_item_links(document.root(), site, 0)
}

/// Discovers listings from category, search and catalog pages
#[derive(Debug, Clone)]
pub struct ListingDiscoverer {
    pub(crate) fetcher: PageFetcher,
    pub(crate) enricher: ListingEnricher,
    pub(crate) site: Arc<SiteConfig>,
    pub(crate) catalog_delay: Duration,
}

impl ListingDiscoverer {
    pub fn new(fetcher: PageFetcher, enricher: ListingEnricher, config: &Config) -> Self {
        Self {
            fetcher,
            enricher,
            site: Arc::new(config.site.clone()),
            catalog_delay: config.fetch.catalog_delay(),
        }
    }

    /// Discovers up to `limit` listings reachable from `url` (`0` means unbounded)
    ///
    /// Listings come back in discovery order, enriched where the detail page
    /// could be fetched.
    pub async fn discover(
        &self,
        url: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        if is_catalog_url(url, &self.site) {
            return self.discover_catalog(url, limit, cancel).await;
        }
        self.discover_standard(url, limit, cancel).await
    }

    /// Standard path: summaries from the page itself, then enrichment
    pub(crate) async fn discover_standard(
        &self,
        url: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        tracing::info!("Discovering listings on {}", url);
        let summaries = {
            let page = self.fetcher.fetch(url, cancel).await?;
            extract_page_listings(&page.document, &self.site, url, limit)
        };
        tracing::info!("Found {} listing summaries on {}", summaries.len(), url);

        self.enrich_all(summaries, cancel).await
    }

    /// Enriches summaries one at a time; a failed enrichment keeps the summary
    async fn enrich_all(
        &self,
        summaries: Vec<Listing>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        let total = summaries.len();
        let mut listings = Vec::with_capacity(total);

        for (i, summary) in summaries.into_iter().enumerate() {
            if summary.url.is_empty() {
                listings.push(summary);
                continue;
            }

            tracing::debug!("Fetching details for listing {} of {}", i + 1, total);
            match self.enricher.enrich(summary.clone(), cancel).await {
                Ok(enriched) => listings.push(enriched),
                Err(e) if e.is_canceled() => return Err(e),
                Err(e) => {
                    tracing::warn!(url = %summary.url, error = %e, "Keeping unenriched listing");
                    listings.push(summary);
                }
            }
        }

        Ok(listings)
    }
}
