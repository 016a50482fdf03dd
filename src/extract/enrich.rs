//! Listing enrichment from the detail page
//!
//! Enrichment only fills gaps: a field the summary already carries is never
//! replaced, images are appended, and attribute keys already present keep
//! their value.

use super::patterns::item_id;
use super::rules::{first_attr, first_srcset_entry, first_text, verbatim, AttrReader};
use crate::config::SiteConfig;
use crate::crawler::{Document, PageFetcher};
use crate::models::Listing;
use crate::normalize::{normalize_url, parse_date, parse_price};
use crate::{AvitologError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const TITLES: &[&str] = &["h1"];

const DESCRIPTIONS: &[&str] = &["div[data-marker='item-description']", "div.item-description"];

const GALLERY_IMAGES: &str = "div.gallery-img-wrapper img, div.photo-slider-image-wrapper img";

const IMAGE_SOURCES: &[AttrReader] = &[
    ("src", verbatim),
    ("srcset", first_srcset_entry),
    ("data-src", verbatim),
];

const ADDRESSES: &[&str] = &["div[data-marker='item-address']", "div.item-address"];

const PRICES: &[&str] = &[
    "span.price-value",
    "div.item-price",
    "*[data-marker='item-price']",
];

const DATES: &[&str] = &["div[data-marker='item-date']", "div.item-date"];

/// Parameter entries, each read as `key: value`
const ATTRIBUTE_ENTRIES: &str = "ul.item-params-list li, div.item-params li, div.item-params";

/// Fills the gaps of `listing` from its parsed detail page
///
/// Missing regions leave the corresponding field untouched.
pub fn apply_detail_page(listing: &mut Listing, document: &Document, site: &SiteConfig) {
    let root = document.root();

    if listing.id.is_empty() {
        if let Some(id) = item_id(&listing.url) {
            listing.id = id;
        }
    }

    if listing.title.is_empty() {
        if let Some(title) = first_text(root, TITLES) {
            listing.title = title;
        }
    }

    if listing.description.is_empty() {
        if let Some(description) = first_text(root, DESCRIPTIONS) {
            listing.description = description;
        }
    }

    let mut known: HashSet<String> = listing.image_urls.iter().cloned().collect();
    for image in document.select(GALLERY_IMAGES) {
        let Some(src) = first_attr(image, IMAGE_SOURCES) else {
            continue;
        };
        let url = normalize_url(src, site.origin());
        if known.insert(url.clone()) {
            listing.image_urls.push(url);
        }
    }

    if listing.location.is_empty() {
        if let Some(location) = first_text(root, ADDRESSES) {
            listing.location = location;
        }
    }

    if !listing.price.is_set() {
        if let Some(price) = first_text(root, PRICES) {
            listing.price = parse_price(&price);
        }
    }

    if listing.published_at.is_none() {
        if let Some(date) = first_text(root, DATES) {
            listing.published_at = Some(parse_date(&date));
        }
    }

    for entry in document.select(ATTRIBUTE_ENTRIES) {
        if let Some((key, value)) = split_attribute(&entry.text()) {
            listing.attributes.entry(key).or_insert(value);
        }
    }
}

/// Splits `"key: value"`; anything that is not exactly two colon-separated parts is skipped
fn split_attribute(text: &str) -> Option<(String, String)> {
    let mut parts = text.split(':');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();
    if parts.next().is_some() || key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Visits listing detail pages and fills in what summaries lack
#[derive(Debug, Clone)]
pub struct ListingEnricher {
    fetcher: PageFetcher,
    site: Arc<SiteConfig>,
}

impl ListingEnricher {
    pub fn new(fetcher: PageFetcher, site: Arc<SiteConfig>) -> Self {
        Self { fetcher, site }
    }

    /// Fetches the listing's own page and fills its empty fields
    ///
    /// Returns `MissingUrl` without touching the network when the listing has no URL.
    pub async fn enrich(&self, listing: Listing, cancel: &CancellationToken) -> Result<Listing> {
        if listing.url.is_empty() {
            return Err(AvitologError::MissingUrl);
        }

        let mut listing = listing;
        let page = self.fetcher.fetch(&listing.url, cancel).await?;
        apply_detail_page(&mut listing, &page.document, &self.site);

        tracing::debug!(
            "Enriched listing {} ({} images, {} attributes)",
            listing.url,
            listing.image_urls.len(),
            listing.attributes.len()
        );
        Ok(listing)
    }
}
