//! Extraction pipeline
//!
//! Turns fetched pages into categories and listings:
//! - `categories`: root regions merged by URL, then subcategory expansion
//! - `listings`: item-card cascade, page-wide link scan, sequential enrichment
//! - `catalog`: candidate URL collection and bounded probing of catalog pages
//! - `enrich`: gap-filling from a listing's detail page
//!
//! The pure `extract_*` functions work on an already parsed [`crate::crawler::Document`]
//! and never touch the network.

mod catalog;
mod categories;
mod enrich;
mod listings;
mod patterns;
mod rules;

pub use catalog::collect_catalog_urls;
pub use categories::{
    extract_root_categories, extract_subcategories, CategoryDiscoverer, CategoryLink,
    CategoryMerge,
};
pub use enrich::{apply_detail_page, ListingEnricher};
pub use listings::{extract_listings_from_html, extract_page_listings, ListingDiscoverer};
pub use patterns::{is_aggregate_url, is_catalog_url, is_excluded, is_item_url, item_id};
pub use rules::Rule;
