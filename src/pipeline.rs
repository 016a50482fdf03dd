//! Pipeline entry points
//!
//! `Pipeline` wires one HTTP client and one fetch governor into the category
//! discoverer, the listing discoverer and the enricher, so every call made
//! through it shares the same request spacing. It is cheap to clone; clones
//! share the governor and can run concurrently.

use crate::config::{validate, Config};
use crate::crawler::{build_http_client, FetchGovernor, PageFetcher};
use crate::extract::{CategoryDiscoverer, ListingDiscoverer, ListingEnricher};
use crate::models::{Category, Listing};
use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Category discovery, listing discovery and enrichment behind one governor
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    governor: Arc<FetchGovernor>,
    categories: CategoryDiscoverer,
    listings: ListingDiscoverer,
    enricher: ListingEnricher,
}

impl Pipeline {
    /// Creates a pipeline from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to fetch
    /// * `Err(AvitologError)` - The configuration is invalid or the HTTP client could not be built
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let client = build_http_client(&config)?;
        let governor = Arc::new(FetchGovernor::new(client, &config));
        let fetcher = PageFetcher::new(Arc::clone(&governor), config.site.base_url.clone());
        let site = Arc::new(config.site.clone());

        let enricher = ListingEnricher::new(fetcher.clone(), Arc::clone(&site));
        let listings = ListingDiscoverer::new(fetcher.clone(), enricher.clone(), &config);
        let categories = CategoryDiscoverer::new(fetcher, site);

        Ok(Self {
            config: Arc::new(config),
            governor,
            categories,
            listings,
            enricher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of requests granted by the shared governor so far
    pub fn requests_made(&self) -> u64 {
        self.governor.requests_made()
    }

    /// Builds the category tree from the live site
    pub async fn discover_categories(&self, cancel: &CancellationToken) -> Result<Vec<Category>> {
        self.categories.discover(cancel).await
    }

    /// Builds the category tree, substituting the configured fallback tree
    /// when the site cannot be reached or yields no categories
    ///
    /// Cancellation is never replaced by the fallback. Without a configured
    /// fallback the discovery error is returned as is.
    pub async fn discover_categories_or_fallback(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Category>> {
        let fallback = &self.config.fallback;

        match self.categories.discover(cancel).await {
            Ok(categories) if categories.is_empty() && !fallback.is_empty() => {
                tracing::warn!(
                    "Live discovery found no categories, using {} fallback categories",
                    fallback.len()
                );
                Ok(fallback.clone())
            }
            Ok(categories) => Ok(categories),
            Err(e) if e.is_canceled() || fallback.is_empty() => Err(e),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Category discovery failed, using {} fallback categories",
                    fallback.len()
                );
                Ok(fallback.clone())
            }
        }
    }

    /// Discovers up to `limit` listings reachable from a category, search or
    /// catalog URL (`0` means unbounded)
    pub async fn discover_listings(
        &self,
        url: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        self.listings.discover(url, limit, cancel).await
    }

    /// Fills the empty fields of `listing` from its detail page
    pub async fn enrich_listing(
        &self,
        listing: Listing,
        cancel: &CancellationToken,
    ) -> Result<Listing> {
        self.enricher.enrich(listing, cancel).await
    }
}
