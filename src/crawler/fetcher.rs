//! Page fetcher
//!
//! This module turns one governed HTTP GET into a parsed [`Document`]:
//! - Building the shared HTTP client with the configured identity and timeouts
//! - Routing every request through the [`FetchGovernor`]
//! - Refusing URLs outside the target site and its subdomains
//! - Parsing the body best-effort, so callers only ever see a document or an error

use super::document::Document;
use super::governor::FetchGovernor;
use crate::config::Config;
use crate::normalize::is_same_site;
use crate::{AvitologError, Result};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// A fetched and parsed page
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Parsed document
    pub document: Document,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The full configuration; identity and timeouts are read from it
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use avitolog::config::Config;
/// use avitolog::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.default.clone())
        .timeout(Duration::from_secs(config.fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(config.fetch.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages through the shared governor and parses them
#[derive(Debug, Clone)]
pub struct PageFetcher {
    governor: Arc<FetchGovernor>,
    base_url: String,
}

impl PageFetcher {
    pub fn new(governor: Arc<FetchGovernor>, base_url: impl Into<String>) -> Self {
        Self {
            governor,
            base_url: base_url.into(),
        }
    }

    /// Returns the governor all fetches go through
    pub fn governor(&self) -> &Arc<FetchGovernor> {
        &self.governor
    }

    /// Fetches `url` and parses the body into a document
    ///
    /// The returned page owns a non-`Send` document; extract what you need
    /// and drop it before awaiting anything else.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedPage> {
        if !is_same_site(url, &self.base_url) {
            return Err(AvitologError::OffSite {
                url: url.to_string(),
            });
        }

        let response = self.governor.perform_with_retry(url, cancel).await?;
        tracing::debug!(
            "Fetched {} ({} bytes, HTTP {})",
            response.url,
            response.body.len(),
            response.status
        );

        Ok(FetchedPage {
            document: Document::parse(&response.body),
            url: response.url,
            status: response.status,
        })
    }
}
