//! Crawler module for governed page fetching
//!
//! This module contains the network side of the pipeline, including:
//! - Request spacing, jitter and rate-limit retries (`FetchGovernor`)
//! - HTTP client construction and page fetching (`PageFetcher`)
//! - The parsed document abstraction extraction code queries (`Document`)

mod document;
mod fetcher;
mod governor;

pub use document::{Document, Node};
pub use fetcher::{build_http_client, FetchedPage, PageFetcher};
pub use governor::{FetchGovernor, RawResponse};
