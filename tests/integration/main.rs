//! Integration tests for the pipeline
//!
//! These tests use wiremock to serve fixture pages and drive category
//! discovery, listing discovery, enrichment and fetch governance end-to-end.

mod common;
mod governor_tests;
mod listings_tests;
