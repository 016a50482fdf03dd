//! Data model shared by discovery, enrichment and the JSON layout
//!
//! Field names serialize in camelCase and empty optional fields are omitted,
//! which keeps the output compatible with previously stored trees and listings.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A node of the category tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    /// Absolute, canonical URL; used as the dedup key among siblings
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<Category>,
}

impl Category {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            subcategories: Vec::new(),
        }
    }
}

/// Currencies recognised in price strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Domestic currency, assumed when no foreign symbol is present
    #[default]
    Rub,
    Usd,
    Eur,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rub => "RUB",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price as shown on the page
///
/// `value == 0.0` means unknown or unparsed; `text` always keeps the raw source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub currency: Currency,
    pub text: String,
}

impl Price {
    /// Returns true if a numeric value was recovered
    pub fn is_set(&self) -> bool {
        self.value != 0.0
    }
}

/// A single listing, first as a discovered summary, later enriched from its detail page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Site-assigned identifier; empty when it cannot be recovered
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub price: Price,
    pub url: String,
    #[serde(
        default,
        rename = "imageUrls",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl Listing {
    /// Creates a bare listing that only knows where it lives
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// A listing with neither a title nor a URL is not a usable entity
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() || !self.url.is_empty()
    }
}
