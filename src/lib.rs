//! Avitolog: a polite classified-ads harvester
//!
//! This crate discovers the category taxonomy of a classified-ads site and
//! extracts structured listings (title, price, location, images, attributes)
//! from the pages reachable through it. Every fetch goes through one shared
//! governor that spaces requests, retries rate-limited responses and rotates
//! the client identity.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod state;

use std::fmt;
use thiserror::Error;

/// Main error type for Avitolog operations
#[derive(Debug, Error)]
pub enum AvitologError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for {url}: {cause}")]
    Fetch { url: String, cause: FetchCause },

    #[error("Rate limit retries exhausted for {url} after {attempts} attempts")]
    RateLimitExceeded { url: String, attempts: u32 },

    #[error("Refusing to fetch off-site URL {url}")]
    OffSite { url: String },

    #[error("Listing has no URL to enrich")]
    MissingUrl,

    #[error("Operation canceled")]
    Canceled,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AvitologError {
    /// Returns true if the error came from a cancellation request
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Why a single fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// The server answered with a non-2xx, non-429 status
    Status(u16),
    /// Connection, TLS, timeout or body read failure
    Transport(String),
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Transport(message) => write!(f, "{}", message),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Avitolog operations
pub type Result<T> = std::result::Result<T, AvitologError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use models::{Category, Currency, Listing, Price};
pub use normalize::{clean_text, normalize_url, parse_date, parse_price};
pub use pipeline::Pipeline;
