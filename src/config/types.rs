//! Configuration types
//!
//! Every section and field has a default, so an empty file is a valid config.

use crate::models::Category;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ROTATION_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// Main configuration structure for Avitolog
///
/// Every section has defaults, so an empty TOML file yields a usable config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    /// Static category tree used when live discovery cannot reach the site
    pub fallback: Vec<Category>,
}

/// Target site layout: origin and the URL fragments that classify pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Site origin used to absolutize relative links (e.g. "https://www.avito.ru")
    pub base_url: String,

    /// Path segment identifying a single listing's own page
    pub item_path: String,

    /// Path segment identifying aggregated/filtered catalog pages
    pub catalog_path: String,

    /// Path segment identifying aggregate listing pages worth expanding into subcategories
    pub aggregate_path: String,

    /// Path fragments that never lead to content (favorites, profile, auth, ...)
    pub excluded_paths: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.avito.ru".to_string(),
            item_path: "/item/".to_string(),
            catalog_path: "/catalog/".to_string(),
            aggregate_path: "/all/".to_string(),
            excluded_paths: ["/favorites", "/profile", "/auth", "/support", "/stat"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl SiteConfig {
    /// Returns the base URL without a trailing slash
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Minimum time between two requests across the whole process (milliseconds)
    pub min_interval_ms: u64,

    /// Upper bound of the random delay added on top of the interval (milliseconds)
    pub jitter_ms: u64,

    /// Total request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Re-attempts after an HTTP 429
    pub max_retries: u32,

    /// Backoff unit; the n-th retry waits `backoff_base_ms * n`
    pub backoff_base_ms: u64,

    /// Pause after the first 429 before the retry sequence starts (milliseconds)
    pub rate_limit_pause_ms: u64,

    /// Extra delay between successive URLs of a catalog page (milliseconds)
    pub catalog_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 3000,
            jitter_ms: 2000,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 5000,
            rate_limit_pause_ms: 10_000,
            catalog_delay_ms: 3000,
        }
    }
}

impl FetchConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_millis(self.rate_limit_pause_ms)
    }

    pub fn catalog_delay(&self) -> Duration {
        Duration::from_millis(self.catalog_delay_ms)
    }
}

/// Client identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Identity sent with every first attempt
    pub default: String,

    /// Identities cycled through on rate-limit retries
    pub rotation: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_USER_AGENT.to_string(),
            rotation: ROTATION_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

impl UserAgentConfig {
    /// Picks the identity for a retry attempt, cycling by attempt number
    pub fn for_attempt(&self, attempt: u32) -> &str {
        if self.rotation.is_empty() {
            return &self.default;
        }
        &self.rotation[attempt as usize % self.rotation.len()]
    }
}
