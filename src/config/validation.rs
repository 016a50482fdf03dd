//! Configuration validation

use crate::config::types::{Config, FetchConfig, SiteConfig, UserAgentConfig};
use crate::models::Category;
use crate::ConfigError;
use url::Url;

const MAX_RETRIES_CEILING: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_fallback(&config.fallback)?;
    Ok(())
}

/// Validates the target site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if base.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    for (key, value) in [
        ("item-path", &config.item_path),
        ("catalog-path", &config.catalog_path),
        ("aggregate-path", &config.aggregate_path),
    ] {
        validate_path_pattern(key, value)?;
    }

    for path in &config.excluded_paths {
        validate_path_pattern("excluded-paths", path)?;
    }

    Ok(())
}

fn validate_path_pattern(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
    }

    if !value.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{} must start with '/', got '{}'",
            key, value
        )));
    }

    Ok(())
}

/// Validates pacing and retry settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_retries > MAX_RETRIES_CEILING {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= {}, got {}",
            MAX_RETRIES_CEILING, config.max_retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates client identities
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.default.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent default cannot be empty".to_string(),
        ));
    }

    if config.rotation.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent rotation must contain at least one identity".to_string(),
        ));
    }

    if config.rotation.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agent rotation cannot contain empty identities".to_string(),
        ));
    }

    Ok(())
}

/// Validates the static fallback tree; every node needs an absolute URL
fn validate_fallback(categories: &[Category]) -> Result<(), ConfigError> {
    for category in categories {
        Url::parse(&category.url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid fallback category URL '{}': {}",
                category.url, e
            ))
        })?;

        validate_fallback(&category.subcategories)?;
    }

    Ok(())
}
