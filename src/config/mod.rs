//! Configuration module for Avitolog
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use avitolog::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("avitolog.toml")).unwrap();
//! println!("Minimum request interval: {}ms", config.fetch.min_interval_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
