//! Avitolog main entry point
//!
//! This is the command-line interface for the Avitolog classified-ads harvester.
//! Results are printed to stdout as JSON; logs go to stderr.

use avitolog::config::{load_config_with_hash, Config};
use avitolog::{Listing, Pipeline};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Avitolog: a polite classified-ads harvester
///
/// Avitolog discovers the category tree of the site, extracts listings from
/// category and catalog pages, and enriches them from their detail pages,
/// spacing every request through one shared rate limiter.
#[derive(Parser, Debug)]
#[command(name = "avitolog")]
#[command(version)]
#[command(about = "A polite classified-ads harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover the category tree (falls back to the configured tree on failure)
    Categories,

    /// Discover listings from a category, search or catalog URL
    Listings {
        /// Page to start from
        url: String,

        /// Maximum number of listings (0 means no limit)
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
    },

    /// Fetch a single listing's detail page
    Enrich {
        /// Listing URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    let pipeline = Pipeline::new(config)?;
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let result = match cli.command {
        Command::Categories => handle_categories(&pipeline, &cancel).await,
        Command::Listings { url, limit } => handle_listings(&pipeline, &url, limit, &cancel).await,
        Command::Enrich { url } => handle_enrich(&pipeline, &url, &cancel).await,
    };

    tracing::info!("Requests made: {}", pipeline.requests_made());

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            Err(e)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("avitolog=info,warn"),
            1 => EnvFilter::new("avitolog=debug,info"),
            2 => EnvFilter::new("avitolog=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels `cancel` on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, canceling");
            cancel.cancel();
        }
    });
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Handles the `categories` command
async fn handle_categories(
    pipeline: &Pipeline,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let categories = pipeline.discover_categories_or_fallback(cancel).await?;
    let subcategories: usize = categories.iter().map(|c| c.subcategories.len()).sum();
    tracing::info!(
        "Discovered {} categories with {} subcategories",
        categories.len(),
        subcategories
    );
    print_json(&categories)
}

/// Handles the `listings` command
async fn handle_listings(
    pipeline: &Pipeline,
    url: &str,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let listings = pipeline.discover_listings(url, limit, cancel).await?;
    tracing::info!("Discovered {} listings", listings.len());
    print_json(&listings)
}

/// Handles the `enrich` command
async fn handle_enrich(
    pipeline: &Pipeline,
    url: &str,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let listing = pipeline
        .enrich_listing(Listing::from_url(url), cancel)
        .await?;
    print_json(&listing)
}
