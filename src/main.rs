//! Page-Harvest main entry point
//!
//! This is the command-line interface for fetching pages through a content
//! backend and inspecting what has been stored.

use anyhow::Context;
use clap::{Parser, Subcommand};
use page_harvest::config::{load_config_with_hash, Config};
use page_harvest::output::{load_statistics, print_json, print_queue, print_statistics};
use page_harvest::storage::{open_storage, ContentStore};
use page_harvest::url::validate_target_url;
use page_harvest::{BackendKind, Registry};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Page-Harvest: fetch, normalize, and store web page content
///
/// Pages are fetched through an upstream content-extraction backend, stored
/// in SQLite together with their outbound links, and every new absolute link
/// is queued for a later crawl.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "Fetch and store web page content", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a page and save it to the database
    Fetch {
        /// Absolute http(s) URL to fetch
        url: String,

        /// Backend to use (jina or cfbrowser); defaults to the configured one
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Show the stored record for a URL
    Show {
        url: String,
    },

    /// List pending crawl queue entries
    Queue {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show statistics from the database
    Stats,

    /// Validate the configuration and print the resolved settings
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Fetch { url, backend } => handle_fetch(&config, &url, backend.as_deref()).await,
        Command::Show { url } => handle_show(&config, &url),
        Command::Queue { limit } => handle_queue(&config, limit),
        Command::Stats => handle_stats(&config),
        Command::Check => handle_check(&config, &config_hash),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles `fetch`: fetch-and-save, printing the response JSON
async fn handle_fetch(config: &Config, url: &str, backend: Option<&str>) -> anyhow::Result<()> {
    validate_target_url(url).with_context(|| format!("Refusing to fetch '{}'", url))?;

    let registry = Registry::open(config).context("Failed to open content store")?;
    let outcome = registry.fetch_and_save(url, backend).await;

    print_json(&outcome.to_response())?;
    if !outcome.is_success() {
        anyhow::bail!("Fetch of {} via {} ended in {}", url, outcome.backend(), outcome.state());
    }

    tracing::info!("Stored {} via {}", url, outcome.backend());
    Ok(())
}

/// Handles `show`: prints the stored record for a URL
fn handle_show(config: &Config, url: &str) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;

    match storage.get_by_url(url)? {
        Some(record) => Ok(print_json(&record)?),
        None => anyhow::bail!("No stored content for {}", url),
    }
}

/// Handles `queue`: lists pending crawl queue entries
fn handle_queue(config: &Config, limit: usize) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let entries = storage.pending_queue(limit)?;

    print_queue(&entries);
    Ok(())
}

/// Handles `stats`: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;

    print_statistics(&stats);
    Ok(())
}

/// Handles `check`: validates config and shows the resolved settings
fn handle_check(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let present = |value: &Option<String>| match value.as_deref() {
        Some(v) if !v.is_empty() => "set",
        _ => "missing",
    };

    println!("=== Page-Harvest Configuration ===\n");

    println!("Crawler:");
    println!("  Default backend: {}", config.crawler.default_backend);
    println!("  Link retention: {:?}", config.crawler.link_retention);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nBackends:");
    for kind in BackendKind::ALL {
        match kind {
            BackendKind::Reader => println!(
                "  {}: {} (api key {}, proxy {})",
                kind,
                config.reader.endpoint,
                present(&config.reader.api_key),
                config.reader.proxy_region
            ),
            BackendKind::BrowserRendering => println!(
                "  {}: {} (account id {}, api token {})",
                kind,
                config.browser_rendering.endpoint,
                present(&config.browser_rendering.account_id),
                present(&config.browser_rendering.api_token)
            ),
        }
    }

    println!("\nCache TTL: {}s", config.cache.ttl_seconds);
    println!("Config hash: {}", config_hash);

    println!("\n✓ Configuration is valid");
    Ok(())
}
