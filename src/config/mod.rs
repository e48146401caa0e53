//! Configuration module for Page-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Default backend: {}", config.crawler.default_backend);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserRenderingConfig, CacheConfig, Config, CrawlerConfig, LinkRetention, ReaderConfig,
    StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub(crate) use validation::MAX_CACHE_TTL_SECONDS;
