//! Page-Harvest: fetch, normalize, and persist web page content
//!
//! This crate fetches pages through pluggable upstream content-extraction
//! providers, normalizes every response into one [`ContentRecord`] shape,
//! upserts the page and its outbound links into SQLite, and feeds newly
//! discovered absolute URLs into a durable crawl queue.

pub mod backend;
pub mod cache;
pub mod config;
pub mod content;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("{backend} credentials not configured: {detail}")]
    MissingCredentials {
        backend: backend::BackendKind,
        detail: String,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{provider} API error: {message}")]
    UpstreamFailure {
        provider: &'static str,
        message: String,
    },

    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Invalid crawl state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crawler::CrawlState,
        to: crawler::CrawlState,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Page-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use backend::{Backend, BackendKind};
pub use config::Config;
pub use content::{ContentLink, ContentRecord, ErrorState};
pub use crawler::{CrawlOutcome, CrawlState, FetchAndSaveResponse, Registry};
pub use storage::{ContentStore, SaveResult, SqliteStorage};
