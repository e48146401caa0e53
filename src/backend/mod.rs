//! Content-fetch backends
//!
//! A backend calls one upstream content-extraction provider and normalizes
//! its response into a [`ContentRecord`]. The set of providers is closed:
//! [`BackendKind`] names them and [`Backend`] dispatches on them with an
//! exhaustive `match`. Persistence and lookup are shared by every backend and
//! go through the same content store.

mod browser;
mod reader;

pub use browser::BrowserRenderingClient;
pub use reader::ReaderClient;

use crate::config::{LinkRetention, UserAgentConfig};
use crate::content::ContentRecord;
use crate::storage::{ContentStore, SaveResult, SqliteStorage, StorageError};
use crate::HarvestError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Content store shared by every backend
pub type SharedStore = Arc<Mutex<SqliteStorage>>;

/// Identifies one of the supported upstream providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Jina reader API
    #[default]
    #[serde(rename = "jina")]
    Reader,
    /// Cloudflare Browser Rendering JSON API
    #[serde(rename = "cfbrowser")]
    BrowserRendering,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Reader, BackendKind::BrowserRendering];

    /// Name used in configuration, CLI flags, and responses
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reader => "jina",
            Self::BrowserRendering => "cfbrowser",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Human-facing provider label used in upstream error messages
    pub fn provider_label(&self) -> &'static str {
        match self {
            Self::Reader => "Jina",
            Self::BrowserRendering => "Cloudflare Browser",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Reader => 0,
            Self::BrowserRendering => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::BrowserRendering,
            _ => Self::Reader,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| HarvestError::UnknownBackend(s.to_string()))
    }
}

/// Upstream provider behind a backend
pub enum Provider {
    Reader(ReaderClient),
    BrowserRendering(BrowserRenderingClient),
}

/// One pluggable fetch/save/lookup implementation
pub struct Backend {
    provider: Provider,
    client: Client,
    store: SharedStore,
    link_retention: LinkRetention,
}

impl Backend {
    pub fn new(
        provider: Provider,
        client: Client,
        store: SharedStore,
        link_retention: LinkRetention,
    ) -> Self {
        Self {
            provider,
            client,
            store,
            link_retention,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match &self.provider {
            Provider::Reader(_) => BackendKind::Reader,
            Provider::BrowserRendering(_) => BackendKind::BrowserRendering,
        }
    }

    /// Fetches and normalizes the content of `url`
    ///
    /// Only missing credentials are returned as `Err`; every upstream failure
    /// comes back as a record carrying an error state.
    pub async fn fetch_content(&self, url: &str) -> Result<ContentRecord, HarvestError> {
        match &self.provider {
            Provider::Reader(reader) => reader.fetch(&self.client, url).await,
            Provider::BrowserRendering(browser) => browser.fetch(&self.client, url).await,
        }
    }

    /// Persists a fetched record through the shared store
    pub fn save_content(&self, record: &ContentRecord) -> SaveResult {
        match self.store.lock() {
            Ok(mut store) => store.save_content(record, self.link_retention),
            Err(_) => SaveResult::failure(format!("Database error: {}", StorageError::LockPoisoned)),
        }
    }

    /// Looks up stored content, mapping storage errors to `None`
    pub fn get_content_by_url(&self, url: &str) -> Option<ContentRecord> {
        let result = self
            .store
            .lock()
            .map_err(|_| StorageError::LockPoisoned)
            .and_then(|store| store.get_by_url(url));

        match result {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Error retrieving {} from database: {}", url, e);
                None
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::UserAgentConfig;
/// use page_harvest::backend::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageHarvest".to_string(),
///     crawler_version: "0.1.0".to_string(),
///     contact_url: "https://example.gov.ph/about".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renders an upstream HTTP status as `<code> <reason>`
pub(crate) fn status_text(status: reqwest::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
