use crate::backend::BackendKind;
use serde::Deserialize;

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(rename = "browser-rendering", default)]
    pub browser_rendering: BrowserRenderingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Backend used when a request names none (or an unknown one)
    #[serde(rename = "default-backend", default)]
    pub default_backend: BackendKind,

    /// What happens to a page's existing link rows when it is crawled again
    #[serde(rename = "link-retention", default)]
    pub link_retention: LinkRetention,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_backend: BackendKind::Reader,
            link_retention: LinkRetention::Replace,
        }
    }
}

/// Policy for link rows of a page that is crawled more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRetention {
    /// Delete the page's previous link rows before inserting the new set
    #[default]
    Replace,
    /// Keep every set of link rows ever extracted for the page
    Accumulate,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Jina reader backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    #[serde(default = "default_reader_endpoint")]
    pub endpoint: String,

    /// Bearer key; falls back to `JINA_API_KEY` when absent
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// Value of the `X-Proxy` header
    #[serde(rename = "proxy-region", default = "default_proxy_region")]
    pub proxy_region: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_reader_endpoint(),
            api_key: None,
            proxy_region: default_proxy_region(),
        }
    }
}

/// Cloudflare browser rendering backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserRenderingConfig {
    #[serde(default = "default_browser_endpoint")]
    pub endpoint: String,

    /// Falls back to `CF_ACCOUNT_ID` when absent
    #[serde(rename = "account-id", default)]
    pub account_id: Option<String>,

    /// Falls back to `CF_API_TOKEN` when absent
    #[serde(rename = "api-token", default)]
    pub api_token: Option<String>,

    /// Extraction prompt sent with every request
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for BrowserRenderingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_browser_endpoint(),
            account_id: None,
            api_token: None,
            prompt: default_prompt(),
        }
    }
}

/// Cache-backed fetch helper configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "ttl-seconds", default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

fn default_reader_endpoint() -> String {
    "https://r.jina.ai".to_string()
}

fn default_proxy_region() -> String {
    "ph".to_string()
}

fn default_browser_endpoint() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

pub(crate) fn default_prompt() -> String {
    "Extract the main content of this page. Also get me the list of links from the page. \
     Make the friendly_name to be end-user non-technical friendly."
        .to_string()
}

fn default_ttl_seconds() -> u64 {
    3600
}
