//! Jina reader backend
//!
//! Issues `GET {endpoint}/{encoded target}` and expects a flat JSON document
//! with `id`, `title`, `content`, and `links_summary` (or `links`). The reader
//! may also wrap that document in a `{code, status, data}` envelope.

use crate::backend::{status_text, BackendKind};
use crate::config::ReaderConfig;
use crate::content::{links_from_value, ContentRecord};
use crate::HarvestError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const KIND: BackendKind = BackendKind::Reader;

/// Client for the link-summary oriented reader API
#[derive(Debug, Clone)]
pub struct ReaderClient {
    endpoint: String,
    api_key: Option<String>,
    proxy_region: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReaderPayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    links_summary: Value,
    #[serde(default)]
    links: Value,
}

#[derive(Debug, Deserialize)]
struct ReaderEnvelope {
    #[serde(default)]
    data: Option<ReaderPayload>,
    #[serde(flatten)]
    payload: ReaderPayload,
}

impl ReaderClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, proxy_region: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            proxy_region: proxy_region.into(),
        }
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.proxy_region.clone(),
        )
    }

    /// Fetches `url` through the reader API
    ///
    /// Returns `Err` only when no API key is configured.
    pub async fn fetch(&self, client: &Client, url: &str) -> Result<ContentRecord, HarvestError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| HarvestError::MissingCredentials {
                backend: KIND,
                detail: "Jina API key not found (set reader.api-key or JINA_API_KEY)".to_string(),
            })?;

        tracing::info!("Fetching from Jina API for URL: {}", url);

        match self.request(client, api_key, url).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!("Error fetching {} from Jina API: {}", url, e);
                Ok(ContentRecord::failure(url, e.to_string()))
            }
        }
    }

    fn request_url(&self, url: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(url)
        )
    }

    async fn request(
        &self,
        client: &Client,
        api_key: &str,
        url: &str,
    ) -> Result<ContentRecord, HarvestError> {
        let http_err = |source| HarvestError::Http {
            url: url.to_string(),
            source,
        };

        let response = client
            .get(self.request_url(url))
            .bearer_auth(api_key)
            .header("X-Retain-Images", "none")
            .header("X-Proxy", &self.proxy_region)
            .header("X-With-Links-Summary", "true")
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::UpstreamFailure {
                provider: KIND.provider_label(),
                message: status_text(status),
            });
        }

        let envelope: ReaderEnvelope = response.json().await.map_err(http_err)?;
        tracing::debug!("Jina response decoded for {}", url);

        Ok(normalize(url, envelope))
    }
}

fn normalize(url: &str, envelope: ReaderEnvelope) -> ContentRecord {
    let payload = envelope.data.unwrap_or(envelope.payload);

    let links = if payload.links_summary.is_null() {
        links_from_value(&payload.links)
    } else {
        links_from_value(&payload.links_summary)
    };

    ContentRecord::success(payload.id, url, payload.title, payload.content, links)
}
