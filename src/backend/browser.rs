//! Cloudflare browser rendering backend
//!
//! Posts the target URL with an extraction prompt and a JSON schema to the
//! `browser-rendering/json` endpoint, then unwraps `result.{title, content,
//! links}`. The provider reports its own failures through `success: false`.

use crate::backend::{status_text, BackendKind};
use crate::config::BrowserRenderingConfig;
use crate::content::{links_from_value, ContentRecord};
use crate::HarvestError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const KIND: BackendKind = BackendKind::BrowserRendering;

/// Client for the prompt-driven structured extraction API
#[derive(Debug, Clone)]
pub struct BrowserRenderingClient {
    endpoint: String,
    account_id: Option<String>,
    api_token: Option<String>,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct RenderingResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    result: Option<RenderingResult>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderingResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    links: Value,
}

impl BrowserRenderingClient {
    pub fn new(
        endpoint: impl Into<String>,
        account_id: Option<String>,
        api_token: Option<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            account_id,
            api_token,
            prompt: prompt.into(),
        }
    }

    pub fn from_config(config: &BrowserRenderingConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.account_id.clone(),
            config.api_token.clone(),
            config.prompt.clone(),
        )
    }

    /// Fetches `url` through the browser rendering API
    ///
    /// Returns `Err` only when the account id or API token is missing.
    pub async fn fetch(&self, client: &Client, url: &str) -> Result<ContentRecord, HarvestError> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        let (account_id, api_token) = match (non_empty(&self.account_id), non_empty(&self.api_token)) {
            (Some(account_id), Some(api_token)) => (account_id, api_token),
            _ => {
                return Err(HarvestError::MissingCredentials {
                    backend: KIND,
                    detail: "Cloudflare account ID or API token not found \
                             (set browser-rendering.account-id/api-token or CF_ACCOUNT_ID/CF_API_TOKEN)"
                        .to_string(),
                })
            }
        };

        tracing::info!("Fetching content from Cloudflare Browser API for URL: {}", url);

        match self.request(client, &account_id, &api_token, url).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::error!("Error fetching {} from Cloudflare Browser API: {}", url, e);
                Ok(ContentRecord::failure(url, e.to_string()))
            }
        }
    }

    fn request_url(&self, account_id: &str) -> String {
        format!(
            "{}/accounts/{}/browser-rendering/json",
            self.endpoint.trim_end_matches('/'),
            account_id
        )
    }

    fn request_body(&self, url: &str) -> Value {
        json!({
            "url": url,
            "prompt": self.prompt,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "links": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string" },
                                    "friendly_name": {
                                        "type": "string",
                                        "description": "End-user non-technical friendly name for the link. Always include the entity it belongs to. Example: \"Department of Finance Latest News\""
                                    },
                                    "link": {
                                        "type": "string",
                                        "description": "The URL of the link. Always include the full URL."
                                    }
                                },
                                "required": ["name"]
                            }
                        }
                    },
                    "required": ["title", "content"]
                }
            }
        })
    }

    async fn request(
        &self,
        client: &Client,
        account_id: &str,
        api_token: &str,
        url: &str,
    ) -> Result<ContentRecord, HarvestError> {
        let http_err = |source| HarvestError::Http {
            url: url.to_string(),
            source,
        };

        let response = client
            .post(self.request_url(account_id))
            .bearer_auth(api_token)
            .json(&self.request_body(url))
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

        let body: RenderingResponse = response.json().await.map_err(http_err)?;
        normalize(url, body)
    }
}

fn normalize(url: &str, body: RenderingResponse) -> Result<ContentRecord, HarvestError> {
    if !body.success {
        let message = body
            .errors
            .iter()
            .map(error_text)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(HarvestError::UpstreamFailure {
            provider: KIND.provider_label(),
            message,
        });
    }

    let result = body.result.unwrap_or_default();
    Ok(ContentRecord::success(
        None,
        url,
        result.title,
        result.content,
        links_from_value(&result.links),
    ))
}

/// Upstream errors arrive either as strings or as `{code, message}` objects
fn error_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}
