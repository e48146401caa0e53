//! Normalized content records
//!
//! Every backend funnels its upstream response into a [`ContentRecord`], so the
//! store and the registry never special-case a provider.

mod link;

pub use link::{links_from_value, ContentLink};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title used when the upstream provider returns none
pub const NO_TITLE: &str = "No title";

/// Title placed on records that carry an error
pub const ERROR_TITLE: &str = "Error";

/// Failure marker carried by a record that must not be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    pub kind: String,
    pub message: String,
}

impl ErrorState {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Result of fetching a URL through any backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub links_summary: Vec<ContentLink>,
    /// Capture time in epoch milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorState>,
}

impl ContentRecord {
    /// Builds a successful record, filling the provider-independent defaults
    pub fn success(
        id: Option<String>,
        url: &str,
        title: Option<String>,
        content: Option<String>,
        links: Vec<ContentLink>,
    ) -> Self {
        Self {
            id: id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            url: url.to_string(),
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_TITLE.to_string()),
            content: content.unwrap_or_default(),
            links_summary: links,
            timestamp: Utc::now().timestamp_millis(),
            error: None,
        }
    }

    /// Builds a failure record with filler title and body
    pub fn failure(url: &str, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            title: ERROR_TITLE.to_string(),
            content: String::new(),
            links_summary: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
            error: Some(ErrorState::new(message)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Links whose target is an absolute http(s) URL
    pub fn queueable_links(&self) -> impl Iterator<Item = &ContentLink> {
        self.links_summary.iter().filter(|l| l.is_queueable())
    }
}
