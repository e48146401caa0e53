//! Tagged results of the fetch-and-save orchestration

use crate::backend::BackendKind;
use crate::content::ContentRecord;
use crate::crawler::CrawlState;
use serde::Serialize;

/// Terminal outcome of one fetch-and-save call
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    /// Fetched and stored
    Saved {
        backend: BackendKind,
        data: ContentRecord,
        page_id: String,
    },

    /// The upstream call failed; nothing was saved
    FetchFailed { backend: BackendKind, error: String },

    /// Fetched but not stored; the fetched data is kept for the caller
    SaveFailed {
        backend: BackendKind,
        data: ContentRecord,
        error: String,
    },

    /// The call could not start, e.g. the backend has no credentials
    Aborted { backend: BackendKind, error: String },
}

impl CrawlOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn backend(&self) -> BackendKind {
        match self {
            Self::Saved { backend, .. }
            | Self::FetchFailed { backend, .. }
            | Self::SaveFailed { backend, .. }
            | Self::Aborted { backend, .. } => *backend,
        }
    }

    /// Terminal state this outcome corresponds to
    pub fn state(&self) -> CrawlState {
        match self {
            Self::Saved { .. } => CrawlState::Saved,
            Self::SaveFailed { .. } => CrawlState::SaveFailed,
            Self::FetchFailed { .. } | Self::Aborted { .. } => CrawlState::FetchFailed,
        }
    }

    pub fn data(&self) -> Option<&ContentRecord> {
        match self {
            Self::Saved { data, .. } | Self::SaveFailed { data, .. } => Some(data),
            Self::FetchFailed { .. } | Self::Aborted { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Saved { .. } => None,
            Self::FetchFailed { error, .. }
            | Self::SaveFailed { error, .. }
            | Self::Aborted { error, .. } => Some(error),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Saved { .. } => "Successfully fetched and saved content",
            Self::FetchFailed { .. } => "Failed to fetch content from crawler",
            Self::SaveFailed { .. } => "Fetched from crawler but failed to save to database",
            Self::Aborted { .. } => "Error in fetch and save operation",
        }
    }

    /// Caller-facing shape, ready to serialize
    pub fn to_response(&self) -> FetchAndSaveResponse {
        FetchAndSaveResponse {
            success: self.is_success(),
            data: self.data().cloned(),
            message: self.message().to_string(),
            error: self.error().map(str::to_string),
            id: match self {
                Self::Saved { page_id, .. } => Some(page_id.clone()),
                _ => None,
            },
            crawler: self.backend().name().to_string(),
        }
    }
}

/// Serialized result of a fetch-and-save call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchAndSaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ContentRecord>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub crawler: String,
}
