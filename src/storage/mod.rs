//! Storage module for persisting fetched content
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Page upserts keyed by URL
//! - Outbound link rows in extraction order
//! - Feeding the crawl queue with discovered URLs
//! - Reconstructing content records from stored rows

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{ContentStore, StorageError, StorageResult};

use crate::HarvestError;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;

/// Status written to every successfully stored page
pub const PAGE_STATUS_COMPLETED: &str = "completed";

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// Current time as a fixed-width RFC 3339 UTC string
///
/// Microsecond precision keeps lexical and chronological order identical.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Hex digest of a page body, stored for change detection
pub fn content_hash(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Represents a page in the database
#[derive(Debug, Clone, Serialize)]
pub struct PageRow {
    pub id: String,
    pub url: String,
    pub title: String,
    pub raw_content: String,
    pub cleaned_content: String,
    pub summary: String,
    pub last_crawled: String,
    pub status: String,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Represents an outbound link of a stored page
#[derive(Debug, Clone, Serialize)]
pub struct LinkRow {
    pub id: String,
    pub source_page_id: String,
    pub target_url: String,
    pub anchor_text: String,
    pub position_in_page: u32,
    pub created_at: String,
}

/// Represents a URL waiting in the crawl queue
#[derive(Debug, Clone, Serialize)]
pub struct CrawlQueueEntry {
    pub id: String,
    pub url: String,
    pub priority: i64,
    pub status: QueueStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Status of a crawl queue entry
///
/// This crate only ever writes `Pending`; the other states belong to
/// whatever drains the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 4] = [
        QueueStatus::Pending,
        QueueStatus::InProgress,
        QueueStatus::Completed,
        QueueStatus::Failed,
    ];

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Outcome of persisting a content record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SaveResult {
    pub fn saved(page_id: String) -> Self {
        Self {
            success: true,
            message: "Content saved to database".to_string(),
            id: Some(page_id),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
        }
    }
}

/// Per-row tally of a link insert pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkInsertReport {
    pub inserted: usize,
    pub failed: usize,
}

/// What one crawl's page write stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWrite {
    pub page_id: String,
    pub links: LinkInsertReport,
}

/// Result of a single conflict-ignoring queue insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Inserted,
    AlreadyQueued,
}

/// Tally of a queue feeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueReport {
    pub queued: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}
