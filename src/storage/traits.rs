//! Storage traits and error types
//!
//! This module defines the trait interface for content stores and
//! associated error types.

use crate::config::LinkRetention;
use crate::content::{ContentLink, ContentRecord};
use crate::storage::{
    CrawlQueueEntry, EnqueueOutcome, EnqueueReport, LinkInsertReport, LinkRow, PageRow,
    PageWrite, QueueStatus, SaveResult,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Refusing to persist failed fetch of {url}: {message}")]
    ErrorRecord { url: String, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for content store implementations
///
/// The schema is backend-agnostic: every fetch backend persists through the
/// same store.
pub trait ContentStore {
    // ===== Pages =====

    /// Inserts or updates the page row for `record.url`
    ///
    /// On conflict every mutable column is overwritten; `id` and
    /// `created_at` keep their original values.
    ///
    /// # Returns
    ///
    /// The id of the row holding the URL, which is the existing row's id
    /// when the URL was stored before. An upstream id already taken by a
    /// different URL is swapped for a generated one.
    fn upsert_page(&mut self, record: &ContentRecord) -> StorageResult<String>;

    /// Writes the page row and its link set for one crawl as a single unit
    ///
    /// Either the page and the link bookkeeping for `retention` both land or
    /// neither does. Individual link rows that fail are still only counted
    /// in the returned report.
    fn write_page(
        &mut self,
        record: &ContentRecord,
        retention: LinkRetention,
    ) -> StorageResult<PageWrite>;

    /// Gets the most recently crawled page row for a URL
    fn get_page(&self, url: &str) -> StorageResult<Option<PageRow>>;

    /// Reconstructs a content record from the stored page and its links
    fn get_by_url(&self, url: &str) -> StorageResult<Option<ContentRecord>>;

    fn count_pages(&self) -> StorageResult<u64>;

    // ===== Links =====

    /// Inserts one row per link, positioned by index, into the page's
    /// current crawl
    ///
    /// A failed row is logged and counted; the remaining rows are still
    /// inserted.
    fn append_links(&mut self, page_id: &str, links: &[ContentLink]) -> LinkInsertReport;

    /// Gets all link rows of a page ordered by position
    fn get_links(&self, page_id: &str) -> StorageResult<Vec<LinkRow>>;

    fn count_links(&self) -> StorageResult<u64>;

    // ===== Crawl Queue =====

    /// Adds a URL to the crawl queue unless it is already present
    ///
    /// A duplicate URL is reported as [`EnqueueOutcome::AlreadyQueued`],
    /// never as an error.
    fn enqueue_if_absent(&mut self, url: &str) -> StorageResult<EnqueueOutcome>;

    /// Gets the queue entry for a URL
    fn get_queue_entry(&self, url: &str) -> StorageResult<Option<CrawlQueueEntry>>;

    /// Lists pending queue entries, oldest first
    fn pending_queue(&self, limit: usize) -> StorageResult<Vec<CrawlQueueEntry>>;

    fn count_queue_by_status(&self, status: QueueStatus) -> StorageResult<u64>;

    /// Queues every absolute http(s) link target
    ///
    /// Each URL is attempted on its own; nothing here fails the caller.
    fn enqueue_discovered_urls(&mut self, links: &[ContentLink]) -> EnqueueReport {
        let mut report = EnqueueReport::default();

        for link in links {
            if !link.is_queueable() {
                report.skipped += 1;
                continue;
            }

            match self.enqueue_if_absent(&link.link) {
                Ok(EnqueueOutcome::Inserted) => report.queued += 1,
                Ok(EnqueueOutcome::AlreadyQueued) => {
                    tracing::debug!("Skipped adding duplicate URL to crawl queue: {}", link.link);
                    report.duplicates += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to queue {}: {}", link.link, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    // ===== Save Pipeline =====

    /// Persists a fetched record: page upsert, link rows, then queue feed
    ///
    /// Records carrying an error are refused. A failed page write is rolled
    /// back and converted into a `Database error: ...` result rather than
    /// returned.
    fn save_content(&mut self, record: &ContentRecord, retention: LinkRetention) -> SaveResult {
        if let Some(message) = record.error_message() {
            let err = StorageError::ErrorRecord {
                url: record.url.clone(),
                message: message.to_string(),
            };
            tracing::warn!("{}", err);
            return SaveResult::failure(err.to_string());
        }

        let PageWrite { page_id, links } = match self.write_page(record, retention) {
            Ok(write) => write,
            Err(e) => {
                tracing::error!("Error saving {} to database: {}", record.url, e);
                return SaveResult::failure(format!("Database error: {}", e));
            }
        };

        let queue = self.enqueue_discovered_urls(&record.links_summary);

        tracing::info!(
            "Saved {} as page {} ({} links, {} link failures, {} newly queued, {} already queued)",
            record.url,
            page_id,
            links.inserted,
            links.failed,
            queue.queued,
            queue.duplicates
        );

        SaveResult::saved(page_id)
    }
}
