//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ContentStore trait.

use crate::config::LinkRetention;
use crate::content::{ContentLink, ContentRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ContentStore, StorageResult};
use crate::storage::{
    content_hash, now_timestamp, CrawlQueueEntry, EnqueueOutcome, LinkInsertReport, LinkRow,
    PageRow, PageWrite, QueueStatus, PAGE_STATUS_COMPLETED,
};
use crate::HarvestError;
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use uuid::Uuid;

const PAGE_COLUMNS: &str = "id, url, title, raw_content, cleaned_content, summary, last_crawled, \
                            status, content_hash, created_at, updated_at";

const QUEUE_COLUMNS: &str = "id, url, priority, status, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and applies the schema
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Inserts or refreshes the page row for `record.url`, returning the stored id
///
/// A known URL keeps its id. An upstream id already held by another URL is
/// replaced with a fresh one rather than colliding on the primary key.
fn upsert_page_row(
    conn: &Connection,
    record: &ContentRecord,
    crawled_at: &str,
) -> rusqlite::Result<String> {
    let holder: Option<String> = conn
        .query_row(
            "SELECT url FROM pages WHERE id = ?1",
            params![record.id],
            |row| row.get(0),
        )
        .optional()?;

    let candidate_id = match holder {
        Some(url) if url != record.url => {
            let fresh = Uuid::new_v4().to_string();
            tracing::debug!(
                "Page id {} already belongs to {}, storing {} as {}",
                record.id,
                url,
                record.url,
                fresh
            );
            fresh
        }
        _ => record.id.clone(),
    };

    let hash = content_hash(&record.content);
    conn.query_row(
        "INSERT INTO pages (
            id, url, title, raw_content, cleaned_content, summary,
            last_crawled, status, content_hash, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(url) DO UPDATE SET
            title = excluded.title,
            raw_content = excluded.raw_content,
            cleaned_content = excluded.cleaned_content,
            summary = excluded.summary,
            last_crawled = excluded.last_crawled,
            status = excluded.status,
            content_hash = excluded.content_hash,
            updated_at = excluded.updated_at
         RETURNING id",
        params![
            candidate_id,
            record.url,
            record.title,
            record.content,
            record.content,
            "",
            crawled_at,
            PAGE_STATUS_COMPLETED,
            hash,
            crawled_at,
            crawled_at
        ],
        |row| row.get(0),
    )
}

/// Inserts `links` in order, stamping each row with `crawled_at`
///
/// Each row is its own statement, so one bad row is logged and counted
/// without losing the rest.
fn insert_link_rows(
    conn: &Connection,
    page_id: &str,
    links: &[ContentLink],
    crawled_at: &str,
) -> LinkInsertReport {
    let mut report = LinkInsertReport::default();

    for (position, link) in links.iter().enumerate() {
        let inserted = conn.execute(
            "INSERT INTO links (id, source_page_id, target_url, anchor_text, position_in_page, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                page_id,
                link.link,
                link.name,
                position as i64,
                crawled_at
            ],
        );

        match inserted {
            Ok(_) => report.inserted += 1,
            Err(e) => {
                tracing::warn!(
                    "Failed to insert link {} ({}) for page {}: {}",
                    position,
                    link.link,
                    page_id,
                    e
                );
                report.failed += 1;
            }
        }
    }

    report
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRow> {
    Ok(PageRow {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        raw_content: row.get(3)?,
        cleaned_content: row.get(4)?,
        summary: row.get(5)?,
        last_crawled: row.get(6)?,
        status: row.get(7)?,
        content_hash: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn queue_entry_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlQueueEntry> {
    Ok(CrawlQueueEntry {
        id: row.get(0)?,
        url: row.get(1)?,
        priority: row.get(2)?,
        status: QueueStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(QueueStatus::Pending),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn epoch_millis(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

impl ContentStore for SqliteStorage {
    // ===== Pages =====

    fn upsert_page(&mut self, record: &ContentRecord) -> StorageResult<String> {
        Ok(upsert_page_row(&self.conn, record, &now_timestamp())?)
    }

    fn write_page(
        &mut self,
        record: &ContentRecord,
        retention: LinkRetention,
    ) -> StorageResult<PageWrite> {
        let crawled_at = now_timestamp();
        let tx = self.conn.transaction()?;

        let page_id = upsert_page_row(&tx, record, &crawled_at)?;

        if retention == LinkRetention::Replace {
            let removed =
                tx.execute("DELETE FROM links WHERE source_page_id = ?1", params![page_id])?;
            tracing::debug!("Removed {} previous links for page {}", removed, page_id);
        }

        let links = insert_link_rows(&tx, &page_id, &record.links_summary, &crawled_at);
        tx.commit()?;

        Ok(PageWrite { page_id, links })
    }

    fn get_page(&self, url: &str) -> StorageResult<Option<PageRow>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE url = ?1 ORDER BY last_crawled DESC LIMIT 1",
                    PAGE_COLUMNS
                ),
                params![url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn get_by_url(&self, url: &str) -> StorageResult<Option<ContentRecord>> {
        let page = match self.get_page(url)? {
            Some(page) => page,
            None => return Ok(None),
        };

        // Only the set written by the latest crawl; older accumulated sets stay out
        let mut stmt = self.conn.prepare(
            "SELECT target_url, anchor_text FROM links
             WHERE source_page_id = ?1 AND created_at = ?2
             ORDER BY position_in_page ASC",
        )?;

        let links = stmt
            .query_map(params![page.id, page.last_crawled], |row| {
                Ok(ContentLink::new(row.get::<_, String>(1)?, row.get::<_, String>(0)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ContentRecord {
            timestamp: epoch_millis(&page.last_crawled),
            id: page.id,
            url: page.url,
            title: page.title,
            content: page.raw_content,
            links_summary: links,
            error: None,
        }))
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Links =====

    fn append_links(&mut self, page_id: &str, links: &[ContentLink]) -> LinkInsertReport {
        // Rows join the page's current crawl so get_by_url sees them
        let crawled_at = self
            .conn
            .query_row(
                "SELECT last_crawled FROM pages WHERE id = ?1",
                params![page_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .ok()
            .flatten()
            .unwrap_or_else(now_timestamp);

        insert_link_rows(&self.conn, page_id, links, &crawled_at)
    }

    fn get_links(&self, page_id: &str) -> StorageResult<Vec<LinkRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_page_id, target_url, anchor_text, position_in_page, created_at
             FROM links WHERE source_page_id = ?1
             ORDER BY created_at ASC, position_in_page ASC",
        )?;

        let links = stmt
            .query_map(params![page_id], |row| {
                Ok(LinkRow {
                    id: row.get(0)?,
                    source_page_id: row.get(1)?,
                    target_url: row.get(2)?,
                    anchor_text: row.get(3)?,
                    position_in_page: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Crawl Queue =====

    fn enqueue_if_absent(&mut self, url: &str) -> StorageResult<EnqueueOutcome> {
        let now = now_timestamp();
        let inserted = self.conn.execute(
            "INSERT INTO crawl_queue (id, url, priority, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(url) DO NOTHING",
            params![
                Uuid::new_v4().to_string(),
                url,
                0,
                QueueStatus::Pending.to_db_string(),
                now,
                now
            ],
        )?;

        Ok(if inserted == 0 {
            EnqueueOutcome::AlreadyQueued
        } else {
            EnqueueOutcome::Inserted
        })
    }

    fn get_queue_entry(&self, url: &str) -> StorageResult<Option<CrawlQueueEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawl_queue WHERE url = ?1", QUEUE_COLUMNS),
                params![url],
                queue_entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    fn pending_queue(&self, limit: usize) -> StorageResult<Vec<CrawlQueueEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_queue WHERE status = ?1
             ORDER BY priority ASC, created_at ASC LIMIT ?2",
            QUEUE_COLUMNS
        ))?;

        let entries = stmt
            .query_map(
                params![QueueStatus::Pending.to_db_string(), limit as i64],
                queue_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn count_queue_by_status(&self, status: QueueStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_queue WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Initializes or opens a database at the given path
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
