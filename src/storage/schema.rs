//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Page-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled URL
CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    raw_content TEXT NOT NULL,
    cleaned_content TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    last_crawled TEXT NOT NULL,
    status TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_last_crawled ON pages(last_crawled);

-- Outbound links in extraction order
CREATE TABLE IF NOT EXISTS links (
    id TEXT PRIMARY KEY,
    source_page_id TEXT NOT NULL REFERENCES pages(id),
    target_url TEXT NOT NULL,
    anchor_text TEXT NOT NULL,
    position_in_page INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_source ON links(source_page_id);

-- URLs discovered for a future crawl pass
CREATE TABLE IF NOT EXISTS crawl_queue (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    priority INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_queue_status ON crawl_queue(status);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
