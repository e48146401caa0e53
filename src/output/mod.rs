//! Output module for command-line reports
//!
//! This module handles:
//! - Printing stored records and fetch results as JSON
//! - Listing pending crawl queue entries
//! - Recording database statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::storage::CrawlQueueEntry;
use crate::HarvestError;
use serde::Serialize;

/// Prints any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<(), HarvestError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints pending crawl queue entries, oldest first
pub fn print_queue(entries: &[CrawlQueueEntry]) {
    println!("=== Pending Crawl Queue ({}) ===\n", entries.len());
    for entry in entries {
        println!(
            "  [{}] {} (priority {}, queued {})",
            entry.status.to_db_string(),
            entry.url,
            entry.priority,
            entry.created_at
        );
    }
}
