//! Statistics generation from the content database
//!
//! This module provides functionality for extracting and displaying
//! page, link, and crawl queue counts from the storage layer.

use crate::storage::{ContentStore, QueueStatus, StorageResult};
use serde::Serialize;

/// Content database statistics summary
#[derive(Debug, Clone, Serialize)]
pub struct HarvestStatistics {
    /// Total number of stored pages
    pub total_pages: u64,

    /// Total number of stored link rows
    pub total_links: u64,

    /// Crawl queue entries per status, in status order
    pub queue_by_status: Vec<(QueueStatus, u64)>,
}

impl HarvestStatistics {
    pub fn queued(&self, status: QueueStatus) -> u64 {
        self.queue_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total_queued(&self) -> u64 {
        self.queue_by_status.iter().map(|(_, count)| count).sum()
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn ContentStore) -> StorageResult<HarvestStatistics> {
    let total_pages = storage.count_pages()?;
    let total_links = storage.count_links()?;

    let queue_by_status = QueueStatus::ALL
        .into_iter()
        .map(|status| Ok((status, storage.count_queue_by_status(status)?)))
        .collect::<StorageResult<Vec<_>>>()?;

    Ok(HarvestStatistics {
        total_pages,
        total_links,
        queue_by_status,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Pages stored: {}", stats.total_pages);
    println!("  Links stored: {}", stats.total_links);
    println!();

    println!("Crawl Queue:");
    let total = stats.total_queued();
    for (status, count) in &stats.queue_by_status {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status.to_db_string(), count, percentage);
    }
    println!();

    let links_per_page = if stats.total_pages > 0 {
        stats.total_links as f64 / stats.total_pages as f64
    } else {
        0.0
    };
    println!("Average links per page: {:.1}", links_per_page);
}
