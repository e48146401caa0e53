//! Crawl state definitions for a single fetch-and-save call
//!
//! ```text
//! Fetching -> FetchFailed
//!          -> Fetched -> Saving -> SaveFailed
//!                               -> Saved
//! ```

use crate::HarvestError;
use std::fmt;

/// Represents where one fetch-and-save call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// The backend is calling its upstream provider
    Fetching,

    /// A usable record came back and is about to be saved
    Fetched,

    /// The record is being written to the content store
    Saving,

    // ===== Terminal States =====
    /// The upstream call failed or could not be made
    FetchFailed,

    /// The record was fetched but could not be stored
    SaveFailed,

    /// The record was fetched and stored
    Saved,
}

impl CrawlState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::SaveFailed | Self::Saved)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Fetching, Self::Fetched)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetched, Self::Saving)
                | (Self::Saving, Self::SaveFailed)
                | (Self::Saving, Self::Saved)
        )
    }

    /// Moves to `next`, rejecting transitions the machine does not allow
    pub fn transition(self, next: CrawlState) -> Result<CrawlState, HarvestError> {
        if self.can_transition_to(next) {
            tracing::trace!("Crawl state {} -> {}", self, next);
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Saving => "saving",
            Self::FetchFailed => "fetch_failed",
            Self::SaveFailed => "save_failed",
            Self::Saved => "saved",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
