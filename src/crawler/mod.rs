//! Crawler facade
//!
//! The [`Registry`] owns every backend, tracks the default one, and runs the
//! fetch-then-save pipeline. Each call walks the [`CrawlState`] machine and
//! ends in a [`CrawlOutcome`].

mod outcome;
mod registry;
mod state;

pub use outcome::{CrawlOutcome, FetchAndSaveResponse};
pub use registry::Registry;
pub use state::CrawlState;
