//! The scrape engine
//!
//! A scrape fans out one unit per (job, role, region), runs every unit
//! concurrently under two shared concurrency limits, and merges the
//! per-unit outputs once all units have finished.

pub mod assembler;
pub mod discovery;
pub mod fetch;
pub mod limits;
pub mod orchestrator;
pub mod static_job;

pub use limits::ScrapeLimits;
pub use orchestrator::Scraper;

use cloudwatch_scrape_common::{ResourceRecord, ScrapeRecord};
use serde::Serialize;

/// Resources and records produced by one unit, or by a whole scrape
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScrapeResult {
    pub resources: Vec<ResourceRecord>,
    pub records: Vec<ScrapeRecord>,
}

impl ScrapeResult {
    pub fn merge(&mut self, other: ScrapeResult) {
        self.resources.extend(other.resources);
        self.records.extend(other.records);
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.records.is_empty()
    }
}
