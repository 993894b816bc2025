//! Shared concurrency limits for backend calls

use cloudwatch_scrape_common::ScrapeSettings;
use std::sync::Arc;
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

/// Two process-wide permit pools shared by every unit of a scrape.
///
/// The discovery pool bounds tag enumeration and catalog listing calls, the
/// cloudwatch pool bounds single-metric fetches. Permits are released when
/// dropped, so a failing call can't leak one.
#[derive(Debug, Clone)]
pub struct ScrapeLimits {
    discovery: Arc<Semaphore>,
    cloudwatch: Arc<Semaphore>,
}

impl ScrapeLimits {
    pub fn new(discovery: usize, cloudwatch: usize) -> Self {
        Self {
            discovery: Arc::new(Semaphore::new(discovery)),
            cloudwatch: Arc::new(Semaphore::new(cloudwatch)),
        }
    }

    pub fn from_settings(settings: &ScrapeSettings) -> Self {
        Self::new(
            settings.discovery_concurrency,
            settings.cloudwatch_concurrency,
        )
    }

    pub async fn discovery_permit(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.discovery.acquire().await
    }

    pub async fn cloudwatch_permit(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.cloudwatch.acquire().await
    }

    pub fn available_discovery(&self) -> usize {
        self.discovery.available_permits()
    }

    pub fn available_cloudwatch(&self) -> usize {
        self.cloudwatch.available_permits()
    }
}

impl Default for ScrapeLimits {
    fn default() -> Self {
        Self::from_settings(&ScrapeSettings::default())
    }
}
