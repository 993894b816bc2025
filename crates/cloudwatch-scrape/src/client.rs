//! Contracts for the external clients the engine calls.
//!
//! The engine never constructs AWS clients itself: a [`ClientFactory`]
//! hands out ready clients per (region, role), and the three operation
//! traits are the only calls that suspend a scrape unit.

use crate::error::{ClientError, DiscoveryError};
use chrono::{DateTime, Duration, Utc};
use cloudwatch_scrape_common::{
    Datapoint, Dimension, DiscoveryJob, MetricCatalogEntry, MetricConfig, MetricDataResult,
    ResourceRecord, RoleArn, ScrapeRecord,
};
use std::future::Future;

/// Time window of a metric query, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub length: u32,
    pub delay: u32,
}

impl FetchWindow {
    /// Window shared by all batched queries of a discovery job
    pub fn for_job(job: &DiscoveryJob) -> Self {
        Self {
            length: job.window_length(),
            delay: job.window_delay(),
        }
    }

    /// Window of a single-metric query
    pub fn for_metric(metric: &MetricConfig) -> Self {
        Self {
            length: metric.length(),
            delay: metric.delay(),
        }
    }

    /// Start and end of the window: `end = now - delay`, `start = end - length`
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = now - Duration::seconds(i64::from(self.delay));
        let start = end - Duration::seconds(i64::from(self.length));
        (start, end)
    }
}

/// Tagged resource enumeration
pub trait TaggingOperations: Send + Sync {
    /// List resources of the job's service in `region`, with their tags.
    ///
    /// On failure the error carries whatever was listed before it.
    fn list_tagged_resources(
        &self,
        job: &DiscoveryJob,
        region: &str,
    ) -> impl Future<Output = Result<Vec<ResourceRecord>, DiscoveryError>> + Send;
}

/// Metric catalog listing
pub trait CatalogOperations: Send + Sync {
    /// List every dimension combination with data for one metric
    fn list_metric_catalog(
        &self,
        namespace: &str,
        metric_name: &str,
    ) -> impl Future<Output = Result<Vec<MetricCatalogEntry>, ClientError>> + Send;
}

/// Metric data retrieval
pub trait MetricDataOperations: Send + Sync {
    /// Execute one batch of queries, identified by each record's query id.
    ///
    /// An empty result means no data, not an error. Values within a result
    /// are ordered most recent first.
    fn fetch_batch(
        &self,
        records: &[ScrapeRecord],
        namespace: &str,
        window: FetchWindow,
    ) -> impl Future<Output = Result<Vec<MetricDataResult>, ClientError>> + Send;

    /// Fetch all statistics of a single metric series
    fn fetch_single(
        &self,
        dimensions: &[Dimension],
        namespace: &str,
        metric: &MetricConfig,
    ) -> impl Future<Output = Result<Vec<Datapoint>, ClientError>> + Send;
}

/// Supplies ready clients per (region, role).
pub trait ClientFactory: Send + Sync + 'static {
    type Tagging: TaggingOperations + 'static;
    type CloudWatch: CatalogOperations + MetricDataOperations + 'static;

    fn tagging_client(
        &self,
        region: &str,
        role: &RoleArn,
    ) -> impl Future<Output = anyhow::Result<Self::Tagging>> + Send;

    fn cloudwatch_client(
        &self,
        region: &str,
        role: &RoleArn,
    ) -> impl Future<Output = anyhow::Result<Self::CloudWatch>> + Send;
}
