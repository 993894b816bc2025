//! Static job scraping: fixed dimension sets, one fetch per metric

use super::limits::ScrapeLimits;
use crate::client::MetricDataOperations;
use chrono::{DateTime, Utc};
use cloudwatch_scrape_common::{
    Datapoint, DimensionSet, MetricConfig, QueryIdGenerator, ScrapeRecord, StaticJob,
};
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

/// One static unit: a static job scraped in a single region
#[derive(Debug)]
pub struct StaticUnit<'a> {
    job: &'a StaticJob,
    region: &'a str,
    limits: &'a ScrapeLimits,
    dimensions: DimensionSet,
    ids: QueryIdGenerator,
}

impl<'a> StaticUnit<'a> {
    pub fn new(job: &'a StaticJob, region: &'a str, limits: &'a ScrapeLimits) -> Self {
        Self {
            job,
            region,
            limits,
            dimensions: job.dimensions.iter().cloned().collect(),
            ids: QueryIdGenerator::new(),
        }
    }

    /// Fetch every metric of the job concurrently.
    ///
    /// Each fetch holds a cloudwatch permit. A failed fetch drops only its
    /// own metric.
    #[instrument(skip_all, fields(job = %self.job.name, region = %self.region))]
    pub async fn run<C: MetricDataOperations>(&self, cloudwatch: &C) -> Vec<ScrapeRecord> {
        info!(metrics = self.job.metrics.len(), "Starting static job");
        let mut fetches = Vec::new();
        for metric in &self.job.metrics {
            fetches.push(self.scrape_metric(cloudwatch, metric));
        }
        let records: Vec<_> = join_all(fetches).await.into_iter().flatten().collect();
        info!(records = records.len(), "Static job scraped");
        records
    }

    async fn scrape_metric<C: MetricDataOperations>(
        &self,
        cloudwatch: &C,
        metric: &MetricConfig,
    ) -> Vec<ScrapeRecord> {
        let fetched = {
            let _permit = match self.limits.cloudwatch_permit().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "CloudWatch limiter closed");
                    return Vec::new();
                }
            };
            cloudwatch
                .fetch_single(self.dimensions.as_slice(), &self.job.namespace, metric)
                .await
        };

        match fetched {
            Ok(points) if points.is_empty() => {
                debug!(metric = %metric.name, "No datapoints returned");
                Vec::new()
            }
            Ok(points) => self.records_for(metric, &points),
            Err(e) => {
                warn!(metric = %metric.name, error = %e, "Couldn't fetch metric statistics");
                Vec::new()
            }
        }
    }

    /// One record per configured statistic, valued from the most recent
    /// datapoint carrying it. Statistics absent from every datapoint are
    /// skipped.
    pub fn records_for(&self, metric: &MetricConfig, points: &[Datapoint]) -> Vec<ScrapeRecord> {
        metric
            .statistics
            .iter()
            .filter_map(|statistic| {
                let (value, timestamp) = latest_value(points, statistic)?;
                Some(ScrapeRecord {
                    resource_id: self.job.name.clone(),
                    query_id: self.ids.next_id(),
                    metric: metric.name.clone(),
                    service: self.job.service().to_string(),
                    statistic: statistic.clone(),
                    dimensions: self.dimensions.clone(),
                    region: self.region.to_string(),
                    period: metric.period(),
                    length: metric.length(),
                    delay: metric.delay(),
                    nil_to_zero: metric.nil_to_zero(),
                    add_cloudwatch_timestamp: metric.add_cloudwatch_timestamp(),
                    custom_tags: self.job.custom_tags.clone(),
                    tags: Vec::new(),
                    value: Some(value),
                    timestamp: Some(timestamp),
                })
            })
            .collect()
    }
}

fn latest_value(points: &[Datapoint], statistic: &str) -> Option<(f64, DateTime<Utc>)> {
    points
        .iter()
        .filter_map(|p| p.statistics.get(statistic).map(|v| (*v, p.timestamp)))
        .max_by_key(|(_, timestamp)| *timestamp)
}
