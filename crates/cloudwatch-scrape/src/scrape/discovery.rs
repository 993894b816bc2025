//! Discovery job scraping for one (job, region, role)

use super::ScrapeResult;
use super::assembler::{QueryContext, assemble_queries, infer_resources};
use super::fetch::fetch_partitioned;
use super::limits::ScrapeLimits;
use crate::client::{CatalogOperations, FetchWindow, MetricDataOperations, TaggingOperations};
use cloudwatch_scrape_common::tags::filter_through_tags;
use cloudwatch_scrape_common::{
    DiscoveryJob, ExportedTagsOnMetrics, MetricCatalogEntry, MetricConfig, QueryIdGenerator,
    ResourceRecord, RoleArn,
};
use tracing::{debug, error, info, instrument, warn};

/// One discovery unit: a job scraped in a single region under a single role
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryUnit<'a> {
    pub job: &'a DiscoveryJob,
    pub region: &'a str,
    pub role: &'a RoleArn,
    pub exported_tags: &'a ExportedTagsOnMetrics,
    pub limits: &'a ScrapeLimits,
    pub metrics_per_query: usize,
}

impl DiscoveryUnit<'_> {
    /// Discover resources, assemble their queries and fetch them.
    ///
    /// A failed tag listing aborts the unit but still returns the resources
    /// listed before the failure. Resources inferred from the catalog are
    /// queried but not reported.
    #[instrument(skip_all, fields(job = %self.job.service, region = %self.region, role = %self.role))]
    pub async fn run<T, C>(&self, tagging: &T, cloudwatch: &C) -> ScrapeResult
    where
        T: TaggingOperations,
        C: CatalogOperations + MetricDataOperations,
    {
        let Some(service) = self.job.descriptor() else {
            error!("Unknown service, skipping job");
            return ScrapeResult::default();
        };
        info!(metrics = self.job.metrics.len(), "Starting discovery job");

        let resources = match self.discover_resources(tagging).await {
            Ok(resources) => resources,
            Err(partial) => {
                return ScrapeResult {
                    resources: partial,
                    records: Vec::new(),
                };
            }
        };

        let ids = QueryIdGenerator::new();
        let ctx = QueryContext {
            job: self.job,
            service,
            region: self.region,
            exported_tags: self.exported_tags,
            ids: &ids,
        };

        let mut records = Vec::new();
        for metric in &self.job.metrics {
            let Some(catalog) = self.fetch_catalog(cloudwatch, service.namespace, metric).await
            else {
                continue;
            };

            let inferred;
            let targets = if resources.is_empty() {
                inferred = infer_resources(service, self.region, &catalog);
                debug!(
                    metric = %metric.name,
                    inferred = inferred.len(),
                    "No tagged resources, inferring from metric catalog"
                );
                &inferred
            } else {
                &resources
            };

            for resource in targets {
                records.extend(assemble_queries(&ctx, resource, metric, &catalog));
            }
        }

        let assembled = records.len();
        let records = fetch_partitioned(
            cloudwatch,
            records,
            service.namespace,
            FetchWindow::for_job(self.job),
            self.metrics_per_query,
        )
        .await;

        info!(
            resources = resources.len(),
            assembled,
            records = records.len(),
            "Discovery job scraped"
        );
        ScrapeResult { resources, records }
    }

    /// List tagged resources under a discovery permit and keep those matching
    /// the job's search tags.
    ///
    /// On failure returns the filtered partial listing as the error.
    async fn discover_resources<T: TaggingOperations>(
        &self,
        tagging: &T,
    ) -> Result<Vec<ResourceRecord>, Vec<ResourceRecord>> {
        let listed = {
            let _permit = match self.limits.discovery_permit().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Discovery limiter closed");
                    return Err(Vec::new());
                }
            };
            tagging.list_tagged_resources(self.job, self.region).await
        };

        match listed {
            Ok(resources) => Ok(self.filter_by_search_tags(resources)),
            Err(e) => {
                error!(
                    error = %e,
                    cause = %e.source,
                    "Couldn't describe resources, skipping metrics for this region"
                );
                Err(self.filter_by_search_tags(e.partial))
            }
        }
    }

    fn filter_by_search_tags(&self, resources: Vec<ResourceRecord>) -> Vec<ResourceRecord> {
        resources
            .into_iter()
            .filter(|r| filter_through_tags(r, &self.job.search_tags))
            .collect()
    }

    /// Fetch the metric catalog under a discovery permit. `None` skips the metric.
    async fn fetch_catalog<C: CatalogOperations>(
        &self,
        cloudwatch: &C,
        namespace: &str,
        metric: &MetricConfig,
    ) -> Option<Vec<MetricCatalogEntry>> {
        let _permit = match self.limits.discovery_permit().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Discovery limiter closed");
                return None;
            }
        };
        match cloudwatch.list_metric_catalog(namespace, &metric.name).await {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                warn!(
                    metric = %metric.name,
                    error = %e,
                    "Couldn't list metric catalog, skipping metric"
                );
                None
            }
        }
    }
}
