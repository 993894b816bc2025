//! Query assembly: resources x metrics x statistics -> scrape records

use cloudwatch_scrape_common::defaults::DEFAULT_LENGTH_SECS;
use cloudwatch_scrape_common::dimensions::{
    augment_with_static_dimensions, catalog_dimension_values, filter_catalog,
    reconcile_job_dimensions, resolve_dimensions,
};
use cloudwatch_scrape_common::tags::project_metric_tags;
use cloudwatch_scrape_common::{
    DiscoveryJob, ExportedTagsOnMetrics, MetricCatalogEntry, MetricConfig, QueryIdGenerator,
    ResourceRecord, ScrapeRecord, ServiceDescriptor,
};

/// Everything query assembly needs besides the resource and metric
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    pub job: &'a DiscoveryJob,
    pub service: &'static ServiceDescriptor,
    pub region: &'a str,
    pub exported_tags: &'a ExportedTagsOnMetrics,
    pub ids: &'a QueryIdGenerator,
}

/// Build one record per matching catalog entry and configured statistic.
///
/// Emits nothing when the resource can't be resolved or no catalog entry
/// matches: only series the backend confirms exist are queried.
pub fn assemble_queries(
    ctx: &QueryContext<'_>,
    resource: &ResourceRecord,
    metric: &MetricConfig,
    catalog: &[MetricCatalogEntry],
) -> Vec<ScrapeRecord> {
    let Some(resolved) = resolve_dimensions(&resource.id, ctx.service, catalog) else {
        return Vec::new();
    };
    let resolved = augment_with_static_dimensions(resolved, &metric.additional_dimensions);
    let job_dimensions = reconcile_job_dimensions(&ctx.job.aws_dimensions, &resolved);
    let matching = filter_catalog(&resolved, &job_dimensions, catalog);
    if matching.is_empty() {
        return Vec::new();
    }

    let tags = project_metric_tags(resource, ctx.exported_tags);
    let length = metric
        .length()
        .max(ctx.job.length.unwrap_or(DEFAULT_LENGTH_SECS));

    let mut records = Vec::with_capacity(matching.len() * metric.statistics.len());
    for entry in matching {
        for statistic in &metric.statistics {
            records.push(ScrapeRecord {
                resource_id: resource.id.clone(),
                query_id: ctx.ids.next_id(),
                metric: metric.name.clone(),
                service: ctx.service.name.to_string(),
                statistic: statistic.clone(),
                dimensions: entry.dimensions.clone(),
                region: ctx.region.to_string(),
                period: metric.period(),
                length,
                delay: metric.delay(),
                nil_to_zero: metric.nil_to_zero(),
                add_cloudwatch_timestamp: metric.add_cloudwatch_timestamp(),
                custom_tags: ctx.job.custom_tags.clone(),
                tags: tags.clone(),
                value: None,
                timestamp: None,
            });
        }
    }
    records
}

/// Infer resources from the catalog when tag discovery found none.
///
/// Each distinct value of the service's primary dimension becomes one
/// untagged resource whose id resolves back to that value.
pub fn infer_resources(
    service: &ServiceDescriptor,
    region: &str,
    catalog: &[MetricCatalogEntry],
) -> Vec<ResourceRecord> {
    catalog_dimension_values(service, catalog)
        .into_iter()
        .map(|value| ResourceRecord {
            id: service.synthesize_resource_id(region, &value),
            service: service.name.to_string(),
            region: region.to_string(),
            tags: Vec::new(),
        })
        .collect()
}
