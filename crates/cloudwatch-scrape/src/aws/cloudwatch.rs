//! CloudWatch metric catalog and metric data queries

use super::error::from_sdk_error;
use super::extract_pairs;
use crate::client::{CatalogOperations, FetchWindow, MetricDataOperations};
use crate::error::ClientError;
use aws_sdk_cloudwatch::{
    Client,
    primitives::DateTime as AwsDateTime,
    types::{self as cw, MetricDataQuery, MetricStat, ScanBy, Statistic},
};
use aws_config::SdkConfig;
use chrono::{DateTime, Utc};
use cloudwatch_scrape_common::{
    Datapoint, Dimension, MetricCatalogEntry, MetricConfig, MetricDataResult, ScrapeRecord,
};
use std::collections::BTreeMap;
use tracing::debug;

/// FIPS endpoint for CloudWatch in the given region
pub fn fips_endpoint(region: &str) -> String {
    format!("https://monitoring-fips.{region}.amazonaws.com")
}

/// CloudWatch client for catalog listing and metric retrieval
#[derive(Debug, Clone)]
pub struct CloudWatchClient {
    client: Client,
}

impl CloudWatchClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a client from a regional config, optionally pinned to the
    /// region's FIPS endpoint.
    pub fn from_config(config: &SdkConfig, fips: bool) -> Self {
        let mut builder = aws_sdk_cloudwatch::config::Builder::from(config);
        if fips {
            if let Some(region) = config.region() {
                builder = builder.endpoint_url(fips_endpoint(region.as_ref()));
            }
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

impl CatalogOperations for CloudWatchClient {
    async fn list_metric_catalog(
        &self,
        namespace: &str,
        metric_name: &str,
    ) -> Result<Vec<MetricCatalogEntry>, ClientError> {
        let mut pages = self
            .client
            .list_metrics()
            .namespace(namespace)
            .metric_name(metric_name)
            .into_paginator()
            .send();

        let mut entries = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| from_sdk_error("ListMetrics", &e))?;
            for metric in page.metrics() {
                entries.push(MetricCatalogEntry::new(
                    metric.metric_name().unwrap_or(metric_name),
                    to_dimensions(metric.dimensions()),
                ));
            }
        }

        debug!(
            namespace = %namespace,
            metric = %metric_name,
            entries = entries.len(),
            "Listed metric catalog"
        );
        Ok(entries)
    }
}

impl MetricDataOperations for CloudWatchClient {
    async fn fetch_batch(
        &self,
        records: &[ScrapeRecord],
        namespace: &str,
        window: FetchWindow,
    ) -> Result<Vec<MetricDataResult>, ClientError> {
        let (start, end) = window.bounds(Utc::now());
        let queries = records
            .iter()
            .map(|record| build_query(record, namespace))
            .collect::<Vec<_>>();

        let mut pages = self
            .client
            .get_metric_data()
            .start_time(AwsDateTime::from_secs(start.timestamp()))
            .end_time(AwsDateTime::from_secs(end.timestamp()))
            .scan_by(ScanBy::TimestampDescending)
            .set_metric_data_queries(Some(queries))
            .into_paginator()
            .send();

        let mut results = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| from_sdk_error("GetMetricData", &e))?;
            results.extend(page.metric_data_results().iter().filter_map(to_result));
        }

        debug!(
            namespace = %namespace,
            queries = records.len(),
            results = results.len(),
            "Fetched metric data"
        );
        Ok(results)
    }

    async fn fetch_single(
        &self,
        dimensions: &[Dimension],
        namespace: &str,
        metric: &MetricConfig,
    ) -> Result<Vec<Datapoint>, ClientError> {
        let (start, end) = FetchWindow::for_metric(metric).bounds(Utc::now());
        let (statistics, extended) = split_statistics(&metric.statistics);

        let response = self
            .client
            .get_metric_statistics()
            .namespace(namespace)
            .metric_name(&metric.name)
            .set_dimensions(Some(from_dimensions(dimensions)))
            .start_time(AwsDateTime::from_secs(start.timestamp()))
            .end_time(AwsDateTime::from_secs(end.timestamp()))
            .period(api_period(metric.period()))
            .set_statistics((!statistics.is_empty()).then_some(statistics))
            .set_extended_statistics((!extended.is_empty()).then_some(extended))
            .send()
            .await
            .map_err(|e| from_sdk_error("GetMetricStatistics", &e))?;

        let datapoints = response
            .datapoints()
            .iter()
            .filter_map(to_datapoint)
            .collect::<Vec<_>>();

        debug!(
            namespace = %namespace,
            metric = %metric.name,
            datapoints = datapoints.len(),
            "Fetched metric statistics"
        );
        Ok(datapoints)
    }
}

fn build_query(record: &ScrapeRecord, namespace: &str) -> MetricDataQuery {
    MetricDataQuery::builder()
        .id(&record.query_id)
        .metric_stat(
            MetricStat::builder()
                .metric(
                    cw::Metric::builder()
                        .namespace(namespace)
                        .metric_name(&record.metric)
                        .set_dimensions(Some(from_dimensions(record.dimensions.as_slice())))
                        .build(),
                )
                .period(api_period(record.period))
                .stat(&record.statistic)
                .build(),
        )
        .return_data(true)
        .build()
}

/// CloudWatch takes periods as `i32`; out of range values saturate instead of wrapping
fn api_period(period: u32) -> i32 {
    i32::try_from(period).unwrap_or(i32::MAX)
}

fn from_dimensions(dimensions: &[Dimension]) -> Vec<cw::Dimension> {
    dimensions
        .iter()
        .map(|d| cw::Dimension::builder().name(&d.name).value(&d.value).build())
        .collect()
}

fn to_dimensions(dimensions: &[cw::Dimension]) -> Vec<Dimension> {
    extract_pairs(
        dimensions,
        |d| d.name(),
        |d| d.value(),
        |name, value| Dimension::new(name, value),
    )
}

fn to_chrono(ts: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

fn to_result(result: &cw::MetricDataResult) -> Option<MetricDataResult> {
    Some(MetricDataResult {
        id: result.id()?.to_string(),
        values: result.values().to_vec(),
        timestamps: result.timestamps().iter().filter_map(to_chrono).collect(),
    })
}

/// Convert a datapoint into a statistic-name -> value map.
///
/// Datapoints without a timestamp can't be ordered and are dropped.
fn to_datapoint(point: &cw::Datapoint) -> Option<Datapoint> {
    let timestamp = to_chrono(point.timestamp()?)?;
    let mut statistics = BTreeMap::new();
    let standard = [
        (Statistic::Average, point.average()),
        (Statistic::Sum, point.sum()),
        (Statistic::Minimum, point.minimum()),
        (Statistic::Maximum, point.maximum()),
        (Statistic::SampleCount, point.sample_count()),
    ];
    for (statistic, value) in standard {
        if let Some(value) = value {
            statistics.insert(statistic.as_str().to_string(), value);
        }
    }
    if let Some(extended) = point.extended_statistics() {
        statistics.extend(extended.iter().map(|(k, v)| (k.clone(), *v)));
    }
    Some(Datapoint {
        timestamp,
        statistics,
    })
}

/// Split configured statistic names into standard and extended
/// (percentile, e.g. `p99`) statistics.
fn split_statistics(names: &[String]) -> (Vec<Statistic>, Vec<String>) {
    let mut standard = Vec::new();
    let mut extended = Vec::new();
    for name in names {
        if Statistic::values().contains(&name.as_str()) {
            standard.push(Statistic::from(name.as_str()));
        } else {
            extended.push(name.clone());
        }
    }
    (standard, extended)
}
