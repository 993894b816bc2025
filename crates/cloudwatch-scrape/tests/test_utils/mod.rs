//! Shared test utilities for integration tests
//!
//! In-memory fake clients implementing the client traits, backed by one
//! shared `FakeCloud` that records every call it sees.

#![allow(dead_code)]

use cloudwatch_scrape::{
    CatalogOperations, ClientError, ClientFactory, DiscoveryError, FetchWindow,
    MetricDataOperations, TaggingOperations,
};
use cloudwatch_scrape_common::{
    Datapoint, Dimension, DiscoveryJob, MetricCatalogEntry, MetricConfig, MetricDataResult,
    ResourceRecord, RoleArn, ScrapeRecord, Tag,
};
use chrono::DateTime;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Kind of backend call, as recorded in [`FakeCloud::call_starts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Tagging,
    Catalog,
    Single,
}

/// Tracks how many calls of one kind are in flight, and the peak
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    pub fn enter(&self) -> GaugeGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard { gauge: self }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard<'a> {
    gauge: &'a Gauge,
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One GetMetricData call as seen by the fake
#[derive(Debug, Clone)]
pub struct BatchCall {
    pub region: String,
    pub query_ids: Vec<String>,
}

/// In-memory backend shared by all fake clients
#[derive(Debug, Default)]
pub struct FakeCloud {
    resources: HashMap<String, Vec<ResourceRecord>>,
    /// region -> number of resources listed before the call fails
    failing_tagging: HashMap<String, usize>,
    failing_clients: HashSet<String>,
    catalogs: HashMap<String, Vec<MetricCatalogEntry>>,
    failing_catalogs: HashSet<String>,
    datapoints: HashMap<String, Vec<Datapoint>>,
    failing_batch_id: Option<String>,
    stray_result_id: Option<String>,
    value: f64,
    call_delay: Duration,

    pub discovery_calls: Gauge,
    pub single_calls: Gauge,
    pub tagging_calls: Mutex<Vec<(String, RoleArn)>>,
    pub batch_calls: Mutex<Vec<BatchCall>>,
    /// When each tagging, catalog and single call started, in start order
    pub call_starts: Mutex<Vec<(CallKind, Instant)>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            value: 1.0,
            ..Default::default()
        }
    }

    pub fn with_resources(mut self, region: &str, resources: Vec<ResourceRecord>) -> Self {
        self.resources.insert(region.to_string(), resources);
        self
    }

    /// Fail tag listing in `region` after `listed` resources
    pub fn with_failing_tagging(mut self, region: &str, listed: usize) -> Self {
        self.failing_tagging.insert(region.to_string(), listed);
        self
    }

    /// Fail client construction in `region`
    pub fn with_failing_clients(mut self, region: &str) -> Self {
        self.failing_clients.insert(region.to_string());
        self
    }

    pub fn with_catalog(mut self, metric: &str, entries: Vec<MetricCatalogEntry>) -> Self {
        self.catalogs.insert(metric.to_string(), entries);
        self
    }

    pub fn with_failing_catalog(mut self, metric: &str) -> Self {
        self.failing_catalogs.insert(metric.to_string());
        self
    }

    pub fn with_datapoints(mut self, metric: &str, points: Vec<Datapoint>) -> Self {
        self.datapoints.insert(metric.to_string(), points);
        self
    }

    /// Fail every batch containing this query id
    pub fn with_failing_batch(mut self, query_id: &str) -> Self {
        self.failing_batch_id = Some(query_id.to_string());
        self
    }

    /// Add a result with an id no record carries to every batch
    pub fn with_stray_result(mut self, query_id: &str) -> Self {
        self.stray_result_id = Some(query_id.to_string());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    pub fn tagging_call_count(&self) -> usize {
        self.tagging_calls.lock().unwrap().len()
    }

    pub fn batches(&self) -> Vec<BatchCall> {
        self.batch_calls.lock().unwrap().clone()
    }

    /// Start instants of every call of one kind
    pub fn starts(&self, kind: CallKind) -> Vec<Instant> {
        self.call_starts
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, at)| *at)
            .collect()
    }

    fn record_start(&self, kind: CallKind) {
        self.call_starts.lock().unwrap().push((kind, Instant::now()));
    }

    async fn pause(&self) {
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
    }
}

/// Factory handing out fakes that share one `FakeCloud`
#[derive(Debug, Clone)]
pub struct FakeFactory {
    pub cloud: Arc<FakeCloud>,
}

impl FakeFactory {
    pub fn new(cloud: FakeCloud) -> Self {
        Self {
            cloud: Arc::new(cloud),
        }
    }
}

impl ClientFactory for FakeFactory {
    type Tagging = FakeTagging;
    type CloudWatch = FakeCloudWatch;

    async fn tagging_client(&self, region: &str, role: &RoleArn) -> anyhow::Result<FakeTagging> {
        if self.cloud.failing_clients.contains(region) {
            anyhow::bail!("no credentials for {region}");
        }
        Ok(FakeTagging {
            cloud: self.cloud.clone(),
            role: role.clone(),
        })
    }

    async fn cloudwatch_client(
        &self,
        region: &str,
        _role: &RoleArn,
    ) -> anyhow::Result<FakeCloudWatch> {
        if self.cloud.failing_clients.contains(region) {
            anyhow::bail!("no credentials for {region}");
        }
        Ok(FakeCloudWatch {
            cloud: self.cloud.clone(),
            region: region.to_string(),
        })
    }
}

pub struct FakeTagging {
    cloud: Arc<FakeCloud>,
    role: RoleArn,
}

impl TaggingOperations for FakeTagging {
    async fn list_tagged_resources(
        &self,
        _job: &DiscoveryJob,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, DiscoveryError> {
        let _in_flight = self.cloud.discovery_calls.enter();
        self.cloud.record_start(CallKind::Tagging);
        self.cloud
            .tagging_calls
            .lock()
            .unwrap()
            .push((region.to_string(), self.role.clone()));
        self.cloud.pause().await;

        let resources = self.cloud.resources.get(region).cloned().unwrap_or_default();
        match self.cloud.failing_tagging.get(region) {
            Some(&listed) => Err(DiscoveryError::new(
                resources.into_iter().take(listed).collect(),
                ClientError::api("GetResources", "internal failure"),
            )),
            None => Ok(resources),
        }
    }
}

pub struct FakeCloudWatch {
    cloud: Arc<FakeCloud>,
    region: String,
}

impl CatalogOperations for FakeCloudWatch {
    async fn list_metric_catalog(
        &self,
        _namespace: &str,
        metric_name: &str,
    ) -> Result<Vec<MetricCatalogEntry>, ClientError> {
        let _in_flight = self.cloud.discovery_calls.enter();
        self.cloud.record_start(CallKind::Catalog);
        self.cloud.pause().await;

        if self.cloud.failing_catalogs.contains(metric_name) {
            return Err(ClientError::Throttled {
                operation: "ListMetrics",
            });
        }
        Ok(self
            .cloud
            .catalogs
            .get(metric_name)
            .cloned()
            .unwrap_or_default())
    }
}

impl MetricDataOperations for FakeCloudWatch {
    async fn fetch_batch(
        &self,
        records: &[ScrapeRecord],
        _namespace: &str,
        _window: FetchWindow,
    ) -> Result<Vec<MetricDataResult>, ClientError> {
        let query_ids: Vec<String> = records.iter().map(|r| r.query_id.clone()).collect();
        self.cloud.batch_calls.lock().unwrap().push(BatchCall {
            region: self.region.clone(),
            query_ids: query_ids.clone(),
        });
        self.cloud.pause().await;

        if let Some(failing) = &self.cloud.failing_batch_id {
            if query_ids.contains(failing) {
                return Err(ClientError::api("GetMetricData", "internal failure"));
            }
        }

        let timestamp = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut results: Vec<MetricDataResult> = query_ids
            .into_iter()
            .map(|id| MetricDataResult {
                id,
                values: vec![self.cloud.value, self.cloud.value - 1.0],
                timestamps: vec![timestamp, timestamp - chrono::Duration::seconds(60)],
            })
            .collect();
        if let Some(stray) = &self.cloud.stray_result_id {
            results.insert(
                0,
                MetricDataResult {
                    id: stray.clone(),
                    values: vec![-1.0],
                    timestamps: vec![timestamp],
                },
            );
        }
        Ok(results)
    }

    async fn fetch_single(
        &self,
        _dimensions: &[Dimension],
        _namespace: &str,
        metric: &MetricConfig,
    ) -> Result<Vec<Datapoint>, ClientError> {
        let _in_flight = self.cloud.single_calls.enter();
        self.cloud.record_start(CallKind::Single);
        self.cloud.pause().await;
        Ok(self
            .cloud
            .datapoints
            .get(&metric.name)
            .cloned()
            .unwrap_or_default())
    }
}

/// An EC2 instance resource as the tagging API would list it
pub fn ec2_instance(region: &str, instance_id: &str, tags: &[(&str, &str)]) -> ResourceRecord {
    ResourceRecord {
        id: format!("arn:aws:ec2:{region}:123456789012:instance/{instance_id}"),
        service: "ec2".to_string(),
        region: region.to_string(),
        tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
    }
}

/// An SQS queue resource as the tagging API would list it
pub fn sqs_queue(region: &str, name: &str) -> ResourceRecord {
    ResourceRecord {
        id: format!("arn:aws:sqs:{region}:123456789012:{name}"),
        service: "sqs".to_string(),
        region: region.to_string(),
        tags: Vec::new(),
    }
}

/// An Auto Scaling group as DescribeAutoScalingGroups would list it
pub fn auto_scaling_group(region: &str, name: &str, tags: &[(&str, &str)]) -> ResourceRecord {
    ResourceRecord {
        id: format!(
            "arn:aws:autoscaling:{region}:123456789012:autoScalingGroup:\
             6d4f2a1c-0b7e-4c55-9a3e-1f0e2d3c4b5a:autoScalingGroupName/{name}"
        ),
        service: "asg".to_string(),
        region: region.to_string(),
        tags: tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect(),
    }
}

/// A catalog entry for `metric` with the given dimensions
pub fn catalog_entry(metric: &str, dimensions: &[(&str, &str)]) -> MetricCatalogEntry {
    MetricCatalogEntry::new(
        metric,
        dimensions
            .iter()
            .map(|(n, v)| Dimension::new(*n, *v))
            .collect::<Vec<_>>(),
    )
}

pub fn datapoint(secs: i64, statistics: &[(&str, f64)]) -> Datapoint {
    Datapoint {
        timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
        statistics: statistics
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
    }
}
