//! Record types flowing through the scrape pipeline.
//!
//! `ResourceRecord`s describe discovered resources (used for labeling),
//! `ScrapeRecord`s are individual metric queries and, once fetched, their
//! most recent value.

use crate::dimensions::DimensionSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A key/value tag, either from a resource or from job configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A name/value pair identifying a metric series within a namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A discovered resource and its tags.
///
/// Created once per resource per (job, region) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRecord {
    /// Resource identity (an ARN for tag-discovered resources)
    pub id: String,
    /// Discovery service short name (e.g. "ec2")
    pub service: String,
    pub region: String,
    pub tags: Vec<Tag>,
}

impl ResourceRecord {
    /// Value of the tag with the given key, if the resource carries it
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// One unit of metric work: a single statistic of a single series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeRecord {
    pub resource_id: String,
    /// Identifier correlating this record with a batch result
    pub query_id: String,
    pub metric: String,
    pub service: String,
    pub statistic: String,
    pub dimensions: DimensionSet,
    pub region: String,
    pub period: u32,
    pub length: u32,
    pub delay: u32,
    pub nil_to_zero: bool,
    pub add_cloudwatch_timestamp: bool,
    pub custom_tags: Vec<Tag>,
    /// Projected resource tags, one per exported tag name of the service
    pub tags: Vec<Tag>,
    pub value: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ScrapeRecord {
    /// Attach a fetched value. Only the first attached value is kept.
    pub fn attach(&mut self, value: f64, timestamp: Option<DateTime<Utc>>) -> bool {
        if self.value.is_some() {
            return false;
        }
        self.value = Some(value);
        self.timestamp = timestamp;
        true
    }
}

/// One (metric, dimension combination) listed by the metric catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCatalogEntry {
    pub metric_name: String,
    pub dimensions: DimensionSet,
}

impl MetricCatalogEntry {
    pub fn new(metric_name: impl Into<String>, dimensions: impl Into<DimensionSet>) -> Self {
        Self {
            metric_name: metric_name.into(),
            dimensions: dimensions.into(),
        }
    }
}

/// One result of a batched metric query.
///
/// Values and timestamps are parallel and ordered most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDataResult {
    pub id: String,
    pub values: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// One datapoint of a single-metric query, keyed by statistic name
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub statistics: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ScrapeRecord {
        ScrapeRecord {
            resource_id: "arn:aws:ec2:us-east-1:123456789012:instance/i-1".to_string(),
            query_id: "id_0".to_string(),
            metric: "CPUUtilization".to_string(),
            service: "ec2".to_string(),
            statistic: "Average".to_string(),
            dimensions: DimensionSet::from(vec![Dimension::new("InstanceId", "i-1")]),
            region: "us-east-1".to_string(),
            period: 300,
            length: 120,
            delay: 0,
            nil_to_zero: false,
            add_cloudwatch_timestamp: false,
            custom_tags: vec![],
            tags: vec![],
            value: None,
            timestamp: None,
        }
    }

    #[test]
    fn test_attach_keeps_first_value() {
        let mut r = record();
        assert!(r.attach(1.5, None));
        assert!(!r.attach(9.0, None));
        assert_eq!(r.value, Some(1.5));
    }

    #[test]
    fn test_resource_tag_lookup() {
        let resource = ResourceRecord {
            id: "arn".to_string(),
            service: "ec2".to_string(),
            region: "us-east-1".to_string(),
            tags: vec![Tag::new("Name", "web")],
        };
        assert_eq!(resource.tag("Name"), Some("web"));
        assert_eq!(resource.tag("env"), None);
    }
}
