//! Scrape configuration loading from YAML
//!
//! ```yaml
//! discovery:
//!   exportedTagsOnMetrics:
//!     ec2: [Name]
//!   jobs:
//!     - type: ec2
//!       regions: [us-east-1]
//!       searchTags:
//!         - key: env
//!           value: ^prod$
//!       metrics:
//!         - name: CPUUtilization
//!           statistics: [Average, Maximum]
//! static:
//!   - name: nat
//!     namespace: AWS/NATGateway
//!     regions: [us-east-1]
//!     dimensions:
//!       - name: NatGatewayId
//!         value: nat-0abc
//!     metrics:
//!       - name: ActiveConnectionCount
//!         statistics: [Maximum]
//! ```

use crate::defaults::{
    AWS_NAMESPACE_PREFIX, DEFAULT_CLOUDWATCH_CONCURRENCY, DEFAULT_DELAY_SECS,
    DEFAULT_DISCOVERY_CONCURRENCY, DEFAULT_LENGTH_SECS, DEFAULT_METRICS_PER_QUERY,
    DEFAULT_PERIOD_SECS, MAX_PERIOD_SECS,
};
use crate::error::ConfigError;
use crate::model::{Dimension, Tag};
use crate::services::{self, ServiceDescriptor};
use crate::tags::TagFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Tag names exported as metric labels, keyed by service short name
pub type ExportedTagsOnMetrics = HashMap<String, Vec<String>>;

/// IAM role to assume for a job. Empty means the default credential chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleArn(String);

impl RoleArn {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// The ARN to assume, or `None` for default credentials
    pub fn as_assumable(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(&self.0)
        }
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_assumable() {
            Some(arn) => f.write_str(arn),
            None => f.write_str("default"),
        }
    }
}

/// Top-level scrape configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default, rename = "static")]
    pub static_jobs: Vec<StaticJob>,
}

/// Discovery jobs and the tags they export onto metrics
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub exported_tags_on_metrics: ExportedTagsOnMetrics,

    #[serde(default)]
    pub jobs: Vec<DiscoveryJob>,
}

/// A job whose resources are discovered by tags or inferred from the metric catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryJob {
    /// Service short name, see [`crate::services`]
    #[serde(rename = "type")]
    pub service: String,

    pub regions: Vec<String>,

    #[serde(default)]
    pub role_arns: Vec<RoleArn>,

    /// Resources must match every search tag
    #[serde(default)]
    pub search_tags: Vec<TagFilter>,

    #[serde(default)]
    pub custom_tags: Vec<Tag>,

    /// Valueless dimension names every queried series must also carry
    #[serde(default)]
    pub aws_dimensions: Vec<String>,

    // Job-level defaults inherited by metrics that don't set their own
    #[serde(default)]
    pub statistics: Vec<String>,
    pub period: Option<u32>,
    pub length: Option<u32>,
    pub delay: Option<u32>,
    pub nil_to_zero: Option<bool>,
    pub add_cloudwatch_timestamp: Option<bool>,

    pub metrics: Vec<MetricConfig>,
}

/// A job over one explicitly configured resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticJob {
    pub name: String,
    pub namespace: String,
    pub regions: Vec<String>,

    #[serde(default)]
    pub role_arns: Vec<RoleArn>,

    #[serde(default)]
    pub custom_tags: Vec<Tag>,

    #[serde(default)]
    pub dimensions: Vec<Dimension>,

    pub metrics: Vec<MetricConfig>,
}

/// One metric to scrape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    pub name: String,

    #[serde(default)]
    pub statistics: Vec<String>,

    pub period: Option<u32>,
    pub length: Option<u32>,
    pub delay: Option<u32>,

    /// Fixed dimensions appended to every resolved dimension set
    #[serde(default)]
    pub additional_dimensions: Vec<Dimension>,

    pub nil_to_zero: Option<bool>,
    pub add_cloudwatch_timestamp: Option<bool>,
}

impl MetricConfig {
    /// Convenience constructor with default settings
    pub fn new(name: impl Into<String>, statistics: &[&str]) -> Self {
        Self {
            name: name.into(),
            statistics: statistics.iter().map(|s| s.to_string()).collect(),
            period: None,
            length: None,
            delay: None,
            additional_dimensions: Vec::new(),
            nil_to_zero: None,
            add_cloudwatch_timestamp: None,
        }
    }

    pub fn period(&self) -> u32 {
        self.period.unwrap_or(DEFAULT_PERIOD_SECS)
    }

    pub fn length(&self) -> u32 {
        self.length.unwrap_or(DEFAULT_LENGTH_SECS)
    }

    pub fn delay(&self) -> u32 {
        self.delay.unwrap_or(DEFAULT_DELAY_SECS)
    }

    pub fn nil_to_zero(&self) -> bool {
        self.nil_to_zero.unwrap_or(false)
    }

    pub fn add_cloudwatch_timestamp(&self) -> bool {
        self.add_cloudwatch_timestamp.unwrap_or(false)
    }

    fn validate(&self, job: &str) -> Result<(), ConfigError> {
        if self.statistics.is_empty() {
            return Err(ConfigError::NoStatistics {
                job: job.to_string(),
                metric: self.name.clone(),
            });
        }
        if self.period == Some(0) {
            return Err(ConfigError::ZeroPeriod {
                job: job.to_string(),
                metric: self.name.clone(),
            });
        }
        if self.period.is_some_and(|p| p > MAX_PERIOD_SECS) {
            return Err(ConfigError::PeriodTooLarge {
                job: job.to_string(),
                metric: self.name.clone(),
                max: MAX_PERIOD_SECS,
            });
        }
        Ok(())
    }
}

impl DiscoveryJob {
    /// Registry entry for this job's service
    pub fn descriptor(&self) -> Option<&'static ServiceDescriptor> {
        services::lookup(&self.service)
    }

    /// Window length for batched queries: the job length (default 120 s)
    /// raised to the largest metric length.
    pub fn window_length(&self) -> u32 {
        self.metrics
            .iter()
            .filter_map(|m| m.length)
            .fold(self.length.unwrap_or(DEFAULT_LENGTH_SECS), u32::max)
    }

    /// Delay applied to the end of the batched query window: the job delay
    /// raised to the largest metric delay.
    pub fn window_delay(&self) -> u32 {
        self.metrics
            .iter()
            .filter_map(|m| m.delay)
            .fold(self.delay.unwrap_or(DEFAULT_DELAY_SECS), u32::max)
    }

    /// Push job-level defaults into metrics that don't override them
    fn inherit_defaults(&mut self) {
        for metric in &mut self.metrics {
            if metric.statistics.is_empty() {
                metric.statistics = self.statistics.clone();
            }
            metric.period = metric.period.or(self.period);
            metric.length = metric.length.or(self.length);
            metric.delay = metric.delay.or(self.delay);
            metric.nil_to_zero = metric.nil_to_zero.or(self.nil_to_zero);
            metric.add_cloudwatch_timestamp =
                metric.add_cloudwatch_timestamp.or(self.add_cloudwatch_timestamp);
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.descriptor().is_none() {
            return Err(ConfigError::UnknownService(self.service.clone()));
        }
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions(self.service.clone()));
        }
        if self.metrics.is_empty() {
            return Err(ConfigError::NoMetrics(self.service.clone()));
        }
        if self.role_arns.is_empty() {
            self.role_arns.push(RoleArn::default());
        }
        self.inherit_defaults();
        for metric in &self.metrics {
            metric.validate(&self.service)?;
        }
        Ok(())
    }
}

impl StaticJob {
    /// Service name derived from the namespace (`AWS/EC2` -> `EC2`)
    pub fn service(&self) -> &str {
        self.namespace
            .strip_prefix(AWS_NAMESPACE_PREFIX)
            .unwrap_or(&self.namespace)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace(self.name.clone()));
        }
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions(self.name.clone()));
        }
        if self.metrics.is_empty() {
            return Err(ConfigError::NoMetrics(self.name.clone()));
        }
        if self.role_arns.is_empty() {
            self.role_arns.push(RoleArn::default());
        }
        for metric in &self.metrics {
            metric.validate(&self.name)?;
        }
        Ok(())
    }
}

impl ScrapeConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: ScrapeConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every job, filling in default roles and inherited metric settings
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        for job in &mut self.discovery.jobs {
            job.validate()?;
        }
        for job in &mut self.static_jobs {
            job.validate()?;
        }
        Ok(())
    }
}

/// Engine limits, set from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSettings {
    /// Maximum queries per GetMetricData call
    pub metrics_per_query: usize,
    /// Concurrent tag enumeration and metric catalog calls
    pub discovery_concurrency: usize,
    /// Concurrent single-metric calls
    pub cloudwatch_concurrency: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            metrics_per_query: DEFAULT_METRICS_PER_QUERY,
            discovery_concurrency: DEFAULT_DISCOVERY_CONCURRENCY,
            cloudwatch_concurrency: DEFAULT_CLOUDWATCH_CONCURRENCY,
        }
    }
}

impl ScrapeSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics_per_query == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.discovery_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency("discovery"));
        }
        if self.cloudwatch_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency("cloudwatch"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
discovery:
  exportedTagsOnMetrics:
    ec2: [Name, env]
  jobs:
    - type: ec2
      regions: [us-east-1, eu-west-1]
      roleArns: ["arn:aws:iam::123456789012:role/scraper"]
      searchTags:
        - key: env
          value: ^prod
      customTags:
        - key: team
          value: platform
      awsDimensions: [AutoScalingGroupName]
      length: 300
      delay: 60
      statistics: [Average]
      metrics:
        - name: CPUUtilization
          statistics: [Average, Maximum]
          length: 600
        - name: NetworkIn
          period: 60
          additionalDimensions:
            - name: Stage
              value: prod
static:
  - name: nat-gateway
    namespace: AWS/NATGateway
    regions: [us-east-1]
    dimensions:
      - name: NatGatewayId
        value: nat-0abc
    metrics:
      - name: ActiveConnectionCount
        statistics: [Maximum]
"#;

    #[test]
    fn test_parse_sample() {
        let config = ScrapeConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.discovery.jobs.len(), 1);
        assert_eq!(config.static_jobs.len(), 1);
        assert_eq!(
            config.discovery.exported_tags_on_metrics["ec2"],
            vec!["Name".to_string(), "env".to_string()]
        );

        let job = &config.discovery.jobs[0];
        assert_eq!(job.service, "ec2");
        assert_eq!(job.regions, vec!["us-east-1", "eu-west-1"]);
        assert_eq!(job.search_tags.len(), 1);
        assert!(job.search_tags[0].pattern.is_match("production"));
        assert_eq!(job.custom_tags, vec![Tag::new("team", "platform")]);
        assert_eq!(job.aws_dimensions, vec!["AutoScalingGroupName".to_string()]);

        let static_job = &config.static_jobs[0];
        assert_eq!(static_job.service(), "NATGateway");
        assert_eq!(static_job.role_arns, vec![RoleArn::default()]);
    }

    #[test]
    fn test_metrics_inherit_job_defaults() {
        let config = ScrapeConfig::from_yaml(SAMPLE).unwrap();
        let job = &config.discovery.jobs[0];

        let cpu = &job.metrics[0];
        assert_eq!(cpu.statistics, vec!["Average", "Maximum"]);
        assert_eq!(cpu.length(), 600);
        assert_eq!(cpu.delay(), 60);
        assert_eq!(cpu.period(), DEFAULT_PERIOD_SECS);

        let net = &job.metrics[1];
        assert_eq!(net.statistics, vec!["Average"]);
        assert_eq!(net.period(), 60);
        assert_eq!(net.length(), 300);
        assert_eq!(net.additional_dimensions, vec![Dimension::new("Stage", "prod")]);
    }

    #[test]
    fn test_window_length() {
        let config = ScrapeConfig::from_yaml(SAMPLE).unwrap();
        let job = &config.discovery.jobs[0];
        assert_eq!(job.window_length(), 600);
        assert_eq!(job.window_delay(), 60);
    }

    #[test]
    fn test_window_length_defaults() {
        let yaml = r#"
discovery:
  jobs:
    - type: sqs
      regions: [us-east-1]
      metrics:
        - name: NumberOfMessagesSent
          statistics: [Sum]
"#;
        let config = ScrapeConfig::from_yaml(yaml).unwrap();
        let job = &config.discovery.jobs[0];
        assert_eq!(job.window_length(), DEFAULT_LENGTH_SECS);
        assert_eq!(job.window_delay(), 0);
        assert_eq!(job.role_arns, vec![RoleArn::default()]);
    }

    #[test]
    fn test_smaller_metric_length_does_not_shrink_window() {
        let yaml = r#"
discovery:
  jobs:
    - type: sqs
      regions: [us-east-1]
      length: 900
      metrics:
        - name: NumberOfMessagesSent
          statistics: [Sum]
          length: 60
"#;
        let config = ScrapeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.discovery.jobs[0].window_length(), 900);
    }

    #[test]
    fn test_metric_delay_raises_window_delay() {
        let yaml = r#"
discovery:
  jobs:
    - type: sqs
      regions: [us-east-1]
      delay: 60
      metrics:
        - name: NumberOfMessagesSent
          statistics: [Sum]
          delay: 600
        - name: NumberOfMessagesReceived
          statistics: [Sum]
"#;
        let config = ScrapeConfig::from_yaml(yaml).unwrap();
        let job = &config.discovery.jobs[0];
        assert_eq!(job.metrics[0].delay(), 600);
        assert_eq!(job.metrics[1].delay(), 60);
        assert_eq!(job.window_delay(), 600);
    }

    #[test]
    fn test_rejects_unknown_service() {
        let yaml = r#"
discovery:
  jobs:
    - type: mainframe
      regions: [us-east-1]
      metrics:
        - name: Foo
          statistics: [Sum]
"#;
        let err = ScrapeConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownService(s) if s == "mainframe"));
    }

    #[test]
    fn test_rejects_missing_statistics() {
        let yaml = r#"
discovery:
  jobs:
    - type: ec2
      regions: [us-east-1]
      metrics:
        - name: CPUUtilization
"#;
        let err = ScrapeConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::NoStatistics { .. }));
    }

    #[test]
    fn test_rejects_period_overflowing_i32() {
        let yaml = r#"
static:
  - name: nat
    namespace: AWS/NATGateway
    regions: [us-east-1]
    metrics:
      - name: BytesOutToDestination
        statistics: [Sum]
        period: 3000000000
"#;
        let err = ScrapeConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PeriodTooLarge { ref metric, .. } if metric == "BytesOutToDestination"
        ));
    }

    #[test]
    fn test_rejects_empty_regions() {
        let yaml = r#"
static:
  - name: nat
    namespace: AWS/NATGateway
    regions: []
    metrics:
      - name: ActiveConnectionCount
        statistics: [Maximum]
"#;
        let err = ScrapeConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::NoRegions(n) if n == "nat"));
    }

    #[test]
    fn test_rejects_bad_search_tag_regex() {
        let yaml = r#"
discovery:
  jobs:
    - type: ec2
      regions: [us-east-1]
      searchTags:
        - key: env
          value: "(prod"
      metrics:
        - name: CPUUtilization
          statistics: [Average]
"#;
        assert!(matches!(
            ScrapeConfig::from_yaml(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();
        let config = ScrapeConfig::load(file.path()).unwrap();
        assert_eq!(config.discovery.jobs[0].regions.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScrapeConfig::load(Path::new("/nonexistent/scrape.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(RoleArn::default().to_string(), "default");
        let role = RoleArn::new("arn:aws:iam::1:role/r");
        assert_eq!(role.to_string(), "arn:aws:iam::1:role/r");
        assert_eq!(role.as_assumable(), Some("arn:aws:iam::1:role/r"));
    }

    #[test]
    fn test_settings_validation() {
        assert!(ScrapeSettings::default().validate().is_ok());
        let zero_batch = ScrapeSettings {
            metrics_per_query: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_batch.validate(),
            Err(ConfigError::InvalidBatchSize)
        ));
        let zero_tags = ScrapeSettings {
            discovery_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_tags.validate(),
            Err(ConfigError::InvalidConcurrency("discovery"))
        ));
    }
}
