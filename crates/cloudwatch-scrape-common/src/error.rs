//! Configuration loading and validation errors

use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Discovery job names a service that is not in the registry
    #[error("unknown discovery job type '{0}'")]
    UnknownService(String),

    /// Job has no regions to scrape
    #[error("job '{0}' has no regions")]
    NoRegions(String),

    /// Job declares no metrics
    #[error("job '{0}' has no metrics")]
    NoMetrics(String),

    /// Metric has no statistics after applying job defaults
    #[error("metric '{metric}' in job '{job}' has no statistics")]
    NoStatistics { job: String, metric: String },

    /// Period of zero is rejected by CloudWatch
    #[error("metric '{metric}' in job '{job}' has a zero period")]
    ZeroPeriod { job: String, metric: String },

    /// Period does not fit the 32-bit field CloudWatch takes
    #[error("metric '{metric}' in job '{job}' has a period above {max} seconds")]
    PeriodTooLarge {
        job: String,
        metric: String,
        max: u32,
    },

    /// Static job without a namespace
    #[error("static job '{0}' has no namespace")]
    EmptyNamespace(String),

    /// metrics_per_query is zero
    #[error("metrics_per_query must be at least 1")]
    InvalidBatchSize,

    /// A concurrency limit is zero
    #[error("{0} concurrency must be at least 1")]
    InvalidConcurrency(&'static str),

    /// Failed to parse YAML configuration
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::UnknownService("foo".to_string()).to_string(),
            "unknown discovery job type 'foo'"
        );
        assert_eq!(
            ConfigError::NoStatistics {
                job: "ec2".to_string(),
                metric: "CPUUtilization".to_string()
            }
            .to_string(),
            "metric 'CPUUtilization' in job 'ec2' has no statistics"
        );
        assert_eq!(
            ConfigError::InvalidConcurrency("discovery").to_string(),
            "discovery concurrency must be at least 1"
        );
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::io("/etc/scrape.yml", io_err);
        assert!(err.to_string().contains("/etc/scrape.yml"));
    }
}
