//! Default configuration values shared by the engine and the CLI.

/// Default metric window length in seconds when neither job nor metric sets one
pub const DEFAULT_LENGTH_SECS: u32 = 120;

/// Default metric period in seconds
pub const DEFAULT_PERIOD_SECS: u32 = 300;

/// Default scrape delay in seconds
pub const DEFAULT_DELAY_SECS: u32 = 0;

/// Largest period CloudWatch accepts; the API field is a signed 32-bit integer
pub const MAX_PERIOD_SECS: u32 = i32::MAX as u32;

/// Maximum queries accepted by a single GetMetricData call
pub const DEFAULT_METRICS_PER_QUERY: usize = 500;

/// Default number of concurrent tag/catalog calls
pub const DEFAULT_DISCOVERY_CONCURRENCY: usize = 5;

/// Default number of concurrent single-metric calls
pub const DEFAULT_CLOUDWATCH_CONCURRENCY: usize = 5;

/// Namespace prefix stripped from static job namespaces to derive the service name
pub const AWS_NAMESPACE_PREFIX: &str = "AWS/";
