//! AWS SDK implementations of the client contracts

pub mod cloudwatch;
pub mod context;
pub mod error;
pub mod tagging;

pub use cloudwatch::CloudWatchClient;
pub use context::AwsClientFactory;
pub use error::classify_aws_error;
pub use tagging::TaggingClient;

/// Convert SDK key/value pairs, dropping pairs with either side missing.
///
/// SDK shapes disagree on whether the members are optional, so callers pass
/// accessors that normalize both to `Option<&str>`.
pub(crate) fn extract_pairs<T, P>(
    items: &[T],
    key_fn: impl Fn(&T) -> Option<&str>,
    value_fn: impl Fn(&T) -> Option<&str>,
    make: impl Fn(&str, &str) -> P,
) -> Vec<P> {
    items
        .iter()
        .filter_map(|item| Some(make(key_fn(item)?, value_fn(item)?)))
        .collect()
}
