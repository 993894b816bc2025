//! Errors returned by the external clients.
//!
//! None of these are fatal to a scrape: each one aborts only the unit or
//! partition that hit it.

use cloudwatch_scrape_common::ResourceRecord;
use thiserror::Error;

/// Failure of a single backend call
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rate limit exceeded
    #[error("{operation} was throttled")]
    Throttled { operation: &'static str },

    /// Any other backend error, with the AWS error code when one was returned
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },
}

impl ClientError {
    /// Generic API error without an error code
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            operation,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_throttling(&self) -> bool {
        matches!(self, ClientError::Throttled { .. })
    }

    /// AWS error code, if the backend returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Throttled { .. } => None,
            ClientError::Api { code, .. } => code.as_deref(),
        }
    }
}

/// Tag enumeration failed part way through.
///
/// Carries the resources listed before the failure so the caller can still
/// report them.
#[derive(Debug, Error)]
#[error("listing tagged resources failed after {} resources", .partial.len())]
pub struct DiscoveryError {
    pub partial: Vec<ResourceRecord>,
    #[source]
    pub source: ClientError,
}

impl DiscoveryError {
    pub fn new(partial: Vec<ResourceRecord>, source: ClientError) -> Self {
        Self { partial, source }
    }
}

impl From<ClientError> for DiscoveryError {
    fn from(source: ClientError) -> Self {
        Self::new(Vec::new(), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::api("ListMetrics", "access denied");
        assert_eq!(err.to_string(), "ListMetrics failed: access denied");
        assert!(!err.is_throttling());
        assert_eq!(err.code(), None);

        let throttled = ClientError::Throttled {
            operation: "GetMetricData",
        };
        assert_eq!(throttled.to_string(), "GetMetricData was throttled");
        assert!(throttled.is_throttling());
    }

    #[test]
    fn test_discovery_error_keeps_partial_and_source() {
        let partial = vec![ResourceRecord {
            id: "arn:aws:sqs:us-east-1:1:q".to_string(),
            service: "sqs".to_string(),
            region: "us-east-1".to_string(),
            tags: vec![],
        }];
        let err = DiscoveryError::new(partial, ClientError::api("GetResources", "boom"));
        assert_eq!(err.partial.len(), 1);
        assert_eq!(
            err.to_string(),
            "listing tagged resources failed after 1 resources"
        );
        assert_eq!(
            err.source().map(|s| s.to_string()).as_deref(),
            Some("GetResources failed: boom")
        );
    }
}
