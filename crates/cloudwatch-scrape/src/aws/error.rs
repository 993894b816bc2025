//! AWS error classification
//!
//! Maps SDK errors onto [`ClientError`] using the `.code()` metadata rather
//! than string matching on the Debug format.

use crate::error::ClientError;
use aws_sdk_cloudwatch::error::{DisplayErrorContext, ProvideErrorMetadata};

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Classify an AWS error using its error code.
pub fn classify_aws_error(
    operation: &'static str,
    code: Option<&str>,
    message: Option<&str>,
) -> ClientError {
    match code {
        Some(c) if THROTTLING_CODES.contains(&c) => ClientError::Throttled { operation },
        _ => ClientError::Api {
            operation,
            code: code.map(|s| s.to_string()),
            message: message.unwrap_or("Unknown error").to_string(),
        },
    }
}

/// Classify any SDK error that carries error metadata.
///
/// Errors without a message (timeouts, dispatch failures) fall back to the
/// full error context so the cause isn't lost.
pub(crate) fn from_sdk_error<E>(operation: &'static str, err: &E) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let meta = ProvideErrorMetadata::meta(err);
    match meta.message() {
        Some(message) => classify_aws_error(operation, meta.code(), Some(message)),
        None => {
            let context = DisplayErrorContext(err).to_string();
            classify_aws_error(operation, meta.code(), Some(&context))
        }
    }
}
