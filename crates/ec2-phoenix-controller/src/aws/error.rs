//! AWS error classification
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories the controller distinguishes
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource not found. For a just-created image this usually means
    /// "not visible yet" rather than gone.
    #[error("resource not found: {message}")]
    NotFound { message: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a throttling error
    pub fn is_throttled(&self) -> bool {
        matches!(self, AwsError::Throttled { .. })
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidAMIID.NotFound",
    "InvalidAMIID.Unavailable",
    "InvalidInstanceID.NotFound",
    "InvalidSnapshot.NotFound",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK operation error via its error metadata.
pub fn classify_sdk_error<E>(err: &SdkError<E>) -> AwsError
where
    SdkError<E>: ProvideErrorMetadata,
{
    let meta = ProvideErrorMetadata::meta(err);
    classify_aws_error(meta.code(), meta.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_throttled(), "Expected Throttled for code: {code}");
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn not_found_is_not_throttled() {
        let err = classify_aws_error(Some("InvalidAMIID.NotFound"), None);
        assert!(!err.is_throttled());
        assert!(err.is_not_found());
    }
}
