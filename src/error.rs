//! Error types shared across the service.

use chrono::NaiveDate;
use thiserror::Error;

/// Request-level failures. These are the only errors a caller observes.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("reference date {0} is out of the supported range")]
    DateOutOfRange(NaiveDate),
}

/// Failure of a single call to the band sampling service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SampleError {
    /// No usable image for the location and date (cloud cover, no pass).
    #[error("no image found: {0}")]
    NotFound(String),

    /// Transport, quota, auth or decoding failure.
    #[error("sampling service failure: {0}")]
    Service(String),
}

impl SampleError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub fn service(reason: impl Into<String>) -> Self {
        Self::Service(reason.into())
    }
}

impl From<reqwest::Error> for SampleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Service(format!("request timed out: {}", e))
        } else if e.is_connect() {
            Self::Service(format!("cannot connect to sampling service: {}", e))
        } else if e.is_decode() {
            Self::Service(format!("malformed response: {}", e))
        } else {
            Self::Service(format!("request failed: {}", e))
        }
    }
}

/// Problems with the service-account credential blob.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("service account JSON is not valid: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("service account JSON is missing '{0}'")]
    MissingField(&'static str),

    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SeriesError::InvalidDate("2024/01/01".to_string());
        assert_eq!(
            err.to_string(),
            "invalid date '2024/01/01', expected YYYY-MM-DD"
        );

        let err = SampleError::not_found("cloud cover");
        assert_eq!(err.to_string(), "no image found: cloud cover");
    }
}
