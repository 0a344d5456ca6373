use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::{SampleError, SeriesError};

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    InvalidDate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidDate(_) => "invalid_date",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream(_) => "upstream_failure",
        }
    }
}

impl From<SeriesError> for ApiError {
    fn from(e: SeriesError) -> Self {
        ApiError::InvalidDate(e.to_string())
    }
}

impl From<SampleError> for ApiError {
    fn from(e: SampleError) -> Self {
        match e {
            SampleError::NotFound(_) => ApiError::NotFound(e.to_string()),
            SampleError::Service(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.code(), "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from(SeriesError::InvalidDate("x".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(SampleError::not_found("cloudy"));
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(SampleError::service("quota"));
        assert_eq!(err.to_string(), "sampling service failure: quota");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
