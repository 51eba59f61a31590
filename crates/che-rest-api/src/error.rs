//! Error types for the HTTP surface

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Result type for handler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for handler operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested workspace is not served here or does not exist
    #[error("{0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Assembly or cluster failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        // Return K8s-style Status response
        let body = serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": self.to_string(),
            "code": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<che_rest_common::Error> for Error {
    fn from(e: che_rest_common::Error) -> Self {
        match e {
            e if e.is_not_found() => Error::NotFound(e.to_string()),
            e @ che_rest_common::Error::Config { .. } => Error::Config(e.to_string()),
            e => Error::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (
                che_rest_common::Error::not_found("workspace", "nope"),
                StatusCode::NOT_FOUND,
            ),
            (
                che_rest_common::Error::malformed("devfile", "bad yaml"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                che_rest_common::Error::data_integrity("machine m1", "duplicate"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                che_rest_common::Error::config("missing"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (domain, expected) in cases {
            let response = Error::from(domain).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_not_found_keeps_message() {
        let err = Error::from(che_rest_common::Error::not_found("devfile", "no spec.devfile"));
        assert_eq!(err.to_string(), "devfile not found: no spec.devfile");
    }
}
