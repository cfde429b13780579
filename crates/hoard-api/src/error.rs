//! Mapping of domain errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hoard_core::Error;
use tracing::error;

/// Handler error. Bodies are plain text.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Cache(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Cache(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Cache(e) if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(msg) => msg,
            Self::Cache(e) if e.is_invalid_input() => e.to_string(),
            Self::Cache(Error::CompressionFailed(reason)) => {
                error!(reason = %reason, "Compression failed");
                "Failed to compress the file. Sorry!".to_string()
            }
            Self::Cache(e) => {
                error!(error = %e, "Request failed");
                "An error occurred.".to_string()
            }
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(Error::CompressionFailed("exit 2".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(Error::InvalidArtifactName("..".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadRequest("missing".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::Storage("timeout".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
