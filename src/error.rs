//! Error types for uploading and resolving canned responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while storing or resolving canned responses.
#[derive(Debug, Error)]
pub enum CannedError {
    /// The upload payload is not a well-formed response batch.
    #[error("malformed responses payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid empty endpoint specified")]
    MissingEndpoint,

    #[error("invalid empty method specified")]
    MissingMethod,

    /// Empty, non-numeric or out of range status code.
    #[error("invalid status code specified {code:?}")]
    InvalidStatusCode { code: String },

    #[error("invalid timeout specified {timeout:?}")]
    InvalidDelay { timeout: String },

    #[error("invalid regex specified {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// No registered response matches the request.
    #[error("unable to find a response for {method}:{path}")]
    NotFound { method: String, path: String },

    /// The upload body could not be read or the multipart field is missing.
    #[error("failed to read upload: {0}")]
    UploadTransport(String),

    #[error("failed to read responses file {}: {source}", .path.display())]
    ResponsesFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CannedError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            CannedError::NotFound { .. } => StatusCode::NOT_FOUND,
            CannedError::ResponsesFile { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable tag for the error.
    pub fn kind(&self) -> &'static str {
        match self {
            CannedError::Decode(_) => "decode_error",
            CannedError::MissingEndpoint => "missing_endpoint",
            CannedError::MissingMethod => "missing_method",
            CannedError::InvalidStatusCode { .. } => "invalid_status_code",
            CannedError::InvalidDelay { .. } => "invalid_delay",
            CannedError::InvalidPattern { .. } => "invalid_pattern",
            CannedError::NotFound { .. } => "not_found",
            CannedError::UploadTransport(_) => "upload_transport_error",
            CannedError::ResponsesFile { .. } => "responses_file_error",
        }
    }
}

impl IntoResponse for CannedError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
