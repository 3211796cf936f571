//! Errors surfaced to HTTP clients.
//!
//! Every error renders as `{"error": "<message>"}`. Model, validation,
//! input-type and computation failures are ordinary responses (200) so
//! callers only have to look at the body. Bodies that are not JSON at all
//! keep the extractor's status code.
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::embedder::EmbedderError;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// A required field was missing or empty.
    #[error("{0}")]
    Validation(&'static str),

    /// Well-formed JSON whose fields have the wrong types.
    #[error("{0}")]
    InvalidInput(String),

    /// Embedding or similarity computation failed.
    #[error("{0}")]
    Computation(String),

    #[error("{message}")]
    MalformedBody { status: StatusCode, message: String },
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody { status, .. } => *status,
            _ => StatusCode::OK,
        }
    }
}

impl From<EmbedderError> for ApiError {
    fn from(e: EmbedderError) -> Self {
        Self::Computation(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => Self::InvalidInput(e.body_text()),
            other => Self::MalformedBody {
                status: other.status(),
                message: other.body_text(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Computation(msg) => warn!("computation failed: {msg}"),
            Self::InvalidInput(msg) => warn!("invalid input: {msg}"),
            _ => {}
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::ModelNotLoaded.to_string(), "Model not loaded");
        assert_eq!(
            ApiError::Validation("text is required").to_string(),
            "text is required"
        );
        let e: ApiError = EmbedderError::InferenceFailed("boom".to_string()).into();
        assert_eq!(e.to_string(), "inference failed: boom");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::ModelNotLoaded.status(), StatusCode::OK);
        assert_eq!(
            ApiError::Computation("x".to_string()).status(),
            StatusCode::OK
        );
        assert_eq!(
            ApiError::InvalidInput("x".to_string()).status(),
            StatusCode::OK
        );
        let malformed = ApiError::MalformedBody {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "bad".to_string(),
        };
        assert_eq!(malformed.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
