use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::data_api::DataApiError;

/// Step of a resolution that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ListVariants,
    FetchSegments,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ListVariants => f.write_str("list_variants"),
            Stage::FetchSegments => f.write_str("fetch_segments"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Transcripts are disabled for this video.")]
    TranscriptsDisabled,
    #[error("No transcript found for this video.")]
    NoTranscriptAvailable,
    #[error("An unexpected error occurred: {cause}")]
    Internal { stage: Stage, cause: String },
}

/// Errors surfaced by the HTTP layer, rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    DataApi(#[from] DataApiError),
    #[error("{0}")]
    InvalidQuery(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Resolve(ResolveError::TranscriptsDisabled)
            | ApiError::Resolve(ResolveError::NoTranscriptAvailable) => StatusCode::NOT_FOUND,
            ApiError::Resolve(ResolveError::Internal { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DataApi(DataApiError::NotImplemented(_)) => StatusCode::NOT_IMPLEMENTED,
            ApiError::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
