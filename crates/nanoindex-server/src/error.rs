use crate::types::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nanoindex_core::NanoIndexError;

/// Wraps `NanoIndexError` so handlers can return it directly and have axum
/// pick the right status code (spec.md §7's error-kind policy).
pub struct ApiError(pub NanoIndexError);

impl From<NanoIndexError> for ApiError {
    fn from(err: NanoIndexError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NanoIndexError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            NanoIndexError::Conflict(_) => StatusCode::CONFLICT,
            NanoIndexError::NotFound(_) => StatusCode::NOT_FOUND,
            NanoIndexError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            NanoIndexError::StorageFatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NanoIndexError::CorruptState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
