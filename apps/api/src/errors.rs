use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::error::{PipelineError, StageError};
use crate::extraction::ExtractionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload too large: {0}")]
    UploadTooLarge(String),

    #[error("API is disabled")]
    Unavailable,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::UploadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
                None,
            ),
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                self.to_string(),
                None,
            ),
            AppError::Pipeline(e) => {
                tracing::error!("Analysis failed: {e}");
                (
                    pipeline_status(&e.source),
                    e.kind(),
                    e.source.to_string(),
                    Some(e.stage),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "stage": stage
            }
        }));

        (status, body).into_response()
    }
}

fn pipeline_status(error: &StageError) -> StatusCode {
    match error {
        StageError::Extraction(ExtractionError::NotFound(_)) => StatusCode::NOT_FOUND,
        StageError::Extraction(ExtractionError::Fetch { .. }) => StatusCode::BAD_GATEWAY,
        StageError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StageError::Generation(_)
        | StageError::MalformedResponse(_)
        | StageError::ShapeMismatch(_) => StatusCode::BAD_GATEWAY,
        StageError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}
