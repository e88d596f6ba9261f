use std::time::Duration;

use thiserror::Error;

use crate::analysis::stage::Stage;
use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;

/// Why a single stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Generation call failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Generation output is not valid JSON: {0}")]
    MalformedResponse(String),

    #[error("Generation output has the wrong shape: {0}")]
    ShapeMismatch(String),

    #[error("Stage exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

impl StageError {
    /// Stable error-kind code used in logs and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Extraction(e) => match e {
                ExtractionError::Fetch { .. } => "FETCH_ERROR",
                ExtractionError::EmptyJobText | ExtractionError::EmptyResumeText => {
                    "EXTRACTION_ERROR"
                }
                ExtractionError::NotFound(_) => "NOT_FOUND",
                ExtractionError::Parse(_) => "PARSE_ERROR",
            },
            StageError::Generation(_) => "GENERATION_ERROR",
            StageError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            StageError::ShapeMismatch(_) => "SHAPE_MISMATCH",
            StageError::Timeout(_) => "STAGE_TIMEOUT",
        }
    }

    /// Failures worth another attempt against a live generation service.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StageError::Generation(_) | StageError::MalformedResponse(_) | StageError::Timeout(_)
        )
    }
}

/// The single top-level failure of a pipeline run. No partial report exists.
#[derive(Debug, Error)]
#[error("Pipeline failed at {stage} after {attempts} attempt(s): {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub attempts: u32,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}
