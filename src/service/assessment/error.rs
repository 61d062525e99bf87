//! Error types for the assessment lifecycle

use std::time::Duration;

use thiserror::Error;

use crate::model::{SessionId, SessionState, Transition};
use crate::service::assessment::synthesis::SynthesisError;

/// Error type for assessment operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot {attempted} while session is {current}")]
    InvalidStateTransition {
        current: SessionState,
        attempted: Transition,
    },

    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("Application profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session {0} is busy with another transition")]
    SessionBusy(SessionId),

    #[error("Generation produced no usable questions")]
    EmptyGeneration,

    #[error("Generation timed out after {}s", .0.as_secs_f64())]
    GenerationTimeout(Duration),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Failed to store assessment: {0}")]
    RepositoryWrite(String),

    #[error("Failed to read assessments: {0}")]
    Repository(String),

    #[error("Data source error: {0}")]
    DataSource(String),
}

impl AssessmentError {
    /// Whether the same call may succeed if the caller tries again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssessmentError::EmptyGeneration
                | AssessmentError::GenerationTimeout(_)
                | AssessmentError::Generation(_)
                | AssessmentError::SessionBusy(_)
        )
    }
}

impl From<SynthesisError> for AssessmentError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::EmptyGeneration => AssessmentError::EmptyGeneration,
            SynthesisError::Timeout(after) => AssessmentError::GenerationTimeout(after),
            SynthesisError::Generation(e) => AssessmentError::Generation(e.to_string()),
        }
    }
}
