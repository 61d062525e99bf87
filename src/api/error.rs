//! Unified API error handling
//!
//! This module provides a consistent error response format across all API endpoints.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::service::assessment::AssessmentError;

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Whether repeating the same request may succeed
    pub retryable: bool,
    /// Unique request ID for tracing
    pub request_id: String,
}

/// Unified API error type
///
/// All API endpoints should return `Result<T, ApiError>` for consistent error handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Malformed request body or path (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failure reported by the assessment engine
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
}

impl ApiError {
    fn error_type(&self) -> &'static str {
        let err = match self {
            ApiError::BadRequest(_) => return "bad_request",
            ApiError::Assessment(err) => err,
        };

        match err {
            AssessmentError::Validation(_) => "bad_request",
            AssessmentError::InvalidStateTransition { .. } => "invalid_state_transition",
            AssessmentError::ApplicationNotFound(_) | AssessmentError::ProfileNotFound(_) => {
                "application_not_found"
            }
            AssessmentError::SessionNotFound(_) => "session_not_found",
            AssessmentError::SessionBusy(_) => "session_busy",
            AssessmentError::EmptyGeneration | AssessmentError::Generation(_) => {
                "generation_failed"
            }
            AssessmentError::GenerationTimeout(_) => "generation_timeout",
            AssessmentError::RepositoryWrite(_) | AssessmentError::Repository(_) => {
                "database_error"
            }
            AssessmentError::DataSource(_) => "internal_error",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::BadRequest(_) => false,
            ApiError::Assessment(err) => err.is_retryable(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        let err = match self {
            ApiError::BadRequest(_) => return StatusCode::BAD_REQUEST,
            ApiError::Assessment(err) => err,
        };

        match err {
            AssessmentError::Validation(_) => StatusCode::BAD_REQUEST,
            AssessmentError::ApplicationNotFound(_)
            | AssessmentError::ProfileNotFound(_)
            | AssessmentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AssessmentError::InvalidStateTransition { .. } | AssessmentError::SessionBusy(_) => {
                StatusCode::CONFLICT
            }
            AssessmentError::EmptyGeneration | AssessmentError::Generation(_) => {
                StatusCode::BAD_GATEWAY
            }
            AssessmentError::GenerationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AssessmentError::RepositoryWrite(_)
            | AssessmentError::Repository(_)
            | AssessmentError::DataSource(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();

        if status.is_server_error() {
            tracing::error!(
                error_type = error_type,
                status = status.as_u16(),
                message = %self,
                "API error"
            );
        } else {
            tracing::warn!(
                error_type = error_type,
                status = status.as_u16(),
                message = %self,
                "API error"
            );
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            retryable: self.is_retryable(),
            request_id: Uuid::new_v4().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SessionState, Transition};
    use std::time::Duration;

    fn status_of(err: AssessmentError) -> (StatusCode, bool) {
        let api: ApiError = err.into();
        (api.status_code(), api.is_retryable())
    }

    #[test]
    fn test_assessment_errors_map_to_status_codes() {
        let id = Uuid::new_v4();

        assert_eq!(
            status_of(AssessmentError::Validation("bad".into())),
            (StatusCode::BAD_REQUEST, false)
        );
        assert_eq!(
            status_of(AssessmentError::InvalidStateTransition {
                current: SessionState::Stored,
                attempted: Transition::Score,
            }),
            (StatusCode::CONFLICT, false)
        );
        assert_eq!(
            status_of(AssessmentError::SessionBusy(id)),
            (StatusCode::CONFLICT, true)
        );
        assert_eq!(
            status_of(AssessmentError::ApplicationNotFound("App9".into())),
            (StatusCode::NOT_FOUND, false)
        );
        assert_eq!(
            status_of(AssessmentError::SessionNotFound(id)),
            (StatusCode::NOT_FOUND, false)
        );
        assert_eq!(
            status_of(AssessmentError::EmptyGeneration),
            (StatusCode::BAD_GATEWAY, true)
        );
        assert_eq!(
            status_of(AssessmentError::GenerationTimeout(Duration::from_secs(60))),
            (StatusCode::GATEWAY_TIMEOUT, true)
        );
        assert_eq!(
            status_of(AssessmentError::RepositoryWrite("disk full".into())),
            (StatusCode::INTERNAL_SERVER_ERROR, false)
        );
    }

    #[test]
    fn test_retryable_flag_follows_engine_policy() {
        let id = Uuid::new_v4();
        for err in [
            AssessmentError::SessionBusy(id),
            AssessmentError::EmptyGeneration,
            AssessmentError::Generation("rate limited".into()),
            AssessmentError::GenerationTimeout(Duration::from_secs(1)),
            AssessmentError::Validation("bad".into()),
            AssessmentError::SessionNotFound(id),
            AssessmentError::DataSource("unreadable".into()),
        ] {
            let expected = err.is_retryable();
            assert_eq!(ApiError::from(err).is_retryable(), expected);
        }
        assert!(!ApiError::BadRequest("not json".into()).is_retryable());
    }

    #[test]
    fn test_invalid_state_message_names_states() {
        let api: ApiError = AssessmentError::InvalidStateTransition {
            current: SessionState::SelfRated,
            attempted: Transition::SubmitAnswers,
        }
        .into();
        assert_eq!(
            api.to_string(),
            "Cannot submit_answers while session is self_rated"
        );
    }
}
