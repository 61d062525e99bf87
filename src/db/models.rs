//! Database models for assessment sessions

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::model::{AssessmentSession, ScoreResult, SelfRating, SessionState};

/// Database representation of an assessment session
#[derive(Debug, Clone, FromRow)]
pub struct AssessmentRow {
    pub id: String,
    pub user_name: String,
    pub application: String,
    pub self_ratings: String,
    pub generated_questions: String,
    pub answers: String,
    pub correct_count: Option<i64>,
    pub total_count: Option<i64>,
    pub percentage: Option<f64>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssessmentRow {
    /// Convert database row to domain model
    pub fn into_domain(self) -> Result<AssessmentSession, String> {
        let id = Uuid::parse_str(&self.id).map_err(|e| format!("Invalid session id: {}", e))?;

        let self_ratings: Vec<SelfRating> = serde_json::from_str(&self.self_ratings)
            .map_err(|e| format!("Invalid self_ratings for {}: {}", self.id, e))?;
        let generated_questions: Vec<String> = serde_json::from_str(&self.generated_questions)
            .map_err(|e| format!("Invalid generated_questions for {}: {}", self.id, e))?;
        let answers: Vec<String> = serde_json::from_str(&self.answers)
            .map_err(|e| format!("Invalid answers for {}: {}", self.id, e))?;

        let state: SessionState = self.state.parse()?;

        let score = match (self.correct_count, self.total_count) {
            (Some(correct), Some(total)) => Some(ScoreResult {
                correct_count: u32::try_from(correct)
                    .map_err(|e| format!("Invalid correct_count for {}: {}", self.id, e))?,
                total_count: u32::try_from(total)
                    .map_err(|e| format!("Invalid total_count for {}: {}", self.id, e))?,
                percentage: self.percentage,
            }),
            _ => None,
        };

        Ok(AssessmentSession {
            id,
            user: self.user_name,
            application: self.application,
            self_ratings,
            generated_questions,
            answers,
            score,
            state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Column values of a session ready to bind into an upsert
pub struct AssessmentColumns {
    pub id: String,
    pub self_ratings: String,
    pub generated_questions: String,
    pub answers: String,
    pub correct_count: Option<i64>,
    pub total_count: Option<i64>,
    pub percentage: Option<f64>,
}

impl AssessmentColumns {
    pub fn from_session(session: &AssessmentSession) -> Result<Self, String> {
        Ok(Self {
            id: session.id().to_string(),
            self_ratings: to_json(session.self_ratings())?,
            generated_questions: to_json(session.generated_questions())?,
            answers: to_json(session.answers())?,
            correct_count: session.score_result().map(|s| i64::from(s.correct_count)),
            total_count: session.score_result().map(|s| i64::from(s.total_count)),
            percentage: session.score_result().and_then(|s| s.percentage),
        })
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Failed to encode column: {}", e))
}
