//! Assessment session aggregate and its value types
//!
//! Fields are crate-visible only. Outside of test fixtures a session changes
//! through the transition methods in `service::assessment::session`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type SessionId = Uuid;

/// Lifecycle states, declared in their only legal order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    SelfRated,
    QuestionsGenerated,
    Answered,
    Scored,
    Stored,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::SelfRated => "self_rated",
            SessionState::QuestionsGenerated => "questions_generated",
            SessionState::Answered => "answered",
            SessionState::Scored => "scored",
            SessionState::Stored => "stored",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(SessionState::Created),
            "self_rated" => Ok(SessionState::SelfRated),
            "questions_generated" => Ok(SessionState::QuestionsGenerated),
            "answered" => Ok(SessionState::Answered),
            "scored" => Ok(SessionState::Scored),
            "stored" => Ok(SessionState::Stored),
            other => Err(format!("Unknown session state: {}", other)),
        }
    }
}

/// The five operations that move a session forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SubmitSelfRatings,
    GenerateQuestions,
    SubmitAnswers,
    Score,
    Persist,
}

impl Transition {
    /// State a session must be in for this transition to apply
    pub fn required_state(&self) -> SessionState {
        match self {
            Transition::SubmitSelfRatings => SessionState::Created,
            Transition::GenerateQuestions => SessionState::SelfRated,
            Transition::SubmitAnswers => SessionState::QuestionsGenerated,
            Transition::Score => SessionState::Answered,
            Transition::Persist => SessionState::Scored,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::SubmitSelfRatings => "submit_self_ratings",
            Transition::GenerateQuestions => "generate_questions",
            Transition::SubmitAnswers => "submit_answers",
            Transition::Score => "score",
            Transition::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// A user's 1-5 confidence score against one static question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelfRating {
    pub question_text: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub total_count: u32,
    /// `None` when there were no answers to grade
    pub percentage: Option<f64>,
}

impl ScoreResult {
    pub fn new(correct_count: u32, total_count: u32) -> Self {
        let percentage = if total_count == 0 {
            None
        } else {
            Some(100.0 * f64::from(correct_count) / f64::from(total_count))
        };

        Self {
            correct_count,
            total_count,
            percentage,
        }
    }
}

/// One user's pass through the assessment lifecycle for one application
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AssessmentSession {
    pub(crate) id: Uuid,
    pub(crate) user: String,
    pub(crate) application: String,
    pub(crate) self_ratings: Vec<SelfRating>,
    pub(crate) generated_questions: Vec<String>,
    pub(crate) answers: Vec<String>,
    pub(crate) score: Option<ScoreResult>,
    pub(crate) state: SessionState,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl AssessmentSession {
    /// Start a fresh session in the `Created` state with a new identity
    pub fn new(user: impl Into<String>, application: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            application: application.into(),
            self_ratings: Vec::new(),
            generated_questions: Vec::new(),
            answers: Vec::new(),
            score: None,
            state: SessionState::Created,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn self_ratings(&self) -> &[SelfRating] {
        &self.self_ratings
    }

    pub fn generated_questions(&self) -> &[String] {
        &self.generated_questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn score_result(&self) -> Option<&ScoreResult> {
        self.score.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Identity and current state of a session, returned after a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub state: SessionState,
}

impl From<&AssessmentSession> for SessionStatus {
    fn from(session: &AssessmentSession) -> Self {
        Self {
            session_id: session.id,
            state: session.state,
        }
    }
}

/// Row of the manager view: one stored session and its result
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ManagerViewRow {
    pub session_id: Uuid,
    pub user: String,
    pub application: String,
    pub percentage: Option<f64>,
    pub correct_count: u32,
    pub total_count: u32,
    pub completed_at: DateTime<Utc>,
}

impl From<&AssessmentSession> for ManagerViewRow {
    fn from(session: &AssessmentSession) -> Self {
        let (correct_count, total_count, percentage) = session
            .score_result()
            .map(|s| (s.correct_count, s.total_count, s.percentage))
            .unwrap_or((0, 0, None));

        Self {
            session_id: session.id(),
            user: session.user().to_string(),
            application: session.application().to_string(),
            percentage,
            correct_count,
            total_count,
            completed_at: session.updated_at(),
        }
    }
}
