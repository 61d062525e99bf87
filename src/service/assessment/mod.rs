//! Skill assessment engine
//!
//! Drives sessions through their lifecycle: self-ratings, generated follow-up
//! questions, answers, score and the final stored record. Every successful
//! transition is written to the repository before the call returns, so a
//! session survives a restart in whatever state it last reached.

use std::sync::Arc;

use crate::db::DbError;
use crate::db::repository::AssessmentStore;
use crate::model::{
    AssessmentSession, AssessmentSettings, ManagerViewRow, ScoreResult, SelfRating, SessionId,
    SessionState, SessionStatus, Transition,
};
use crate::service::assessment::prompts::PromptLimits;
use crate::service::assessment::registry::{SessionLease, SessionRegistry};
use crate::service::assessment::scoring::{GradingStrategy, KeywordScorer};
use crate::service::assessment::synthesis::QuestionSynthesizer;
use crate::service::assessment::validation::validate_self_assessment;
use crate::service::catalog::{ApplicationCatalog, CatalogError};
use crate::service::llm::TextGenerator;

pub mod error;
pub mod prompts;
pub mod registry;
pub mod scoring;
pub mod session;
pub mod synthesis;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use error::AssessmentError;

/// Service running skill verification sessions
pub struct AssessmentService {
    catalog: Arc<dyn ApplicationCatalog>,
    synthesizer: QuestionSynthesizer,
    scorer: Arc<dyn GradingStrategy>,
    repository: Arc<dyn AssessmentStore>,
    settings: AssessmentSettings,
    sessions: SessionRegistry,
}

impl AssessmentService {
    /// Creates a new assessment service
    ///
    /// The generator is used for every session; grading defaults to
    /// `KeywordScorer`.
    pub fn new(
        catalog: Arc<dyn ApplicationCatalog>,
        generator: Arc<dyn TextGenerator>,
        repository: Arc<dyn AssessmentStore>,
        settings: AssessmentSettings,
    ) -> Self {
        let synthesizer = QuestionSynthesizer::new(
            generator,
            settings.max_generation_tokens,
            settings.generation_timeout(),
        );

        tracing::info!(
            static_questions = settings.static_questions.len(),
            max_questions = settings.max_questions,
            fallback_on_empty = settings.fallback_on_empty,
            "Assessment service initialized"
        );

        Self {
            catalog,
            synthesizer,
            scorer: Arc::new(KeywordScorer),
            repository,
            settings,
            sessions: SessionRegistry::new(),
        }
    }

    /// Replace the grading strategy
    #[cfg(test)]
    pub fn with_scorer(mut self, scorer: Arc<dyn GradingStrategy>) -> Self {
        self.scorer = scorer;
        self
    }

    pub async fn list_applications(&self) -> Result<Vec<String>, AssessmentError> {
        self.catalog
            .list_applications()
            .await
            .map_err(|e| AssessmentError::DataSource(e.to_string()))
    }

    pub fn list_static_questions(&self) -> &[String] {
        &self.settings.static_questions
    }

    /// Start a session from one rating per static question
    pub async fn submit_self_assessment(
        &self,
        user: &str,
        application: &str,
        ratings: &[i64],
    ) -> Result<SessionStatus, AssessmentError> {
        let warnings = validate_self_assessment(
            user,
            application,
            ratings,
            &self.settings.static_questions,
        )
        .into_result()?;

        let user = user.trim();
        let application = application.trim();

        match self.catalog.lookup_application(application).await {
            Ok(_) => {}
            Err(CatalogError::NotFound(name)) => {
                return Err(AssessmentError::ApplicationNotFound(name));
            }
            Err(e) => return Err(AssessmentError::DataSource(e.to_string())),
        }

        let self_ratings = self
            .settings
            .static_questions
            .iter()
            .zip(ratings)
            .map(|(question, rating)| {
                let score = u8::try_from(*rating).map_err(|_| {
                    AssessmentError::Validation(format!("Rating {} is out of range", rating))
                })?;
                Ok(SelfRating {
                    question_text: question.clone(),
                    score,
                })
            })
            .collect::<Result<Vec<_>, AssessmentError>>()?;

        let mut session = AssessmentSession::new(user, application);
        session.submit_self_ratings(self_ratings)?;
        self.commit(&session).await?;

        for warning in &warnings {
            tracing::debug!(session_id = %session.id(), warning = %warning, "Self-assessment warning");
        }
        tracing::info!(
            session_id = %session.id(),
            user = %session.user(),
            application = %session.application(),
            "Self-assessment submitted"
        );

        Ok(SessionStatus::from(&session))
    }

    /// Generate follow-up questions for a self-rated session
    pub async fn request_generated_questions(
        &self,
        id: SessionId,
    ) -> Result<Vec<String>, AssessmentError> {
        let (_lease, mut session) = self.checkout(id).await?;
        session.ensure_state(Transition::GenerateQuestions)?;

        let profile = match self.catalog.lookup_application(session.application()).await {
            Ok(profile) => profile,
            Err(CatalogError::NotFound(name)) => return Err(AssessmentError::ProfileNotFound(name)),
            Err(e) => return Err(AssessmentError::DataSource(e.to_string())),
        };

        let tickets = self
            .catalog
            .recent_tickets(session.application(), self.settings.max_tickets)
            .await
            .map_err(|e| AssessmentError::DataSource(e.to_string()))?;

        let limits = PromptLimits {
            max_tickets: self.settings.max_tickets,
            ticket_char_budget: self.settings.ticket_char_budget,
        };
        let max_questions = self.settings.max_questions;

        match session
            .generate_questions(&self.synthesizer, &profile, &tickets, &limits, max_questions)
            .await
        {
            Ok(()) => {}
            Err(AssessmentError::EmptyGeneration) if self.settings.fallback_on_empty => {
                session.adopt_fallback_questions(&self.settings.fallback_questions, max_questions)?;
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Question generation failed");
                return Err(e);
            }
        }

        self.commit(&session).await?;
        Ok(session.generated_questions().to_vec())
    }

    pub async fn submit_answers(
        &self,
        id: SessionId,
        answers: Vec<String>,
    ) -> Result<SessionStatus, AssessmentError> {
        let (_lease, mut session) = self.checkout(id).await?;
        session.submit_answers(answers)?;
        self.commit(&session).await?;

        tracing::info!(session_id = %id, answers = session.answers().len(), "Answers submitted");

        Ok(SessionStatus::from(&session))
    }

    /// Score an answered session and store it
    ///
    /// A session left `Scored` by an earlier failed write keeps its score and
    /// only the write is retried.
    pub async fn finalize_score(&self, id: SessionId) -> Result<ScoreResult, AssessmentError> {
        let (_lease, mut session) = self.checkout(id).await?;

        let existing = match session.state() {
            SessionState::Scored => session.score_result().cloned(),
            _ => None,
        };

        let result = match existing {
            Some(existing) => {
                tracing::info!(session_id = %id, "Session already scored, retrying store");
                existing
            }
            None => {
                let result = session.score(self.scorer.as_ref())?;
                self.commit(&session).await?;
                result
            }
        };

        session.persist(self.repository.as_ref()).await?;

        tracing::info!(
            session_id = %id,
            correct = result.correct_count,
            total = result.total_count,
            "Assessment scored and stored"
        );

        Ok(result)
    }

    /// Last committed snapshot of a session
    pub async fn get_session(&self, id: SessionId) -> Result<AssessmentSession, AssessmentError> {
        self.load(id).await
    }

    /// All stored sessions in the order they were started
    pub async fn manager_view(&self) -> Result<Vec<ManagerViewRow>, AssessmentError> {
        let sessions = self
            .repository
            .list_all()
            .await
            .map_err(|e| AssessmentError::Repository(e.to_string()))?;

        Ok(sessions
            .iter()
            .filter(|s| s.state() == SessionState::Stored)
            .map(ManagerViewRow::from)
            .collect())
    }

    /// Lease a session and load its last committed state
    ///
    /// The lease is taken before loading, so the loaded copy cannot be
    /// overtaken by another transition while it is held.
    async fn checkout(
        &self,
        id: SessionId,
    ) -> Result<(SessionLease, AssessmentSession), AssessmentError> {
        let lease = self.sessions.try_acquire(id)?;
        let session = self.load(id).await?;
        Ok((lease, session))
    }

    async fn load(&self, id: SessionId) -> Result<AssessmentSession, AssessmentError> {
        match self.repository.get(id).await {
            Ok(session) => Ok(session),
            Err(DbError::NotFound(_)) => Err(AssessmentError::SessionNotFound(id)),
            Err(e) => Err(AssessmentError::Repository(e.to_string())),
        }
    }

    async fn commit(&self, session: &AssessmentSession) -> Result<(), AssessmentError> {
        self.repository.save(session).await.map_err(|e| {
            tracing::error!(
                session_id = %session.id(),
                state = %session.state(),
                error = %e,
                "Failed to save session"
            );
            AssessmentError::RepositoryWrite(e.to_string())
        })
    }
}
