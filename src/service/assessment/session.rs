//! Session state machine
//!
//! Every transition checks its precondition state first and mutates the
//! session only after all fallible work has succeeded, so a failed call
//! leaves the session exactly as it was.

use chrono::Utc;

use crate::db::repository::AssessmentStore;
use crate::model::{
    ApplicationProfile, AssessmentSession, ScoreResult, SelfRating, SessionState, TicketRecord,
    Transition,
};
use crate::service::assessment::AssessmentError;
use crate::service::assessment::prompts::{PromptLimits, build_question_prompt};
use crate::service::assessment::scoring::GradingStrategy;
use crate::service::assessment::synthesis::QuestionSynthesizer;
use crate::service::assessment::validation::{MAX_RATING, MIN_RATING, validate_answers};

impl AssessmentSession {
    pub(crate) fn ensure_state(&self, attempted: Transition) -> Result<(), AssessmentError> {
        if self.state == attempted.required_state() {
            Ok(())
        } else {
            Err(AssessmentError::InvalidStateTransition {
                current: self.state,
                attempted,
            })
        }
    }

    fn advance(&mut self, next: SessionState) {
        self.state = next;
        self.updated_at = Utc::now();
    }

    pub fn submit_self_ratings(&mut self, ratings: Vec<SelfRating>) -> Result<(), AssessmentError> {
        self.ensure_state(Transition::SubmitSelfRatings)?;

        if ratings.is_empty() {
            return Err(AssessmentError::Validation(
                "At least one self-rating is required".to_string(),
            ));
        }

        if let Some(bad) = ratings
            .iter()
            .find(|r| !(MIN_RATING..=MAX_RATING).contains(&i64::from(r.score)))
        {
            return Err(AssessmentError::Validation(format!(
                "Rating for '{}' is {}, must be between {} and {}",
                bad.question_text, bad.score, MIN_RATING, MAX_RATING
            )));
        }

        self.self_ratings = ratings;
        self.advance(SessionState::SelfRated);
        Ok(())
    }

    pub async fn generate_questions(
        &mut self,
        synthesizer: &QuestionSynthesizer,
        profile: &ApplicationProfile,
        tickets: &[TicketRecord],
        limits: &PromptLimits,
        max_questions: usize,
    ) -> Result<(), AssessmentError> {
        self.ensure_state(Transition::GenerateQuestions)?;

        if profile.name != self.application {
            return Err(AssessmentError::Validation(format!(
                "Profile '{}' does not match session application '{}'",
                profile.name, self.application
            )));
        }

        let prompt = build_question_prompt(profile, tickets, &self.self_ratings, limits);
        let questions = synthesizer.synthesize(&prompt, max_questions).await?;

        tracing::info!(
            session_id = %self.id,
            application = %self.application,
            question_count = questions.len(),
            "Generated follow-up questions"
        );

        self.generated_questions = questions;
        self.advance(SessionState::QuestionsGenerated);
        Ok(())
    }

    /// Adopt a configured question bank in place of generated questions
    pub fn adopt_fallback_questions(
        &mut self,
        bank: &[String],
        max_questions: usize,
    ) -> Result<(), AssessmentError> {
        self.ensure_state(Transition::GenerateQuestions)?;

        let questions: Vec<String> = bank
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .take(max_questions)
            .map(str::to_string)
            .collect();

        if questions.is_empty() {
            return Err(AssessmentError::EmptyGeneration);
        }

        tracing::warn!(
            session_id = %self.id,
            application = %self.application,
            question_count = questions.len(),
            "Using fallback questions"
        );

        self.generated_questions = questions;
        self.advance(SessionState::QuestionsGenerated);
        Ok(())
    }

    pub fn submit_answers(&mut self, answers: Vec<String>) -> Result<(), AssessmentError> {
        self.ensure_state(Transition::SubmitAnswers)?;

        let warnings = validate_answers(&answers, &self.generated_questions).into_result()?;
        for warning in &warnings {
            tracing::debug!(session_id = %self.id, warning = %warning, "Answer warning");
        }

        self.answers = answers;
        self.advance(SessionState::Answered);
        Ok(())
    }

    pub fn score(&mut self, grader: &dyn GradingStrategy) -> Result<ScoreResult, AssessmentError> {
        self.ensure_state(Transition::Score)?;

        let result = grader.score(&self.answers);
        self.score = Some(result.clone());
        self.advance(SessionState::Scored);
        Ok(result)
    }

    /// Write the session to the store as final
    ///
    /// The stored record already carries the `Stored` state; the in-memory
    /// session only advances once the write succeeded.
    pub async fn persist(&mut self, store: &dyn AssessmentStore) -> Result<(), AssessmentError> {
        self.ensure_state(Transition::Persist)?;

        let mut record = self.clone();
        record.advance(SessionState::Stored);

        store.save(&record).await.map_err(|e| {
            tracing::error!(session_id = %self.id, error = %e, "Failed to persist session");
            AssessmentError::RepositoryWrite(e.to_string())
        })?;

        *self = record;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Criticality;
    use crate::service::assessment::scoring::KeywordScorer;
    use crate::service::assessment::testing::{FailingStore, ScriptedGenerator};
    use std::sync::Arc;
    use std::time::Duration;

    fn ratings(scores: &[u8]) -> Vec<SelfRating> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| SelfRating {
                question_text: format!("Static question {}", i + 1),
                score: *s,
            })
            .collect()
    }

    fn profile() -> ApplicationProfile {
        ApplicationProfile {
            name: "App1".to_string(),
            functionality_summary: "Handles customer orders.".to_string(),
            criticality: Criticality::High,
            common_issues: vec!["Order processing failures".to_string()],
        }
    }

    fn synthesizer(raw: &str) -> QuestionSynthesizer {
        QuestionSynthesizer::new(
            Arc::new(ScriptedGenerator::returning(raw)),
            200,
            Duration::from_secs(5),
        )
    }

    async fn answered_session() -> AssessmentSession {
        let mut session = AssessmentSession::new("alice", "App1");
        session.submit_self_ratings(ratings(&[3, 4, 2, 5, 3])).unwrap();
        session
            .generate_questions(
                &synthesizer("Q1?\nQ2?"),
                &profile(),
                &[],
                &PromptLimits::default(),
                5,
            )
            .await
            .unwrap();
        session
            .submit_answers(vec!["yes".to_string(), "no".to_string()])
            .unwrap();
        session
    }

    #[test]
    fn test_out_of_order_transition_keeps_state() {
        let mut session = AssessmentSession::new("alice", "App1");
        let before = session.clone();

        let err = session
            .submit_answers(vec!["yes".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::InvalidStateTransition {
                current: SessionState::Created,
                attempted: Transition::SubmitAnswers,
            }
        ));

        let err = session.score(&KeywordScorer).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidStateTransition { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn test_self_ratings_cannot_be_submitted_twice() {
        let mut session = AssessmentSession::new("alice", "App1");
        session.submit_self_ratings(ratings(&[3, 3, 3, 3, 3])).unwrap();

        let err = session.submit_self_ratings(ratings(&[1, 1, 1, 1, 1])).unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::InvalidStateTransition {
                current: SessionState::SelfRated,
                ..
            }
        ));
        assert!(session.self_ratings().iter().all(|r| r.score == 3));
    }

    #[test]
    fn test_out_of_range_self_rating_rejected() {
        let mut session = AssessmentSession::new("alice", "App1");
        let err = session.submit_self_ratings(ratings(&[3, 0, 2])).unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(_)));
        assert_eq!(session.state(), SessionState::Created);
        assert!(session.self_ratings().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_profile_rejected() {
        let mut session = AssessmentSession::new("alice", "App2");
        session.submit_self_ratings(ratings(&[3, 3, 3, 3, 3])).unwrap();

        let err = session
            .generate_questions(&synthesizer("Q1?"), &profile(), &[], &PromptLimits::default(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AssessmentError::Validation(_)));
        assert_eq!(session.state(), SessionState::SelfRated);
    }

    #[tokio::test]
    async fn test_answer_count_mismatch_keeps_questions_generated() {
        let mut session = AssessmentSession::new("alice", "App1");
        session.submit_self_ratings(ratings(&[3, 3, 3, 3, 3])).unwrap();
        session
            .generate_questions(&synthesizer("Q1?\nQ2?"), &profile(), &[], &PromptLimits::default(), 5)
            .await
            .unwrap();

        let err = session.submit_answers(vec!["yes".to_string()]).unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(_)));
        assert_eq!(session.state(), SessionState::QuestionsGenerated);
        assert!(session.answers().is_empty());
    }

    #[tokio::test]
    async fn test_score_then_failed_persist_stays_scored() {
        let mut session = answered_session().await;
        let result = session.score(&KeywordScorer).unwrap();
        assert_eq!(result.percentage, Some(50.0));

        let err = session.persist(&FailingStore).await.unwrap_err();
        assert!(matches!(err, AssessmentError::RepositoryWrite(_)));
        assert_eq!(session.state(), SessionState::Scored);
        assert_eq!(session.score_result(), Some(&result));
    }

    #[test]
    fn test_fallback_bank_is_trimmed_and_truncated() {
        let mut session = AssessmentSession::new("alice", "App1");
        session.submit_self_ratings(ratings(&[3, 3, 3, 3, 3])).unwrap();

        let bank = vec![
            "  General question one?  ".to_string(),
            String::new(),
            "General question two?".to_string(),
            "General question three?".to_string(),
        ];
        session.adopt_fallback_questions(&bank, 2).unwrap();

        assert_eq!(
            session.generated_questions(),
            ["General question one?", "General question two?"]
        );
        assert_eq!(session.state(), SessionState::QuestionsGenerated);
    }

    #[test]
    fn test_empty_fallback_bank_is_empty_generation() {
        let mut session = AssessmentSession::new("alice", "App1");
        session.submit_self_ratings(ratings(&[3, 3, 3, 3, 3])).unwrap();

        let err = session.adopt_fallback_questions(&[" ".to_string()], 5).unwrap_err();
        assert!(matches!(err, AssessmentError::EmptyGeneration));
        assert_eq!(session.state(), SessionState::SelfRated);
    }
}
