//! Validation of user-supplied ratings and answers
//!
//! Out-of-range ratings are rejected outright; nothing here clamps or
//! rewrites input.

use crate::service::assessment::AssessmentError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Result of input validation
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the input passed validation
    pub is_valid: bool,
    /// Problems that make the input unacceptable
    pub errors: Vec<String>,
    /// Accepted but worth noting in the logs
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a new validation result with no issues
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Turn into a `Result`, returning the warnings when valid
    pub fn into_result(self) -> Result<Vec<String>, AssessmentError> {
        if self.is_valid {
            Ok(self.warnings)
        } else {
            Err(AssessmentError::Validation(self.errors.join("; ")))
        }
    }
}

/// Validate a self-assessment submission
///
/// Checks:
/// 1. User and application are present
/// 2. Exactly one rating per static question
/// 3. Every rating is within [1, 5]
pub fn validate_self_assessment(
    user: &str,
    application: &str,
    ratings: &[i64],
    static_questions: &[String],
) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if user.trim().is_empty() {
        result.add_error("User is required".to_string());
    }

    if application.trim().is_empty() {
        result.add_error("Application is required".to_string());
    }

    if ratings.len() != static_questions.len() {
        result.add_error(format!(
            "Expected {} ratings (one per static question), got {}",
            static_questions.len(),
            ratings.len()
        ));
    }

    for (i, rating) in ratings.iter().enumerate() {
        if !(MIN_RATING..=MAX_RATING).contains(rating) {
            result.add_error(format!(
                "Rating {} is {}, must be between {} and {}",
                i + 1,
                rating,
                MIN_RATING,
                MAX_RATING
            ));
        }
    }

    if result.is_valid && ratings.iter().all(|r| *r == MAX_RATING) {
        result.add_warning("Every self-rating is at the maximum".to_string());
    }

    result
}

/// Validate answers against the generated questions they respond to
pub fn validate_answers(answers: &[String], questions: &[String]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if answers.len() != questions.len() {
        result.add_error(format!(
            "Expected {} answers (one per generated question), got {}",
            questions.len(),
            answers.len()
        ));
        return result;
    }

    for (i, answer) in answers.iter().enumerate() {
        if answer.trim().is_empty() {
            result.add_warning(format!(
                "Answer {} is blank and will be graded as incorrect",
                i + 1
            ));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_questions() -> Vec<String> {
        (1..=5).map(|i| format!("Question {}", i)).collect()
    }

    #[test]
    fn test_valid_ratings() {
        let result = validate_self_assessment("alice", "App1", &[3, 4, 2, 5, 3], &static_questions());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_sixth_rating_rejected() {
        let result =
            validate_self_assessment("alice", "App1", &[3, 4, 2, 5, 3, 1], &static_questions());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Expected 5 ratings"));
    }

    #[test]
    fn test_out_of_range_rejected_not_clamped() {
        for bad in [-1, 0, 6, 42] {
            let result =
                validate_self_assessment("alice", "App1", &[3, bad, 2, 5, 3], &static_questions());
            assert!(!result.is_valid, "rating {} should be rejected", bad);
            assert!(result.errors.iter().any(|e| e.contains("Rating 2")));
        }
    }

    #[test]
    fn test_missing_user_and_application() {
        let result = validate_self_assessment(" ", "", &[3, 3, 3, 3, 3], &static_questions());
        assert_eq!(result.errors.len(), 2);
        let err = result.into_result().unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(ref msg) if msg.contains("User is required")));
    }

    #[test]
    fn test_all_max_ratings_warns() {
        let result = validate_self_assessment("alice", "App1", &[5, 5, 5, 5, 5], &static_questions());
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_answer_count_must_match_questions() {
        let questions = vec!["Q1?".to_string(), "Q2?".to_string()];
        let result = validate_answers(&["yes".to_string()], &questions);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Expected 2 answers"));
    }

    #[test]
    fn test_blank_answer_only_warns() {
        let questions = vec!["Q1?".to_string(), "Q2?".to_string()];
        let result = validate_answers(&["yes".to_string(), "  ".to_string()], &questions);
        assert!(result.is_valid);
        assert!(result.warnings[0].contains("Answer 2 is blank"));
    }
}
