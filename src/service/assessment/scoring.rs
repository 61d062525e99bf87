//! Answer grading

use crate::model::ScoreResult;

/// Answers accepted as correct, compared trimmed and case-insensitively
const ACCEPTED_ANSWERS: &[&str] = &["yes", "correct"];

/// Maps an answer set to a score; implementations must be deterministic
pub trait GradingStrategy: Send + Sync {
    fn score(&self, answers: &[String]) -> ScoreResult;
}

/// Placeholder policy: an answer is correct iff it reads "yes" or "correct"
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl GradingStrategy for KeywordScorer {
    fn score(&self, answers: &[String]) -> ScoreResult {
        let correct = answers.iter().filter(|a| is_accepted(a)).count();
        ScoreResult::new(count_u32(correct), count_u32(answers.len()))
    }
}

fn is_accepted(answer: &str) -> bool {
    let normalized = answer.trim().to_lowercase();
    ACCEPTED_ANSWERS.contains(&normalized.as_str())
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_answers_have_no_percentage() {
        let result = KeywordScorer.score(&[]);
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.total_count, 0);
        assert_eq!(result.percentage, None);
    }

    #[test]
    fn test_half_correct() {
        let result = KeywordScorer.score(&answers(&["yes", "no"]));
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.total_count, 2);
        assert_eq!(result.percentage, Some(50.0));
    }

    #[test]
    fn test_match_is_trimmed_and_case_insensitive() {
        let result = KeywordScorer.score(&answers(&["  YES ", "Correct", "correct!", "yes please"]));
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total_count, 4);
        assert_eq!(result.percentage, Some(50.0));
    }

    #[test]
    fn test_all_wrong_is_zero_not_none() {
        let result = KeywordScorer.score(&answers(&["no", ""]));
        assert_eq!(result.percentage, Some(0.0));
    }
}
