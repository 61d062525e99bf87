//! Question synthesis: one generation call, then parsing of untrusted output

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::service::llm::{GenerationError, TextGenerator};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SynthesisError {
    #[error("Generation produced no usable questions")]
    EmptyGeneration,

    #[error("Generation timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Turns a prompt into a list of questions using an injected generator
pub struct QuestionSynthesizer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u64,
    timeout: Duration,
}

impl QuestionSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_tokens: u64, timeout: Duration) -> Self {
        tracing::info!(
            model = %generator.model_id(),
            max_tokens = max_tokens,
            timeout_secs = timeout.as_secs_f64(),
            "Question synthesizer initialized"
        );

        Self {
            generator,
            max_tokens,
            timeout,
        }
    }

    /// Generate and parse at most `max_questions` questions for `prompt`
    ///
    /// Nothing is retried here; the caller decides what to do with an
    /// `EmptyGeneration` or `Timeout`.
    pub async fn synthesize(
        &self,
        prompt: &str,
        max_questions: usize,
    ) -> Result<Vec<String>, SynthesisError> {
        let start_time = Instant::now();
        let model = self.generator.model_id();

        tracing::debug!(
            model = %model,
            prompt_length = prompt.len(),
            max_questions = max_questions,
            "Initiating question generation"
        );

        let raw = match tokio::time::timeout(
            self.timeout,
            self.generator.generate(prompt, self.max_tokens),
        )
        .await
        {
            Ok(Ok(raw)) => {
                tracing::info!(
                    model = %model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    output_length = raw.len(),
                    "Question generation completed"
                );
                raw
            }
            Ok(Err(e)) => {
                tracing::error!(
                    model = %model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "Question generation failed"
                );
                return Err(SynthesisError::Generation(e));
            }
            Err(_) => {
                tracing::warn!(
                    model = %model,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Question generation timed out"
                );
                return Err(SynthesisError::Timeout(self.timeout));
            }
        };

        let questions = parse_questions(&raw, prompt, max_questions);
        if questions.is_empty() {
            tracing::warn!(
                model = %model,
                output_preview = raw.chars().take(100).collect::<String>(),
                "Generated output contained no usable questions"
            );
            return Err(SynthesisError::EmptyGeneration);
        }

        Ok(questions)
    }
}

/// Parse raw generated text into questions
///
/// Lines are trimmed, blanks dropped, lines that repeat a prompt line dropped,
/// and the rest truncated to `max_questions` in generation order. Duplicates
/// among the generated lines are kept.
pub fn parse_questions(raw: &str, prompt: &str, max_questions: usize) -> Vec<String> {
    let prompt_lines: HashSet<&str> = prompt
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !prompt_lines.contains(l))
        .take(max_questions)
        .map(str::to_string)
        .collect()
}
