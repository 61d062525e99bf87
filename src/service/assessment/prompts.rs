//! Prompts for follow-up question generation

use crate::model::{ApplicationProfile, SelfRating, TicketRecord};

/// System prompt sent with every question generation request
pub const QUESTION_SYSTEM_PROMPT: &str = r#"You are evaluating a support engineer's practical expertise on a business application.

Your role is to write technical validation questions grounded in the
application details and ticket history you are given.

You must:
- Ask about concrete troubleshooting, diagnosis and recovery steps
- Tie questions to the listed common issues and recent tickets
- Make questions harder when the self-ratings are high

Do not:
- Repeat the input text
- Number, label or explain the questions

Output one question per line and nothing else."#;

/// Bounds applied while rendering ticket history into a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    pub max_tickets: usize,
    /// Maximum characters of rendered ticket lines (newlines included)
    pub ticket_char_budget: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_tickets: 5,
            ticket_char_budget: 2000,
        }
    }
}

/// Build the question generation prompt
///
/// `tickets` must already be ordered most recent first. The caller is
/// responsible for resolving the profile; a missing profile never reaches here.
pub fn build_question_prompt(
    profile: &ApplicationProfile,
    tickets: &[TicketRecord],
    ratings: &[SelfRating],
    limits: &PromptLimits,
) -> String {
    let common_issues = if profile.common_issues.is_empty() {
        "No common issues recorded.".to_string()
    } else {
        profile.common_issues.join(", ")
    };

    let ticket_lines = render_tickets(tickets, limits);
    let recent_tickets = if ticket_lines.is_empty() {
        "No recent tickets available.".to_string()
    } else {
        ticket_lines.join("\n")
    };

    let rating_lines = ratings
        .iter()
        .map(|r| format!("- {}: {}/5", r.question_text, r.score))
        .collect::<Vec<_>>()
        .join("\n");
    let rating_values = ratings
        .iter()
        .map(|r| r.score.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Assess the engineer's expertise in the application {name}.

## Functionality
{functionality}

## Criticality
{criticality}

## Common Issues
{common_issues}

## Recent Tickets
{recent_tickets}

## Self-Ratings (1 = low, 5 = high)
{rating_lines}
Ratings: [{rating_values}]

Write technical validation questions that check whether these self-ratings are justified.
One question per line."#,
        name = profile.name,
        functionality = profile.functionality_summary,
        criticality = profile.criticality,
        common_issues = common_issues,
        recent_tickets = recent_tickets,
        rating_lines = rating_lines,
        rating_values = rating_values,
    )
}

/// Render the most recent tickets, one line each, within the character budget
///
/// Tickets past `max_tickets` are ignored. If the rendered text is still too
/// long, lines are dropped from the end (the oldest) until it fits. Ticket
/// order is never changed.
fn render_tickets(tickets: &[TicketRecord], limits: &PromptLimits) -> Vec<String> {
    let mut lines: Vec<String> = tickets
        .iter()
        .take(limits.max_tickets)
        .map(|t| format!("- {}", collapse_whitespace(&t.summary)))
        .collect();

    while !lines.is_empty() && rendered_len(&lines) > limits.ticket_char_budget {
        lines.pop();
    }

    lines
}

fn rendered_len(lines: &[String]) -> usize {
    let text: usize = lines.iter().map(|l| l.chars().count()).sum();
    text + lines.len().saturating_sub(1)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
