//! Utilities for generating cache keys for question generations

use sha2::{Digest, Sha256};

use crate::service::assessment::prompts::QUESTION_SYSTEM_PROMPT;

/// Generate cache key hash for one generation call
///
/// The key is based on:
/// - model_id
/// - max_tokens
/// - prompt_version (hash of the system prompt)
/// - prompt
pub fn generate_generation_cache_key(model_id: &str, max_tokens: u64, prompt: &str) -> String {
    let prompt_version = hash_string(QUESTION_SYSTEM_PROMPT);

    let key_components = format!(
        "{}|{}|{}|{}",
        model_id,
        max_tokens,
        prompt_version,
        hash_string(prompt)
    );

    hash_string(&key_components)
}

/// Hash a string to a hex string using SHA256
fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}
