//! Redis cache for raw question generations

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::service::cache_keys::generate_generation_cache_key;
use crate::service::llm::{GenerationError, TextGenerator};

// Environment variable names
const ENV_REDIS_HOST: &str = "SKILL_ASSESS_REDIS_HOST";
const ENV_REDIS_PORT: &str = "SKILL_ASSESS_REDIS_PORT";
const ENV_REDIS_PASSWORD: &str = "SKILL_ASSESS_REDIS_PASSWORD";
const ENV_REDIS_DB: &str = "SKILL_ASSESS_REDIS_DB";
const ENV_CACHE_TTL: &str = "SKILL_ASSESS_CACHE_TTL";

// Default values
const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
const DEFAULT_REDIS_PORT: &str = "6379";
const DEFAULT_REDIS_DB: &str = "0";
const DEFAULT_TTL_SECONDS: u64 = 24 * 60 * 60; // 1 day

const PREFIX_GENERATION: &str = "generation:";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache miss for key: {0}")]
    Miss(String),
}

/// Redis-based cache of generated text keyed by prompt hash
#[derive(Clone)]
pub struct GenerationCache {
    client: Client,
    ttl_seconds: u64,
}

impl GenerationCache {
    /// Create a new cache instance and verify connection
    ///
    /// Configuration via environment variables:
    /// - `SKILL_ASSESS_REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `SKILL_ASSESS_REDIS_PORT` - Redis port (default: 6379)
    /// - `SKILL_ASSESS_REDIS_PASSWORD` - Redis password (default: none)
    /// - `SKILL_ASSESS_REDIS_DB` - Redis database number (default: 0)
    /// - `SKILL_ASSESS_CACHE_TTL` - Cache TTL in seconds (default: 86400)
    pub async fn new() -> Result<Self, CacheError> {
        let host = env::var(ENV_REDIS_HOST).unwrap_or_else(|_| DEFAULT_REDIS_HOST.to_string());
        let port = env::var(ENV_REDIS_PORT).unwrap_or_else(|_| DEFAULT_REDIS_PORT.to_string());
        let password = env::var(ENV_REDIS_PASSWORD).ok();
        let db = env::var(ENV_REDIS_DB).unwrap_or_else(|_| DEFAULT_REDIS_DB.to_string());

        let ttl_seconds = env::var(ENV_CACHE_TTL)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        let redis_url = redis_url(&host, &port, password.as_deref(), &db);

        tracing::debug!(host = %host, port = %port, db = %db, "Connecting to Redis");

        let client = Client::open(redis_url)?;

        let cache = Self {
            client,
            ttl_seconds,
        };
        cache.ping().await?;

        tracing::info!(host = %host, port = %port, "Redis connection established");

        Ok(cache)
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    pub async fn get_generation(&self, key_hash: &str) -> Result<String, CacheError> {
        let full_key = format!("{}{}", PREFIX_GENERATION, key_hash);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let data: Option<String> = conn.get(&full_key).await?;

        match data {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| CacheError::Serialization(e.to_string()))
            }
            None => Err(CacheError::Miss(key_hash.to_string())),
        }
    }

    pub async fn set_generation(&self, key_hash: &str, raw: &str) -> Result<(), CacheError> {
        let full_key = format!("{}{}", PREFIX_GENERATION, key_hash);
        let json =
            serde_json::to_string(raw).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(&full_key, json, self.ttl_seconds).await?;

        tracing::debug!(key = %full_key, ttl = self.ttl_seconds, "Cached generation");
        Ok(())
    }
}

/// Build Redis URL: redis://[password@]host:port/db
fn redis_url(host: &str, port: &str, password: Option<&str>, db: &str) -> String {
    match password {
        Some(pwd) if !pwd.is_empty() => format!("redis://:{}@{}:{}/{}", pwd, host, port, db),
        _ => format!("redis://{}:{}/{}", host, port, db),
    }
}

/// Generator that answers repeated prompts from the cache
///
/// Cache failures are logged and fall through to the inner generator. Blank
/// outputs are never cached so a retry gets a fresh generation.
pub struct CachedGenerator {
    inner: Arc<dyn TextGenerator>,
    cache: GenerationCache,
}

impl CachedGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, cache: GenerationCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl TextGenerator for CachedGenerator {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn generate(&self, prompt: &str, max_tokens: u64) -> Result<String, GenerationError> {
        let key = generate_generation_cache_key(self.inner.model_id(), max_tokens, prompt);

        match self.cache.get_generation(&key).await {
            Ok(raw) => {
                tracing::debug!(key = %key, "Generation cache hit");
                return Ok(raw);
            }
            Err(CacheError::Miss(_)) => {
                tracing::debug!(key = %key, "Generation cache miss");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Generation cache read failed");
            }
        }

        let raw = self.inner.generate(prompt, max_tokens).await?;

        if !raw.trim().is_empty() {
            if let Err(e) = self.cache.set_generation(&key, &raw).await {
                tracing::warn!(key = %key, error = %e, "Failed to cache generation");
            }
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_url_with_and_without_password() {
        assert_eq!(
            redis_url("127.0.0.1", "6379", None, "0"),
            "redis://127.0.0.1:6379/0"
        );
        assert_eq!(
            redis_url("cache", "6380", Some("s3cret"), "2"),
            "redis://:s3cret@cache:6380/2"
        );
        assert_eq!(
            redis_url("cache", "6380", Some(""), "2"),
            "redis://cache:6380/2"
        );
    }
}
