//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::repository::AssessmentRepository;
use crate::model::Config;
use crate::service::llm::DEFAULT_MODEL;
use crate::service::{
    AssessmentService, CachedGenerator, FileCatalog, GenerationCache, LlmClient, TextGenerator,
};

/// Environment variable for the question generation model
const ENV_QUESTION_MODEL: &str = "QUESTION_MODEL";

/// Application state containing all services and shared resources
pub struct AppState {
    /// Database connection pool
    pub db_pool: Arc<SqlitePool>,
    /// Redis cache (optional)
    pub cache: Option<GenerationCache>,
    /// Assessment lifecycle service
    pub assessment_service: Arc<AssessmentService>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Redis cache initialization (optional)
    /// 3. LLM client initialization (requires OPENAI_API_KEY)
    /// 4. Application catalog loading
    pub async fn new(config: Config) -> Result<Self, AppError> {
        config
            .assessment
            .validate()
            .map_err(AppError::InvalidConfig)?;

        let db_pool = crate::db::create_pool(&config.database_url)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // Optional - logs a warning if Redis is unavailable
        let cache = match GenerationCache::new().await {
            Ok(cache) => {
                tracing::info!("Redis cache enabled");
                Some(cache)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis cache unavailable, running without cache");
                None
            }
        };

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AppError::MissingConfig("OPENAI_API_KEY"))?;
        let model =
            std::env::var(ENV_QUESTION_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let llm_client = LlmClient::new(&api_key, model).map_err(AppError::InvalidConfig)?;
        let generator = Self::build_generator(llm_client, cache.clone());

        let catalog =
            FileCatalog::load(&config.data).map_err(|e| AppError::DataSource(e.to_string()))?;

        let repository = AssessmentRepository::new(db_pool.clone());

        let assessment_service = AssessmentService::new(
            Arc::new(catalog),
            generator,
            Arc::new(repository),
            config.assessment,
        );

        Ok(Self {
            db_pool: Arc::new(db_pool),
            cache,
            assessment_service: Arc::new(assessment_service),
        })
    }

    /// Wrap the LLM client with the generation cache when one is available
    fn build_generator(
        llm_client: LlmClient,
        cache: Option<GenerationCache>,
    ) -> Arc<dyn TextGenerator> {
        let llm: Arc<dyn TextGenerator> = Arc::new(llm_client);
        match cache {
            Some(cache) => Arc::new(CachedGenerator::new(llm, cache)),
            None => llm,
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Application or ticket data could not be loaded
    #[error("Failed to load application data: {0}")]
    DataSource(String),
}
