//! Test doubles for the assessment engine

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::db::DbError;
use crate::db::repository::{AssessmentRepository, AssessmentStore};
use crate::db::{create_pool, init_schema};
use crate::model::{
    ApplicationProfile, AssessmentSession, Criticality, SessionId, SessionState, TicketRecord,
};
use crate::service::catalog::FileCatalog;
use crate::service::llm::{GenerationError, TextGenerator};

/// Generator that replies with fixed text, optionally after a delay
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn returning(raw: &str) -> Self {
        Self {
            reply: Ok(raw.to_string()),
            delay: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str, _max_tokens: u64) -> Result<String, GenerationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(GenerationError::Failed)
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl AssessmentStore for FailingStore {
    async fn save(&self, _session: &AssessmentSession) -> Result<(), DbError> {
        Err(DbError::Serialization("disk full".to_string()))
    }

    async fn list_all(&self) -> Result<Vec<AssessmentSession>, DbError> {
        Ok(Vec::new())
    }

    async fn get(&self, id: SessionId) -> Result<AssessmentSession, DbError> {
        Err(DbError::NotFound(id.to_string()))
    }
}

/// In-memory repository whose writes can be slowed down or refused
pub struct ScriptedStore {
    inner: Arc<AssessmentRepository>,
    save_delay: Option<Duration>,
    refused_state: Mutex<Option<SessionState>>,
}

impl ScriptedStore {
    pub async fn new() -> Self {
        Self {
            inner: memory_repository().await,
            save_delay: None,
            refused_state: Mutex::new(None),
        }
    }

    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = Some(delay);
        self
    }

    /// Fail every save of a session in `state`; `None` accepts all saves
    pub fn refuse_saves_in(&self, state: Option<SessionState>) {
        *self.refused_state.lock().unwrap() = state;
    }
}

#[async_trait]
impl AssessmentStore for ScriptedStore {
    async fn save(&self, session: &AssessmentSession) -> Result<(), DbError> {
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        let refused = *self.refused_state.lock().unwrap();
        if refused == Some(session.state()) {
            return Err(DbError::Serialization("disk full".to_string()));
        }
        self.inner.save(session).await
    }

    async fn list_all(&self) -> Result<Vec<AssessmentSession>, DbError> {
        self.inner.list_all().await
    }

    async fn get(&self, id: SessionId) -> Result<AssessmentSession, DbError> {
        self.inner.get(id).await
    }
}

pub fn app1_profile() -> ApplicationProfile {
    ApplicationProfile {
        name: "App1".to_string(),
        functionality_summary: "Handles customer orders and inventory management.".to_string(),
        criticality: Criticality::High,
        common_issues: vec!["Order processing failures".to_string()],
    }
}

pub fn app1_catalog() -> Arc<FileCatalog> {
    Arc::new(FileCatalog::from_parts(
        vec![app1_profile()],
        vec![
            TicketRecord::new("App1", "Orders stuck in pending after payment"),
            TicketRecord::new("App1", "Inventory count drifted after nightly sync"),
        ],
    ))
}

pub async fn memory_repository() -> Arc<AssessmentRepository> {
    let pool = create_pool("sqlite::memory:")
        .await
        .expect("in-memory pool");
    init_schema(&pool).await.expect("schema");
    Arc::new(AssessmentRepository::new(pool))
}
