//! Repository for assessment session database operations

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use super::DbError;
use super::models::{AssessmentColumns, AssessmentRow};
use crate::model::{AssessmentSession, SessionId};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_name, application, self_ratings, generated_questions, answers,
           correct_count, total_count, percentage, state, created_at, updated_at
    FROM assessments
"#;

/// Durable store of assessment sessions
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Insert or update a session; a session already stored as final is left untouched
    async fn save(&self, session: &AssessmentSession) -> Result<(), DbError>;

    /// All sessions in insertion order
    async fn list_all(&self) -> Result<Vec<AssessmentSession>, DbError>;

    async fn get(&self, id: SessionId) -> Result<AssessmentSession, DbError>;
}

/// SQLite-backed assessment store
///
/// Writes and full listings go through `write_lock`, so at most one of them
/// touches the database at a time.
pub struct AssessmentRepository {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl AssessmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AssessmentStore for AssessmentRepository {
    async fn save(&self, session: &AssessmentSession) -> Result<(), DbError> {
        let columns = AssessmentColumns::from_session(session).map_err(DbError::Serialization)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO assessments (
                id, user_name, application, self_ratings, generated_questions, answers,
                correct_count, total_count, percentage, state, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                self_ratings = excluded.self_ratings,
                generated_questions = excluded.generated_questions,
                answers = excluded.answers,
                correct_count = excluded.correct_count,
                total_count = excluded.total_count,
                percentage = excluded.percentage,
                state = excluded.state,
                updated_at = excluded.updated_at
            WHERE assessments.state <> 'stored'
            "#,
        )
        .bind(&columns.id)
        .bind(session.user())
        .bind(session.application())
        .bind(&columns.self_ratings)
        .bind(&columns.generated_questions)
        .bind(&columns.answers)
        .bind(columns.correct_count)
        .bind(columns.total_count)
        .bind(columns.percentage)
        .bind(session.state().as_str())
        .bind(session.created_at())
        .bind(session.updated_at())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            tracing::debug!(id = %columns.id, "Session already stored, save skipped");
        } else {
            tracing::debug!(id = %columns.id, state = %session.state(), "Saved assessment session");
        }

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AssessmentSession>, DbError> {
        let _guard = self.write_lock.lock().await;

        let rows: Vec<AssessmentRow> =
            sqlx::query_as(&format!("{} ORDER BY seq ASC", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(DbError::Serialization))
            .collect()
    }

    async fn get(&self, id: SessionId) -> Result<AssessmentSession, DbError> {
        let row: AssessmentRow = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        row.into_domain().map_err(DbError::Serialization)
    }
}
