//! Pipeline-run ledger.
//!
//! One row per top-level orchestration invocation (e.g. one `FULL_PIPELINE`
//! call for a ticker), tracking how many jobs it created/completed/failed
//! so operators can audit a run after the fact.

use chrono::{DateTime, Utc};
use secpipe_core::{CompanyId, PipelineRunId, PipelineRunStatus, Trigger};
use secpipe_db::DbPool;
use sqlx::FromRow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
    #[error("pipeline run {0} not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, FromRow)]
struct PipelineRunRow {
    id: String,
    company_id: String,
    forms: String,
    trigger_kind: String,
    status: String,
    jobs_created: i64,
    jobs_completed: i64,
    jobs_failed: i64,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
    run_metadata: String,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: PipelineRunId,
    pub company_id: CompanyId,
    pub forms: Vec<String>,
    pub trigger: Trigger,
    pub status: PipelineRunStatus,
    pub jobs_created: i64,
    pub jobs_completed: i64,
    pub jobs_failed: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub run_metadata: serde_json::Value,
}

impl TryFrom<PipelineRunRow> for PipelineRun {
    type Error = LedgerError;

    fn try_from(row: PipelineRunRow) -> Result<Self> {
        Ok(Self {
            id: PipelineRunId::parse(&row.id).map_err(|e| LedgerError::Invalid("pipeline run id", e.to_string()))?,
            company_id: CompanyId::parse(&row.company_id)
                .map_err(|e| LedgerError::Invalid("company id", e.to_string()))?,
            forms: serde_json::from_str(&row.forms)?,
            trigger: row.trigger_kind.parse().map_err(|e: String| LedgerError::Invalid("trigger", e))?,
            status: row.status.parse().map_err(|e: String| LedgerError::Invalid("pipeline run status", e))?,
            jobs_created: row.jobs_created,
            jobs_completed: row.jobs_completed,
            jobs_failed: row.jobs_failed,
            started_at: row.started_at,
            completed_at: row.completed_at,
            error: row.error,
            run_metadata: serde_json::from_str(&row.run_metadata)?,
        })
    }
}

#[derive(Clone)]
pub struct PipelineRunStore {
    pool: DbPool,
}

impl PipelineRunStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn start(&self, company_id: CompanyId, forms: &[String], trigger: Trigger) -> Result<PipelineRun> {
        let id = PipelineRunId::new();
        sqlx::query(
            r#"
            INSERT INTO pipeline_runs (id, company_id, forms, trigger_kind, status, started_at, run_metadata)
            VALUES (?, ?, ?, ?, 'running', ?, '{}')
            "#,
        )
        .bind(id.to_string())
        .bind(company_id.to_string())
        .bind(serde_json::to_string(forms)?)
        .bind(trigger.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    pub async fn get(&self, id: PipelineRunId) -> Result<Option<PipelineRun>> {
        let row: Option<PipelineRunRow> =
            sqlx::query_as("SELECT * FROM pipeline_runs WHERE id = ?").bind(id.to_string()).fetch_optional(&self.pool).await?;
        row.map(PipelineRun::try_from).transpose()
    }

    /// Add to the running job counters without changing status.
    pub async fn record_progress(&self, id: PipelineRunId, created: i64, completed: i64, failed: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE pipeline_runs
            SET jobs_created = jobs_created + ?, jobs_completed = jobs_completed + ?, jobs_failed = jobs_failed + ?
            WHERE id = ?
            "#,
        )
        .bind(created)
        .bind(completed)
        .bind(failed)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn finish(&self, id: PipelineRunId, error: Option<&str>) -> Result<PipelineRun> {
        let status = if error.is_some() { PipelineRunStatus::Failed } else { PipelineRunStatus::Completed };
        sqlx::query("UPDATE pipeline_runs SET status = ?, completed_at = ?, error = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(error)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        self.get(id).await?.ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    pub async fn list_for_company(&self, company_id: CompanyId, limit: i64) -> Result<Vec<PipelineRun>> {
        let rows: Vec<PipelineRunRow> = sqlx::query_as(
            "SELECT * FROM pipeline_runs WHERE company_id = ? ORDER BY started_at DESC LIMIT ?",
        )
        .bind(company_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PipelineRun::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secpipe_artifacts::{CompanyStore, CompanyUpsert};

    #[tokio::test]
    async fn run_lifecycle_tracks_counters_and_status() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let company = CompanyStore::new(pool.clone())
            .upsert(CompanyUpsert {
                ticker: "AAPL".into(),
                name: "Apple".into(),
                exchanges: vec![],
                industry_code: None,
                fiscal_year_end: None,
            })
            .await
            .unwrap();

        let store = PipelineRunStore::new(pool);
        let run = store.start(company.id, &["10-K".to_string()], Trigger::Manual).await.unwrap();
        assert_eq!(run.status, PipelineRunStatus::Running);

        store.record_progress(run.id, 56, 0, 0).await.unwrap();
        store.record_progress(run.id, 0, 56, 0).await.unwrap();
        let finished = store.finish(run.id, None).await.unwrap();
        assert_eq!(finished.status, PipelineRunStatus::Completed);
        assert_eq!(finished.jobs_created, 56);
        assert_eq!(finished.jobs_completed, 56);
        assert_eq!(finished.jobs_failed, 0);
    }
}
