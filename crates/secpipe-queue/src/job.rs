//! Job model and row mapping.

use chrono::{DateTime, Utc};
use secpipe_core::{JobId, JobStatus, JobType};
use sqlx::FromRow;

use crate::error::{QueueError, Result};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct JobRow {
    pub id: String,
    pub job_type: String,
    pub params: String,
    pub priority: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub retry_count: i64,
    pub max_retries: i64,
    pub worker_id: Option<String>,
    pub error: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub params: serde_json::Value,
    pub priority: i64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub retry_count: i64,
    pub max_retries: i64,
    pub worker_id: Option<String>,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
}

impl TryFrom<JobRow> for Job {
    type Error = QueueError;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Self {
            id: JobId::parse(&row.id).map_err(|e| QueueError::NotFound(e.to_string()))?,
            job_type: row.job_type.parse().map_err(|e: String| QueueError::NotFound(e))?,
            params: serde_json::from_str(&row.params)?,
            priority: row.priority,
            status: row.status.parse().map_err(|e: String| QueueError::NotFound(e))?,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            updated_at: row.updated_at,
            retry_count: row.retry_count,
            max_retries: row.max_retries,
            worker_id: row.worker_id,
            error: row.error,
            result: row.result.map(|r| serde_json::from_str(&r)).transpose()?,
        })
    }
}
