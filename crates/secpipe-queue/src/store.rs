//! Job store: durable queue with atomic claim.
//!
//! `claim_next` follows the transactional select-then-conditional-update
//! pattern `JobQueue::pop_job` uses against SQLite: find the candidate row,
//! then `UPDATE ... WHERE id = ? AND status = 'pending'` inside the same
//! transaction and check `rows_affected` to detect a race against another
//! claimer.

use chrono::Utc;
use secpipe_core::{JobId, JobStatus, JobType};
use secpipe_db::DbPool;
use tracing::{info, warn};

use crate::error::{QueueError, Result};
use crate::job::{Job, JobRow};

#[derive(Clone)]
pub struct JobStore {
    pool: DbPool,
}

impl JobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        job_type: JobType,
        params: serde_json::Value,
        priority: i64,
        max_retries: i64,
    ) -> Result<Job> {
        let id = JobId::new();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO jobs (id, job_type, params, priority, status, created_at, updated_at, retry_count, max_retries)
            VALUES (?, ?, ?, ?, 'pending', ?, ?, 0, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(job_type.as_str())
        .bind(serde_json::to_string(&params)?)
        .bind(priority)
        .bind(now)
        .bind(now)
        .bind(max_retries)
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| QueueError::NotFound(id.to_string()))
    }

    pub async fn get(&self, id: JobId) -> Result<Option<Job>> {
        let row: Option<JobRow> =
            sqlx::query_as("SELECT * FROM jobs WHERE id = ?").bind(id.to_string()).fetch_optional(&self.pool).await?;
        row.map(Job::try_from).transpose()
    }

    pub async fn list(
        &self,
        status: Option<JobStatus>,
        job_type: Option<JobType>,
        limit: i64,
    ) -> Result<Vec<Job>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE (? IS NULL OR status = ?) AND (? IS NULL OR job_type = ?)
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(job_type.map(|j| j.as_str()))
        .bind(job_type.map(|j| j.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Job::try_from).collect()
    }

    /// Atomically claim the highest-priority (smallest value), oldest
    /// pending job for `worker_id`.
    pub async fn claim_next(&self, worker_id: &str) -> Result<Option<Job>> {
        let mut tx = self.pool.begin().await?;

        let candidate: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM jobs
            WHERE status = 'pending'
            ORDER BY priority ASC, created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some((job_id,)) = candidate else {
            tx.commit().await?;
            return Ok(None);
        };

        let now = Utc::now();
        let rows_affected = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'in_progress', worker_id = ?, started_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(worker_id)
        .bind(now)
        .bind(now)
        .bind(&job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            // Lost the race to another claimer.
            tx.commit().await?;
            return Ok(None);
        }

        let row: JobRow = sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
            .bind(&job_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        let job = Job::try_from(row)?;
        info!(job_id = %job.id, job_type = %job.job_type, "claimed job");
        Ok(Some(job))
    }

    /// Bump `updated_at` on an in-progress job without changing its
    /// status, used by the worker loop's heartbeat ticker.
    pub async fn heartbeat(&self, id: JobId) -> Result<()> {
        sqlx::query("UPDATE jobs SET updated_at = ? WHERE id = ? AND status = 'in_progress'")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Only legal from `in_progress`.
    pub async fn complete(&self, id: JobId, result: serde_json::Value) -> Result<Option<Job>> {
        let now = Utc::now();
        let rows_affected = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', result = ?, completed_at = ?, updated_at = ?, worker_id = NULL
            WHERE id = ? AND status = 'in_progress'
            "#,
        )
        .bind(serde_json::to_string(&result)?)
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Only legal from `in_progress`. Re-queues to `pending` if retries
    /// remain, otherwise transitions to `failed`.
    pub async fn fail(&self, id: JobId, error: &str) -> Result<Option<Job>> {
        let Some(job) = self.get(id).await? else { return Ok(None) };
        if job.status != JobStatus::InProgress {
            return Ok(None);
        }

        let retry_count = job.retry_count + 1;
        let now = Utc::now();
        if retry_count <= job.max_retries {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'pending', retry_count = ?, worker_id = NULL, started_at = NULL,
                    error = ?, updated_at = ?
                WHERE id = ? AND status = 'in_progress'
                "#,
            )
            .bind(retry_count)
            .bind(error)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
            warn!(job_id = %id, retry_count, "job failed, requeued");
        } else {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'failed', retry_count = ?, worker_id = NULL, error = ?,
                    completed_at = ?, updated_at = ?
                WHERE id = ? AND status = 'in_progress'
                "#,
            )
            .bind(job.max_retries)
            .bind(error)
            .bind(now)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
            warn!(job_id = %id, retry_count = job.max_retries, "job failed, retries exhausted");
        }

        self.get(id).await
    }

    /// Only legal from `pending`.
    pub async fn cancel(&self, id: JobId) -> Result<Option<Job>> {
        let rows_affected = sqlx::query("UPDATE jobs SET status = 'cancelled' WHERE id = ? AND status = 'pending'")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows_affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    pub async fn requeue_failed(&self, job_type: Option<JobType>) -> Result<Vec<Job>> {
        let ids: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM jobs WHERE status = 'failed' AND (? IS NULL OR job_type = ?)",
        )
        .bind(job_type.map(|j| j.as_str()))
        .bind(job_type.map(|j| j.as_str()))
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        for (id,) in &ids {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'pending', retry_count = 0, worker_id = NULL, error = NULL,
                    started_at = NULL, completed_at = NULL, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        }

        let mut jobs = Vec::with_capacity(ids.len());
        for (id,) in ids {
            let job_id = JobId::parse(&id).map_err(|e| QueueError::NotFound(e.to_string()))?;
            if let Some(job) = self.get(job_id).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    pub async fn cancel_failed(&self, job_type: Option<JobType>) -> Result<u64> {
        let rows_affected = sqlx::query(
            "UPDATE jobs SET status = 'cancelled' WHERE status = 'failed' AND (? IS NULL OR job_type = ?)",
        )
        .bind(job_type.map(|j| j.as_str()))
        .bind(job_type.map(|j| j.as_str()))
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows_affected)
    }

    /// For every `in_progress` job whose `updated_at` is older than
    /// `stale_threshold_seconds`, treat as `fail(id, "stale")`.
    pub async fn mark_stale_as_failed(&self, stale_threshold_seconds: i64) -> Result<Vec<Job>> {
        let cutoff = Utc::now() - chrono::Duration::seconds(stale_threshold_seconds);
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM jobs WHERE status = 'in_progress' AND updated_at <= ?")
                .bind(cutoff)
                .fetch_all(&self.pool)
                .await?;

        let mut jobs = Vec::with_capacity(ids.len());
        for (id,) in ids {
            let job_id = JobId::parse(&id).map_err(|e| QueueError::NotFound(e.to_string()))?;
            if let Some(job) = self.fail(job_id, "stale").await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    pub async fn count_by_status(&self, status: JobStatus, job_type: Option<JobType>) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM jobs WHERE status = ? AND (? IS NULL OR job_type = ?)",
        )
        .bind(status.as_str())
        .bind(job_type.map(|j| j.as_str()))
        .bind(job_type.map(|j| j.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> JobStore {
        JobStore::new(secpipe_db::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn single_job_roundtrip() {
        let store = store().await;
        let job = store.create(JobType::Test, json!({"sleep": 0}), 5, 3).await.unwrap();

        let claimed = store.claim_next("w1").await.unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
        assert_eq!(claimed.status, JobStatus::InProgress);
        assert_eq!(claimed.worker_id.as_deref(), Some("w1"));

        let completed = store
            .complete(job.id, json!({"echo": {"sleep": 0}, "status": "ok"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.status, JobStatus::Completed);
        assert!(completed.worker_id.is_none());
    }

    #[tokio::test]
    async fn retry_then_succeed() {
        let store = store().await;
        let job = store.create(JobType::Test, json!({}), 5, 2).await.unwrap();

        store.claim_next("w1").await.unwrap();
        let failed = store.fail(job.id, "boom").await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Pending);
        assert_eq!(failed.retry_count, 1);

        let claimed = store.claim_next("w1").await.unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
        let completed = store.complete(job.id, json!({})).await.unwrap().unwrap();
        assert_eq!(completed.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn retry_exhaustion_goes_to_failed_not_pending() {
        let store = store().await;
        let job = store.create(JobType::Test, json!({}), 5, 1).await.unwrap();

        store.claim_next("w1").await.unwrap();
        let first = store.fail(job.id, "boom").await.unwrap().unwrap();
        assert_eq!(first.status, JobStatus::Pending);

        store.claim_next("w1").await.unwrap();
        let second = store.fail(job.id, "boom again").await.unwrap().unwrap();
        assert_eq!(second.status, JobStatus::Failed);
        assert_eq!(second.retry_count, 1);
    }

    #[tokio::test]
    async fn priority_ordering_breaks_ties_by_created_at() {
        let store = store().await;
        let a = store.create(JobType::Test, json!({"n": 1}), 3, 3).await.unwrap();
        let b = store.create(JobType::Test, json!({"n": 2}), 0, 3).await.unwrap();
        let c = store.create(JobType::Test, json!({"n": 3}), 2, 3).await.unwrap();

        let first = store.claim_next("w1").await.unwrap().unwrap();
        assert_eq!(first.id, b.id);
        let second = store.claim_next("w1").await.unwrap().unwrap();
        assert_eq!(second.id, c.id);
        let third = store.claim_next("w1").await.unwrap().unwrap();
        assert_eq!(third.id, a.id);
    }

    #[tokio::test]
    async fn cancel_only_legal_from_pending() {
        let store = store().await;
        let job = store.create(JobType::Test, json!({}), 5, 3).await.unwrap();
        store.claim_next("w1").await.unwrap();

        let result = store.cancel(job.id).await.unwrap();
        assert!(result.is_none());
        let still_in_progress = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(still_in_progress.status, JobStatus::InProgress);
    }

    #[tokio::test]
    async fn mark_stale_as_failed_with_zero_threshold_marks_every_in_progress_job() {
        let store = store().await;
        let job = store.create(JobType::Test, json!({}), 5, 3).await.unwrap();
        store.claim_next("w1").await.unwrap();

        let stale = store.mark_stale_as_failed(0).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, job.id);
        assert_eq!(stale[0].status, JobStatus::Pending);
        assert_eq!(stale[0].retry_count, 1);
    }

    #[tokio::test]
    async fn requeue_failed_resets_retry_count_and_clears_error() {
        let store = store().await;
        let job = store.create(JobType::Test, json!({}), 5, 0).await.unwrap();
        store.claim_next("w1").await.unwrap();
        store.fail(job.id, "boom").await.unwrap();
        assert_eq!(store.get(job.id).await.unwrap().unwrap().status, JobStatus::Failed);

        let requeued = store.requeue_failed(None).await.unwrap();
        assert_eq!(requeued.len(), 1);
        assert_eq!(requeued[0].status, JobStatus::Pending);
        assert_eq!(requeued[0].retry_count, 0);
        assert!(requeued[0].error.is_none());
    }

    #[tokio::test]
    async fn count_by_status_reflects_queue_state() {
        let store = store().await;
        store.create(JobType::Test, json!({}), 5, 3).await.unwrap();
        store.create(JobType::Test, json!({}), 5, 3).await.unwrap();
        assert_eq!(store.count_by_status(JobStatus::Pending, None).await.unwrap(), 2);
        assert_eq!(store.count_by_status(JobStatus::Completed, None).await.unwrap(), 0);
    }
}
