//! The worker loop: claim, dispatch, complete/fail, with a background
//! heartbeat ticker so the stale-job sweep doesn't misclassify healthy
//! long-running work.

use std::sync::Arc;
use std::time::Duration;

use secpipe_core::JobId;
use secpipe_queue::JobStore;
use tracing::{error, info, warn};

use crate::registry::HandlerRegistry;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    /// How long to sleep after finding no pending job.
    pub poll_backoff: Duration,
    /// Heartbeat period; must be much smaller than the stale threshold.
    pub heartbeat_interval: Duration,
}

impl WorkerConfig {
    pub fn new(worker_id: String) -> Self {
        Self {
            worker_id,
            poll_backoff: Duration::from_millis(250),
            heartbeat_interval: Duration::from_secs(10),
        }
    }
}

/// Claim and run at most one job. Returns `true` if a job was claimed
/// (regardless of outcome), `false` if the queue was empty.
pub async fn run_once(
    store: &JobStore,
    registry: &HandlerRegistry,
    config: &WorkerConfig,
) -> secpipe_queue::Result<bool> {
    let Some(job) = store.claim_next(&config.worker_id).await? else {
        return Ok(false);
    };

    info!(job_id = %job.id, job_type = %job.job_type, worker_id = %config.worker_id, "dispatching job");

    let Some(handler) = registry.get(job.job_type) else {
        warn!(job_id = %job.id, job_type = %job.job_type, "no handler registered");
        store.fail(job.id, "no handler").await?;
        return Ok(true);
    };

    let heartbeat = spawn_heartbeat(store, job.id, config.heartbeat_interval);
    let outcome = handler.handle(job.params.clone()).await;
    heartbeat.abort();

    match outcome {
        Ok(result) => {
            store.complete(job.id, result).await?;
            info!(job_id = %job.id, "job completed");
        }
        Err(e) => {
            error!(job_id = %job.id, error = %e, "job failed");
            store.fail(job.id, &e.to_string()).await?;
        }
    }
    Ok(true)
}

fn spawn_heartbeat(store: &JobStore, job_id: JobId, interval: Duration) -> tokio::task::JoinHandle<()> {
    let store = store.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            ticker.tick().await;
            if store.heartbeat(job_id).await.is_err() {
                return;
            }
        }
    })
}

/// Run forever: claim and process jobs, sleeping a short backoff whenever
/// the queue is empty. Intended to run inside its own task per worker.
pub async fn run_forever(store: Arc<JobStore>, registry: Arc<HandlerRegistry>, config: WorkerConfig) {
    loop {
        match run_once(&store, &registry, &config).await {
            Ok(true) => continue,
            Ok(false) => tokio::time::sleep(config.poll_backoff).await,
            Err(e) => {
                error!(error = %e, "worker loop error claiming/dispatching job");
                tokio::time::sleep(config.poll_backoff).await;
            }
        }
    }
}
