//! `jobs {enqueue|get|list|requeue-failed|cancel}`
//!
//! Operator surface over the durable job queue, separate from the
//! resource-oriented commands (`companies`, `filings`, ...). Submitting a
//! job here only queues it; a `worker start` process claims and runs it.

use std::str::FromStr;

use clap::Subcommand;
use secpipe_core::{JobId, JobStatus, JobType};
use secpipe_queue::Job;
use serde::Serialize;

use crate::cli::output::{print_row, print_rows, OutputFormat};
use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum JobsAction {
    /// Enqueue a job with a raw JSON params object.
    Enqueue {
        job_type: String,
        params: String,
        #[arg(long, default_value_t = 0)]
        priority: i64,
        #[arg(long, default_value_t = 3)]
        max_retries: i64,
    },
    /// Show one job by id.
    Get { id: String },
    /// List jobs, optionally filtered by status and/or type.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        job_type: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Requeue every failed job (optionally filtered by type) back to pending.
    RequeueFailed {
        #[arg(long)]
        job_type: Option<String>,
    },
    /// Cancel a pending job.
    Cancel { id: String },
}

#[derive(Debug, Serialize)]
struct JobView {
    id: String,
    job_type: String,
    status: String,
    priority: i64,
    retry_count: i64,
    max_retries: i64,
    error: Option<String>,
}

impl From<&Job> for JobView {
    fn from(j: &Job) -> Self {
        Self {
            id: j.id.to_string(),
            job_type: j.job_type.as_str().to_string(),
            status: j.status.as_str().to_string(),
            priority: j.priority,
            retry_count: j.retry_count,
            max_retries: j.max_retries,
            error: j.error.clone(),
        }
    }
}

const HEADERS: [&str; 5] = ["id", "job_type", "status", "retry_count", "error"];

fn row(j: &Job) -> Vec<String> {
    vec![j.id.to_string(), j.job_type.as_str().to_string(), j.status.as_str().to_string(), j.retry_count.to_string(), j.error.clone().unwrap_or_default()]
}

pub async fn run(ctx: &PipelineContext, action: JobsAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        JobsAction::Enqueue { job_type, params, priority, max_retries } => {
            let job_type = JobType::from_str(&job_type).map_err(anyhow::Error::msg)?;
            let params: serde_json::Value = serde_json::from_str(&params)?;
            let job = ctx.jobs.create(job_type, params, priority, max_retries).await?;
            print_row(format, &HEADERS, row(&job), &JobView::from(&job));
        }
        JobsAction::Get { id } => {
            let id = JobId::parse(&id)?;
            let job = ctx.jobs.get(id).await?.ok_or_else(|| anyhow::anyhow!("no job found for id {id}"))?;
            print_row(format, &HEADERS, row(&job), &JobView::from(&job));
        }
        JobsAction::List { status, job_type, limit } => {
            let status = status.map(|s| JobStatus::from_str(&s)).transpose().map_err(anyhow::Error::msg)?;
            let job_type = job_type.map(|j| JobType::from_str(&j)).transpose().map_err(anyhow::Error::msg)?;
            let jobs = ctx.jobs.list(status, job_type, limit).await?;
            let rows = jobs.iter().map(row).collect();
            let views: Vec<JobView> = jobs.iter().map(JobView::from).collect();
            print_rows(format, &HEADERS, rows, &views);
        }
        JobsAction::RequeueFailed { job_type } => {
            let job_type = job_type.map(|j| JobType::from_str(&j)).transpose().map_err(anyhow::Error::msg)?;
            let jobs = ctx.jobs.requeue_failed(job_type).await?;
            let rows = jobs.iter().map(row).collect();
            let views: Vec<JobView> = jobs.iter().map(JobView::from).collect();
            print_rows(format, &HEADERS, rows, &views);
        }
        JobsAction::Cancel { id } => {
            let id = JobId::parse(&id)?;
            let job = ctx.jobs.cancel(id).await?.ok_or_else(|| anyhow::anyhow!("job {id} is not pending, cannot cancel"))?;
            print_row(format, &HEADERS, row(&job), &JobView::from(&job));
        }
    }
    Ok(())
}
