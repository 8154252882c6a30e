//! `pipeline {ingest|bulk-ingest|company-group|full}` — direct synchronous
//! invocations of the orchestration functions, bypassing the job queue.
//! Useful for operators who want a run's result immediately rather than
//! polling `jobs get` after `jobs enqueue`.

use std::path::PathBuf;

use clap::Subcommand;
use secpipe_core::Trigger;
use serde::Serialize;
use serde_json::json;

use secpipe_pipeline::{ingest_pipeline, run_full_pipeline, BulkIngestDescriptor, FullPipelineParams, PipelineContext};

use crate::cli::output::{print_row, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum PipelineAction {
    /// Company metadata, then its filings, in one call.
    Ingest {
        ticker: String,
        #[arg(long, default_value = "10-K")]
        form: String,
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Upsert a batch of `{cik, company_name, accession_number, form}` descriptors from a JSON file.
    BulkIngest {
        descriptors_file: PathBuf,
        #[arg(long)]
        no_documents: bool,
    },
    /// Run every stage for a ticker under one `PipelineRun`.
    Full {
        ticker: String,
        #[arg(long)]
        prompts_dir: PathBuf,
        #[arg(long, value_enum, default_value = "manual")]
        trigger: TriggerArg,
    },
    /// Cross-company analysis + frontpage summary for a list of tickers.
    CompanyGroup {
        #[arg(long, value_delimiter = ',', required = true)]
        tickers: Vec<String>,
        #[arg(long)]
        prompts_dir: PathBuf,
        #[arg(long)]
        group_slug: Option<String>,
        #[arg(long, default_value_t = 3)]
        max_per_ticker: i64,
        #[arg(long)]
        no_frontpage: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TriggerArg {
    Manual,
    Scheduled,
}

impl From<TriggerArg> for Trigger {
    fn from(value: TriggerArg) -> Self {
        match value {
            TriggerArg::Manual => Trigger::Manual,
            TriggerArg::Scheduled => Trigger::Scheduled,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunView {
    pipeline_run_id: String,
    status: String,
    jobs_created: i64,
    jobs_completed: i64,
    jobs_failed: i64,
}

const RUN_HEADERS: [&str; 4] = ["pipeline_run_id", "status", "jobs_completed", "jobs_failed"];

pub async fn run(ctx: &PipelineContext, action: PipelineAction, format: OutputFormat, force: bool) -> anyhow::Result<()> {
    match action {
        PipelineAction::Ingest { ticker, form, count } => {
            let (company, filings) = ingest_pipeline(ctx, &ticker, &form, count).await?;
            crate::cli::output::print_json(&json!({
                "company_id": company.id.to_string(),
                "ticker": company.ticker,
                "filings_ingested": filings.len(),
            }));
        }
        PipelineAction::BulkIngest { descriptors_file, no_documents } => {
            let raw = std::fs::read_to_string(&descriptors_file)?;
            let descriptors: Vec<BulkIngestDescriptor> = serde_json::from_str(&raw)?;
            let outcome = secpipe_pipeline::bulk_ingest(ctx, &descriptors, chrono::Utc::now().date_naive(), !no_documents).await?;
            crate::cli::output::print_json(&json!({ "filings_ingested": outcome.filings_ingested }));
        }
        PipelineAction::Full { ticker, prompts_dir, trigger } => {
            let mut params = FullPipelineParams::new(ticker, prompts_dir);
            params.trigger = trigger.into();
            params.force = force;
            let pipeline_run = run_full_pipeline(ctx, params).await?;
            let view = RunView {
                pipeline_run_id: pipeline_run.id.to_string(),
                status: pipeline_run.status.as_str().to_string(),
                jobs_created: pipeline_run.jobs_created,
                jobs_completed: pipeline_run.jobs_completed,
                jobs_failed: pipeline_run.jobs_failed,
            };
            let row = vec![
                view.pipeline_run_id.clone(),
                view.status.clone(),
                view.jobs_completed.to_string(),
                view.jobs_failed.to_string(),
            ];
            print_row(format, &RUN_HEADERS, row, &view);
        }
        PipelineAction::CompanyGroup { tickers, prompts_dir, group_slug, max_per_ticker, no_frontpage } => {
            let outcome = secpipe_pipeline::run_company_group_pipeline(
                ctx,
                &tickers,
                group_slug.as_deref(),
                max_per_ticker,
                &prompts_dir,
                !no_frontpage,
            )
            .await?;
            crate::cli::output::print_json(&json!({
                "analysis_hash": outcome.analysis_hash,
                "frontpage_hash": outcome.frontpage_hash,
            }));
        }
    }
    Ok(())
}
