//! `FULL_PIPELINE`: the top-level orchestrator tying ingestion and the
//! three content stages together under one `PipelineRun`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secpipe_core::{default_document_types_for_form, DocumentType, Trigger};
use secpipe_ledger::PipelineRun;

use crate::context::PipelineContext;
use crate::error::Result;
use crate::ingestion::{ingest_company, ingest_filings};
use crate::prompts::{ensure_model_config, ensure_prompt};
use crate::stages::{generate_aggregate_summary, generate_frontpage_summary, generate_single_summaries};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

#[derive(Debug, Clone)]
pub struct FullPipelineParams {
    pub ticker: String,
    pub forms: Vec<String>,
    pub counts: HashMap<String, usize>,
    pub document_types: Option<Vec<DocumentType>>,
    pub prompts_dir: PathBuf,
    pub trigger: Trigger,
    pub force: bool,
}

impl FullPipelineParams {
    pub fn new(ticker: impl Into<String>, prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            ticker: ticker.into(),
            forms: vec!["10-K".to_string(), "10-Q".to_string()],
            counts: HashMap::from([("10-K".to_string(), 5), ("10-Q".to_string(), 6)]),
            document_types: None,
            prompts_dir: prompts_dir.into(),
            trigger: Trigger::Manual,
            force: false,
        }
    }

    fn count_for(&self, form: &str) -> usize {
        self.counts.get(form).copied().unwrap_or(5)
    }
}

/// Default options every `ensure_model_config` call in this orchestrator
/// uses; callers needing a different model must resolve their own config
/// and invoke the stage functions directly.
pub(crate) fn default_model_options() -> serde_json::Value {
    serde_json::json!({})
}

pub async fn run_full_pipeline(ctx: &PipelineContext, params: FullPipelineParams) -> Result<PipelineRun> {
    let run = ctx.pipeline_runs.start(resolve_company_id(ctx, &params).await?, &params.forms, params.trigger).await?;

    match run_stages(ctx, &run, &params).await {
        Ok(()) => Ok(ctx.pipeline_runs.finish(run.id, None).await?),
        Err(e) => {
            let message = e.to_string();
            ctx.pipeline_runs.finish(run.id, Some(&message)).await?;
            Err(e)
        }
    }
}

async fn resolve_company_id(ctx: &PipelineContext, params: &FullPipelineParams) -> Result<secpipe_core::CompanyId> {
    Ok(ingest_company(ctx, &params.ticker).await?.id)
}

async fn run_stages(ctx: &PipelineContext, run: &PipelineRun, params: &FullPipelineParams) -> Result<()> {
    for form in &params.forms {
        let count = params.count_for(form);
        let filings = ingest_filings(ctx, run.company_id, &params.ticker, form, count).await?;

        let document_types: Vec<DocumentType> =
            params.document_types.clone().unwrap_or_else(|| default_document_types_for_form(form).to_vec());

        for document_type in document_types {
            let (created, completed, failed) =
                run_one_document_type(ctx, &filings, document_type, &params.ticker, &params.prompts_dir, params.force).await?;
            ctx.pipeline_runs.record_progress(run.id, created, completed, failed).await?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_one_document_type(
    ctx: &PipelineContext,
    filings: &[secpipe_artifacts::Filing],
    document_type: DocumentType,
    ticker: &str,
    prompts_dir: &Path,
    force: bool,
) -> Result<(i64, i64, i64)> {
    let prompt = ensure_prompt(ctx, prompts_dir, document_type.as_str()).await?;
    let model_config = ensure_model_config(ctx, DEFAULT_MODEL, &default_model_options()).await?;

    let mut created = 0i64;
    let mut completed = 0i64;
    let mut failed = 0i64;

    let stage_a = generate_single_summaries(ctx, filings, document_type, &prompt, &model_config, force).await?;
    created += (stage_a.new_count + stage_a.reused_count + stage_a.failed_count) as i64;
    completed += (stage_a.new_count + stage_a.reused_count) as i64;
    failed += stage_a.failed_count as i64;

    if let Some(aggregate_hash) = generate_aggregate_summary(ctx, &stage_a, &prompt, &model_config, ticker, force).await? {
        created += 1;
        completed += 1;

        if generate_frontpage_summary(ctx, &aggregate_hash, &prompt, &model_config, force).await?.is_some() {
            created += 1;
            completed += 1;
        }
    }

    Ok((created, completed, failed))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use secpipe_core::PipelineRunStatus;
    use secpipe_external::{StubChatCompleter, StubIngestionSource};

    use super::*;

    async fn test_ctx() -> PipelineContext {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        secpipe_db::init_schema(&pool).await.unwrap();
        PipelineContext::new(pool, Arc::new(StubIngestionSource), Arc::new(StubChatCompleter))
    }

    fn write_prompts(prompts_dir: &Path) {
        for document_type in DocumentType::ALL {
            let dir = prompts_dir.join(document_type.as_str());
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("prompt.md"), format!("Summarize the {document_type} section.")).unwrap();
        }
    }

    #[tokio::test]
    async fn matches_the_documented_job_counters_for_two_forms_four_doc_types_five_filings() {
        let ctx = test_ctx().await;
        let prompts_dir = std::env::temp_dir().join("secpipe-full-pipeline-test-counters");
        let _ = fs::remove_dir_all(&prompts_dir);
        write_prompts(&prompts_dir);

        let mut params = FullPipelineParams::new("aapl", &prompts_dir);
        params.counts = HashMap::from([("10-K".to_string(), 5), ("10-Q".to_string(), 5)]);

        let run = run_full_pipeline(&ctx, params).await.unwrap();
        assert_eq!(run.status, PipelineRunStatus::Completed);
        assert_eq!(run.jobs_completed, 2 * 4 * (5 + 1 + 1));
        assert_eq!(run.jobs_failed, 0);
        assert_eq!(run.jobs_created, run.jobs_completed + run.jobs_failed);

        fs::remove_dir_all(&prompts_dir).unwrap();
    }

    #[tokio::test]
    async fn missing_prompt_directory_fails_the_run_but_preserves_partial_counters() {
        let ctx = test_ctx().await;
        let prompts_dir = std::env::temp_dir().join("secpipe-full-pipeline-test-missing-prompt");
        let _ = fs::remove_dir_all(&prompts_dir);
        fs::create_dir_all(&prompts_dir).unwrap();

        let mut params = FullPipelineParams::new("aapl", &prompts_dir);
        params.forms = vec!["10-K".to_string()];
        params.counts = HashMap::from([("10-K".to_string(), 2)]);

        let result = run_full_pipeline(&ctx, params).await;
        assert!(result.is_err());

        fs::remove_dir_all(&prompts_dir).unwrap();
    }
}
