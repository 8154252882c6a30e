//! `COMPANY_GROUP_PIPELINE`: cross-company analysis over each ticker's
//! most recent aggregate summaries.

use std::path::Path;

use secpipe_core::ContentStage;
use tracing::warn;

use crate::content_generation::{generate_content, ContentGenerationRequest};
use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::full_pipeline::{default_model_options, DEFAULT_MODEL};
use crate::prompts::{ensure_model_config, ensure_prompt};

/// Warn rather than fail when the concatenated source text crosses this
/// many characters — a soft guard against overlong prompts, not a hard
/// limit the stage enforces.
pub const DEFAULT_SOURCE_LENGTH_WARNING_THRESHOLD: usize = 200_000;

/// Name of the `{prompts_dir}/company_group_analysis/prompt.md` directory
/// this stage resolves its system prompt from, mirroring how `FULL_PIPELINE`
/// names a prompt directory per document type.
pub const COMPANY_GROUP_PROMPT_NAME: &str = "company_group_analysis";

#[derive(Debug, Clone)]
pub struct CompanyGroupOutcome {
    pub analysis_hash: String,
    pub frontpage_hash: Option<String>,
}

/// Gather up to `max_per_ticker` recent aggregate summaries per ticker,
/// synthesize a `company_group_analysis`, and optionally chain a
/// `company_group_frontpage` from it.
///
/// Resolves its own system prompt and model config from `prompts_dir`
/// (under [`COMPANY_GROUP_PROMPT_NAME`]) and [`DEFAULT_MODEL`], the same
/// way `FULL_PIPELINE` resolves defaults per document type, rather than
/// requiring the caller to have already created and hashed them.
pub async fn run_company_group_pipeline(
    ctx: &PipelineContext,
    tickers: &[String],
    group_slug: Option<&str>,
    max_per_ticker: i64,
    prompts_dir: &Path,
    generate_frontpage: bool,
) -> Result<CompanyGroupOutcome> {
    let prompt = ensure_prompt(ctx, prompts_dir, COMPANY_GROUP_PROMPT_NAME).await?;
    let model_config = ensure_model_config(ctx, DEFAULT_MODEL, &default_model_options()).await?;

    let mut source_hashes = Vec::new();
    for ticker in tickers {
        let Some(company) = ctx.companies.get_by_ticker(ticker).await? else {
            return Err(PipelineError::SourceNotFound(format!("company {ticker}")));
        };
        let recent = ctx.generated_content.list_recent_for_company(company.id, ContentStage::AggregateSummary, max_per_ticker).await?;
        source_hashes.extend(recent.into_iter().map(|c| c.content_hash));
    }

    if source_hashes.is_empty() {
        return Err(PipelineError::Validation("no aggregate summaries found for any ticker in the group".to_string()));
    }

    let total_len: usize = {
        let mut sum = 0;
        for hash in &source_hashes {
            if let Some(content) = ctx.generated_content.get_by_hash(hash).await? {
                sum += content.content.len();
            }
        }
        sum
    };
    if total_len > DEFAULT_SOURCE_LENGTH_WARNING_THRESHOLD {
        warn!(total_len, threshold = DEFAULT_SOURCE_LENGTH_WARNING_THRESHOLD, "company group source text is unusually large");
    }

    let analysis = generate_content(
        ctx,
        ContentGenerationRequest {
            system_prompt_hash: prompt.content_hash.clone(),
            model_config_hash: model_config.content_hash.clone(),
            source_content_hashes: source_hashes,
            company_group_slug: group_slug.map(str::to_string),
            content_stage: ContentStage::CompanyGroupAnalysis,
            ..Default::default()
        },
    )
    .await?;

    let frontpage_hash = if generate_frontpage {
        let frontpage = generate_content(
            ctx,
            ContentGenerationRequest {
                system_prompt_hash: prompt.content_hash.clone(),
                model_config_hash: model_config.content_hash.clone(),
                source_content_hashes: vec![analysis.content_hash.clone()],
                company_group_slug: group_slug.map(str::to_string),
                content_stage: ContentStage::CompanyGroupFrontpage,
                ..Default::default()
            },
        )
        .await?;
        Some(frontpage.content_hash)
    } else {
        None
    };

    Ok(CompanyGroupOutcome { analysis_hash: analysis.content_hash, frontpage_hash })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use secpipe_core::{DocumentType, PromptRole};
    use secpipe_external::{StubChatCompleter, StubIngestionSource};

    use super::*;
    use crate::ingestion::ingest_pipeline;
    use crate::stages::generate_single_summaries;
    use crate::stages::generate_aggregate_summary;

    async fn test_ctx() -> PipelineContext {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        secpipe_db::init_schema(&pool).await.unwrap();
        PipelineContext::new(pool, Arc::new(StubIngestionSource), Arc::new(StubChatCompleter))
    }

    /// Scratch `{prompts_dir}/company_group_analysis/prompt.md`, the file
    /// `run_company_group_pipeline` resolves its own default prompt from.
    fn write_company_group_prompt(label: &str) -> std::path::PathBuf {
        let prompts_dir = std::env::temp_dir().join(format!("secpipe-company-group-test-{label}-{:?}", std::thread::current().id()));
        let _ = fs::remove_dir_all(&prompts_dir);
        let dir = prompts_dir.join(COMPANY_GROUP_PROMPT_NAME);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("prompt.md"), "Synthesize a cross-company analysis.").unwrap();
        prompts_dir
    }

    #[tokio::test]
    async fn gathers_aggregates_across_tickers_and_chains_frontpage() {
        let ctx = test_ctx().await;
        let prompt = ctx.prompts.ensure("risk_factors", PromptRole::System, None, "Summarize risks.").await.unwrap();
        let model_config = ctx.model_configs.ensure("gpt-4o", &serde_json::json!({})).await.unwrap();

        for ticker in ["AAPL", "MSFT"] {
            let (_company, filings) = ingest_pipeline(&ctx, ticker, "10-K", 2).await.unwrap();
            let stage_a = generate_single_summaries(&ctx, &filings, DocumentType::RiskFactors, &prompt, &model_config, false).await.unwrap();
            generate_aggregate_summary(&ctx, &stage_a, &prompt, &model_config, ticker, false).await.unwrap();
        }

        let prompts_dir = write_company_group_prompt("chains-frontpage");
        let outcome =
            run_company_group_pipeline(&ctx, &["AAPL".to_string(), "MSFT".to_string()], Some("big-tech"), 3, &prompts_dir, true)
                .await
                .unwrap();
        assert!(!outcome.analysis_hash.is_empty());
        assert!(outcome.frontpage_hash.is_some());

        fs::remove_dir_all(&prompts_dir).unwrap();
    }

    #[tokio::test]
    async fn errors_when_ticker_has_no_company() {
        let ctx = test_ctx().await;
        let prompts_dir = write_company_group_prompt("no-company");
        let err = run_company_group_pipeline(&ctx, &["NOPE".to_string()], None, 3, &prompts_dir, false).await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));

        fs::remove_dir_all(&prompts_dir).unwrap();
    }

    #[tokio::test]
    async fn errors_when_prompt_directory_is_missing() {
        let ctx = test_ctx().await;
        let prompts_dir = std::env::temp_dir().join("secpipe-company-group-test-missing-prompt");
        let _ = fs::remove_dir_all(&prompts_dir);
        fs::create_dir_all(&prompts_dir).unwrap();
        let err = run_company_group_pipeline(&ctx, &["AAPL".to_string()], None, 3, &prompts_dir, false).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));

        fs::remove_dir_all(&prompts_dir).unwrap();
    }
}
