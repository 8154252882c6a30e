//! The atomic LLM step: resolve prompt/model/sources, call the chat
//! completer, and insert-or-fetch the resulting `GeneratedContent` by
//! content hash. Every pipeline stage bottoms out in this function.

use secpipe_artifacts::{GeneratedContentDraft, Sources};
use secpipe_core::{ContentStage, GeneratedContentId};

use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};

const SOURCE_DELIMITER: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Default)]
pub struct ContentGenerationRequest {
    pub system_prompt_hash: String,
    pub model_config_hash: String,
    pub source_document_hashes: Vec<String>,
    pub source_content_hashes: Vec<String>,
    pub company_ticker: Option<String>,
    pub company_group_slug: Option<String>,
    pub description: Option<String>,
    pub document_type: Option<String>,
    pub form_type: Option<String>,
    pub content_stage: ContentStage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGenerationOutcome {
    pub content_id: GeneratedContentId,
    pub content_hash: String,
    pub was_created: bool,
}

/// Resolve a model config "by id or hash", per the content-generation
/// contract: job params carry the hash, but internal callers sometimes
/// already hold the id.
async fn resolve_model_config(
    ctx: &PipelineContext,
    id_or_hash: &str,
) -> Result<secpipe_artifacts::ModelConfig> {
    if let Ok(id) = secpipe_core::ModelConfigId::parse(id_or_hash) {
        if let Some(found) = ctx.model_configs.get(id).await? {
            return Ok(found);
        }
    }
    ctx.model_configs
        .get_by_hash(id_or_hash)
        .await?
        .ok_or_else(|| PipelineError::SourceNotFound(format!("model config {id_or_hash}")))
}

pub async fn generate_content(
    ctx: &PipelineContext,
    req: ContentGenerationRequest,
) -> Result<ContentGenerationOutcome> {
    let prompt = ctx
        .prompts
        .get_by_hash(&req.system_prompt_hash)
        .await?
        .ok_or_else(|| PipelineError::SourceNotFound(format!("prompt {}", req.system_prompt_hash)))?;
    let model_config = resolve_model_config(ctx, &req.model_config_hash).await?;

    let mut source_texts = Vec::new();
    let mut document_ids = Vec::new();
    for hash in &req.source_document_hashes {
        let doc = ctx
            .documents
            .get_by_hash(hash)
            .await?
            .ok_or_else(|| PipelineError::SourceNotFound(format!("document {hash}")))?;
        source_texts.push(ctx.documents.load_content(doc.id).await?);
        document_ids.push(doc.id);
    }

    let mut generated_content_ids = Vec::new();
    for hash in &req.source_content_hashes {
        let content = ctx
            .generated_content
            .get_by_hash(hash)
            .await?
            .ok_or_else(|| PipelineError::SourceNotFound(format!("generated content {hash}")))?;
        source_texts.push(content.content.clone());
        generated_content_ids.push(content.id);
    }

    if document_ids.is_empty() && generated_content_ids.is_empty() {
        return Err(PipelineError::Validation(
            "content generation requires at least one source".to_string(),
        ));
    }

    let user_prompt = source_texts.join(SOURCE_DELIMITER);

    let response = ctx.chat.chat(&prompt.content, &user_prompt, &model_config.model, &model_config.options).await?;

    let company_id = match &req.company_ticker {
        Some(ticker) => ctx.companies.get_by_ticker(ticker).await?.map(|c| c.id),
        None => None,
    };

    let draft = GeneratedContentDraft {
        content: response.response,
        summary: req.description,
        company_id,
        company_group_slug: req.company_group_slug,
        document_type: req.document_type,
        form_type: req.form_type,
        content_stage: req.content_stage,
        sources: Sources { documents: document_ids, generated_content: generated_content_ids },
        system_prompt_id: prompt.id,
        model_config_id: model_config.id,
        total_duration_seconds: response.total_duration_seconds,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
        warning: response.warning,
    };

    let outcome = ctx.generated_content.insert(draft).await?;
    Ok(ContentGenerationOutcome {
        content_id: outcome.content.id,
        content_hash: outcome.content.content_hash,
        was_created: outcome.was_created,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secpipe_core::PromptRole;
    use secpipe_external::{StubChatCompleter, StubIngestionSource};

    use super::*;

    async fn test_ctx() -> PipelineContext {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        secpipe_db::init_schema(&pool).await.unwrap();
        PipelineContext::new(pool, Arc::new(StubIngestionSource), Arc::new(StubChatCompleter))
    }

    #[tokio::test]
    async fn repeated_call_with_identical_sources_is_a_no_op_after_the_first() {
        let ctx = test_ctx().await;
        let company = ctx
            .companies
            .upsert(secpipe_artifacts::CompanyUpsert {
                ticker: "AAPL".into(),
                name: "Apple".into(),
                exchanges: vec![],
                industry_code: None,
                fiscal_year_end: None,
            })
            .await
            .unwrap();
        let filing = ctx
            .filings
            .upsert(secpipe_artifacts::FilingUpsert {
                company_id: company.id,
                accession_number: "acc-1".into(),
                form_type: "10-K".into(),
                filing_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                period_of_report: None,
                source_url: None,
            })
            .await
            .unwrap();
        let document = ctx
            .documents
            .upsert(secpipe_artifacts::DocumentUpsert {
                filing_id: filing.id,
                company_id: company.id,
                title: None,
                document_type: secpipe_core::DocumentType::RiskFactors,
                content: "Risk text.".into(),
            })
            .await
            .unwrap();
        let prompt = ctx.prompts.ensure("single_summary_system", PromptRole::System, None, "Summarize.").await.unwrap();
        let model_config = ctx.model_configs.ensure("gpt-4o", &serde_json::json!({})).await.unwrap();

        let req = ContentGenerationRequest {
            system_prompt_hash: prompt.content_hash.clone(),
            model_config_hash: model_config.content_hash.clone(),
            source_document_hashes: vec![document.content_hash.clone()],
            content_stage: ContentStage::SingleSummary,
            ..Default::default()
        };

        let first = generate_content(&ctx, req.clone()).await.unwrap();
        assert!(first.was_created);
        let second = generate_content(&ctx, req).await.unwrap();
        assert!(!second.was_created);
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[tokio::test]
    async fn unknown_source_hash_is_a_validation_error() {
        let ctx = test_ctx().await;
        let prompt = ctx.prompts.ensure("p", PromptRole::System, None, "Summarize.").await.unwrap();
        let model_config = ctx.model_configs.ensure("gpt-4o", &serde_json::json!({})).await.unwrap();

        let req = ContentGenerationRequest {
            system_prompt_hash: prompt.content_hash,
            model_config_hash: model_config.content_hash,
            source_document_hashes: vec!["deadbeef".to_string()],
            content_stage: ContentStage::SingleSummary,
            ..Default::default()
        };

        let err = generate_content(&ctx, req).await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));
    }
}
