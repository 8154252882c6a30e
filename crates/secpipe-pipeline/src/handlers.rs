//! `Handler` implementations for every built-in `job_type`, and a
//! registry-builder wiring them all to one `PipelineContext`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use secpipe_core::{ContentStage, DocumentType, JobType, Trigger};
use secpipe_worker::{Handler, HandlerError, HandlerRegistry};
use serde_json::{json, Value};

use crate::company_group::run_company_group_pipeline;
use crate::content_generation::{generate_content, ContentGenerationRequest};
use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::full_pipeline::{run_full_pipeline, FullPipelineParams};
use crate::ingestion::{bulk_ingest, ingest_company, ingest_filings_with_options, ingest_pipeline, BulkIngestDescriptor};

fn require_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| PipelineError::Validation(format!("missing required param: {field}")))
}

fn optional_str<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
    params.get(field).and_then(Value::as_str)
}

fn optional_str_vec(params: &Value, field: &str) -> Vec<String> {
    params
        .get(field)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn optional_u64(params: &Value, field: &str, default: u64) -> u64 {
    params.get(field).and_then(Value::as_u64).unwrap_or(default)
}

fn optional_bool(params: &Value, field: &str, default: bool) -> bool {
    params.get(field).and_then(Value::as_bool).unwrap_or(default)
}

pub struct TestHandler;

#[async_trait]
impl Handler for TestHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        let sleep_seconds = params.get("sleep").and_then(Value::as_f64).unwrap_or(0.0);
        if sleep_seconds > 0.0 {
            tokio::time::sleep(std::time::Duration::from_secs_f64(sleep_seconds)).await;
        }
        Ok(json!({"echo": params, "status": "ok"}))
    }
}

pub struct CompanyIngestionHandler {
    pub ctx: PipelineContext,
}

impl CompanyIngestionHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let ticker = require_str(&params, "ticker")?;
        let company = ingest_company(&self.ctx, ticker).await?;
        Ok(json!({"company_id": company.id.to_string(), "ticker": company.ticker}))
    }
}

#[async_trait]
impl Handler for CompanyIngestionHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

pub struct FilingIngestionHandler {
    pub ctx: PipelineContext,
}

impl FilingIngestionHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let company_id = secpipe_core::CompanyId::parse(require_str(&params, "company_id")?)
            .map_err(|e| PipelineError::Validation(e.to_string()))?;
        let ticker = require_str(&params, "ticker")?;
        let form = optional_str(&params, "form").unwrap_or("10-K");
        let count = optional_u64(&params, "count", 5) as usize;
        let include_documents = optional_bool(&params, "include_documents", true);

        let filings = ingest_filings_with_options(&self.ctx, company_id, ticker, form, count, include_documents).await?;
        Ok(json!({"filings_ingested": filings.len()}))
    }
}

#[async_trait]
impl Handler for FilingIngestionHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

pub struct ContentGenerationHandler {
    pub ctx: PipelineContext,
}

impl ContentGenerationHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let content_stage = match optional_str(&params, "content_stage") {
            Some(s) => ContentStage::from_str(s).map_err(PipelineError::Validation)?,
            None => ContentStage::SingleSummary,
        };
        let req = ContentGenerationRequest {
            system_prompt_hash: require_str(&params, "system_prompt_hash")?.to_string(),
            model_config_hash: require_str(&params, "model_config_hash")?.to_string(),
            source_document_hashes: optional_str_vec(&params, "source_document_hashes"),
            source_content_hashes: optional_str_vec(&params, "source_content_hashes"),
            company_ticker: optional_str(&params, "company_ticker").map(str::to_string),
            company_group_slug: optional_str(&params, "company_group_slug").map(str::to_string),
            description: optional_str(&params, "description").map(str::to_string),
            document_type: optional_str(&params, "document_type").map(str::to_string),
            form_type: optional_str(&params, "form_type").map(str::to_string),
            content_stage,
        };
        let outcome = generate_content(&self.ctx, req).await?;
        Ok(json!({
            "content_id": outcome.content_id.to_string(),
            "content_hash": outcome.content_hash,
            "was_created": outcome.was_created,
        }))
    }
}

#[async_trait]
impl Handler for ContentGenerationHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

pub struct BulkIngestHandler {
    pub ctx: PipelineContext,
}

impl BulkIngestHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let descriptors: Vec<BulkIngestDescriptor> = serde_json::from_value(
            params.get("filings").cloned().ok_or_else(|| PipelineError::Validation("missing required param: filings".to_string()))?,
        )
        .map_err(|e| PipelineError::Validation(format!("invalid filings list: {e}")))?;
        let include_documents = optional_bool(&params, "include_documents", true);
        let outcome = bulk_ingest(&self.ctx, &descriptors, chrono::Utc::now().date_naive(), include_documents).await?;
        Ok(json!({"filings_ingested": outcome.filings_ingested}))
    }
}

#[async_trait]
impl Handler for BulkIngestHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

pub struct CompanyGroupPipelineHandler {
    pub ctx: PipelineContext,
}

impl CompanyGroupPipelineHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let tickers = optional_str_vec(&params, "tickers");
        if tickers.is_empty() {
            return Err(PipelineError::Validation("missing required param: tickers".to_string()));
        }
        let group_slug = optional_str(&params, "group_slug");
        let max_per_ticker = optional_u64(&params, "max_per_ticker", 3) as i64;
        let generate_frontpage = optional_bool(&params, "generate_frontpage", true);
        let prompts_dir = PathBuf::from(optional_str(&params, "prompts_dir").unwrap_or("./prompts"));

        let outcome =
            run_company_group_pipeline(&self.ctx, &tickers, group_slug, max_per_ticker, &prompts_dir, generate_frontpage).await?;
        Ok(json!({
            "analysis_hash": outcome.analysis_hash,
            "frontpage_hash": outcome.frontpage_hash,
        }))
    }
}

#[async_trait]
impl Handler for CompanyGroupPipelineHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

pub struct IngestPipelineHandler {
    pub ctx: PipelineContext,
}

impl IngestPipelineHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let ticker = require_str(&params, "ticker")?;
        let form = optional_str(&params, "form").unwrap_or("10-K");
        let count = optional_u64(&params, "count", 5) as usize;
        let (company, filings) = ingest_pipeline(&self.ctx, ticker, form, count).await?;
        Ok(json!({"company_id": company.id.to_string(), "filings_ingested": filings.len()}))
    }
}

#[async_trait]
impl Handler for IngestPipelineHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

pub struct FullPipelineHandler {
    pub ctx: PipelineContext,
}

impl FullPipelineHandler {
    async fn run(&self, params: Value) -> Result<Value> {
        let ticker = require_str(&params, "ticker")?.to_string();
        let prompts_dir = PathBuf::from(optional_str(&params, "prompts_dir").unwrap_or("./prompts"));

        let forms = {
            let raw = optional_str_vec(&params, "forms");
            if raw.is_empty() {
                vec!["10-K".to_string(), "10-Q".to_string()]
            } else {
                raw
            }
        };

        let counts: HashMap<String, usize> = match params.get("counts").and_then(Value::as_object) {
            Some(map) => map.iter().filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n as usize))).collect(),
            None => HashMap::from([("10-K".to_string(), 5), ("10-Q".to_string(), 6)]),
        };

        let document_types = match params.get("document_types").and_then(Value::as_array) {
            Some(items) => {
                let mut parsed = Vec::with_capacity(items.len());
                for item in items {
                    let s = item.as_str().ok_or_else(|| PipelineError::Validation("document_types must be strings".to_string()))?;
                    parsed.push(DocumentType::from_str(s).map_err(PipelineError::Validation)?);
                }
                Some(parsed)
            }
            None => None,
        };

        let trigger = match optional_str(&params, "trigger") {
            Some(s) => Trigger::from_str(s).map_err(PipelineError::Validation)?,
            None => Trigger::Manual,
        };
        let force = optional_bool(&params, "force", false);

        let run = run_full_pipeline(
            &self.ctx,
            FullPipelineParams { ticker, forms, counts, document_types, prompts_dir, trigger, force },
        )
        .await?;

        Ok(json!({
            "pipeline_run_id": run.id.to_string(),
            "status": run.status.as_str(),
            "jobs_created": run.jobs_created,
            "jobs_completed": run.jobs_completed,
            "jobs_failed": run.jobs_failed,
        }))
    }
}

#[async_trait]
impl Handler for FullPipelineHandler {
    async fn handle(&self, params: Value) -> std::result::Result<Value, HandlerError> {
        self.run(params).await.map_err(HandlerError::from)
    }
}

/// Build the process-wide `job_type -> handler` table. Called once at
/// startup; the registry is effectively immutable afterward.
pub fn build_registry(ctx: PipelineContext) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(JobType::Test, std::sync::Arc::new(TestHandler));
    registry.register(JobType::CompanyIngestion, std::sync::Arc::new(CompanyIngestionHandler { ctx: ctx.clone() }));
    registry.register(JobType::FilingIngestion, std::sync::Arc::new(FilingIngestionHandler { ctx: ctx.clone() }));
    registry.register(JobType::ContentGeneration, std::sync::Arc::new(ContentGenerationHandler { ctx: ctx.clone() }));
    registry.register(JobType::BulkIngest, std::sync::Arc::new(BulkIngestHandler { ctx: ctx.clone() }));
    registry.register(JobType::CompanyGroupPipeline, std::sync::Arc::new(CompanyGroupPipelineHandler { ctx: ctx.clone() }));
    registry.register(JobType::IngestPipeline, std::sync::Arc::new(IngestPipelineHandler { ctx: ctx.clone() }));
    registry.register(JobType::FullPipeline, std::sync::Arc::new(FullPipelineHandler { ctx }));
    registry
}
