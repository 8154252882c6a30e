//! Runtime context threaded through every handler and pipeline stage.
//!
//! Replaces the ambient-singleton idiom (a module-level database session)
//! with an explicit value: one `PipelineContext` is built once at startup
//! and passed by reference into every handler.

use std::sync::Arc;

use secpipe_artifacts::{
    CompanyStore, DocumentStore, FilingStore, FinancialConceptStore, FinancialValueStore,
    GeneratedContentStore, ModelConfigStore, PromptStore,
};
use secpipe_db::DbPool;
use secpipe_external::{ChatCompleter, IngestionSource};
use secpipe_ledger::PipelineRunStore;
use secpipe_queue::JobStore;

#[derive(Clone)]
pub struct PipelineContext {
    pub companies: CompanyStore,
    pub filings: FilingStore,
    pub documents: DocumentStore,
    pub financial_concepts: FinancialConceptStore,
    pub financial_values: FinancialValueStore,
    pub prompts: PromptStore,
    pub model_configs: ModelConfigStore,
    pub generated_content: GeneratedContentStore,
    pub pipeline_runs: PipelineRunStore,
    pub jobs: JobStore,
    pub ingestion: Arc<dyn IngestionSource>,
    pub chat: Arc<dyn ChatCompleter>,
}

impl PipelineContext {
    pub fn new(pool: DbPool, ingestion: Arc<dyn IngestionSource>, chat: Arc<dyn ChatCompleter>) -> Self {
        Self {
            companies: CompanyStore::new(pool.clone()),
            filings: FilingStore::new(pool.clone()),
            documents: DocumentStore::new(pool.clone()),
            financial_concepts: FinancialConceptStore::new(pool.clone()),
            financial_values: FinancialValueStore::new(pool.clone()),
            prompts: PromptStore::new(pool.clone()),
            model_configs: ModelConfigStore::new(pool.clone()),
            generated_content: GeneratedContentStore::new(pool.clone()),
            pipeline_runs: PipelineRunStore::new(pool.clone()),
            jobs: JobStore::new(pool),
            ingestion,
            chat,
        }
    }
}
