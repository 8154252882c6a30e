//! Orchestration layer: wires the artifact stores, queue, and ledger into
//! one [`PipelineContext`] and exposes the pipeline stage functions plus
//! the `job_type -> Handler` registry built on top of them.

pub mod company_group;
pub mod content_generation;
pub mod context;
pub mod error;
pub mod full_pipeline;
pub mod handlers;
pub mod ingestion;
pub mod prompts;
pub mod stages;

pub use company_group::{run_company_group_pipeline, CompanyGroupOutcome};
pub use content_generation::{generate_content, ContentGenerationOutcome, ContentGenerationRequest};
pub use context::PipelineContext;
pub use error::{PipelineError, Result};
pub use full_pipeline::{run_full_pipeline, FullPipelineParams};
pub use handlers::build_registry;
pub use ingestion::{bulk_ingest, ingest_company, ingest_filings, ingest_filings_with_options, ingest_pipeline, BulkIngestDescriptor, BulkIngestOutcome};
pub use prompts::{ensure_model_config, ensure_prompt};
pub use stages::{generate_aggregate_summary, generate_frontpage_summary, generate_single_summaries, StageAResult};
