//! Closed enumerations used throughout the data model.

use serde::{Deserialize, Serialize};

/// The eight document sections the ingestion source is expected to yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ManagementDiscussion,
    RiskFactors,
    BusinessDescription,
    ControlsProcedures,
    LegalProceedings,
    MarketRisk,
    ExecutiveCompensation,
    DirectorsOfficers,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        DocumentType::ManagementDiscussion,
        DocumentType::RiskFactors,
        DocumentType::BusinessDescription,
        DocumentType::ControlsProcedures,
        DocumentType::LegalProceedings,
        DocumentType::MarketRisk,
        DocumentType::ExecutiveCompensation,
        DocumentType::DirectorsOfficers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ManagementDiscussion => "management_discussion",
            DocumentType::RiskFactors => "risk_factors",
            DocumentType::BusinessDescription => "business_description",
            DocumentType::ControlsProcedures => "controls_procedures",
            DocumentType::LegalProceedings => "legal_proceedings",
            DocumentType::MarketRisk => "market_risk",
            DocumentType::ExecutiveCompensation => "executive_compensation",
            DocumentType::DirectorsOfficers => "directors_officers",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown document type: {s}"))
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The default document types ingested per form, mirroring the ingestion
/// tooling's `ingest.just` recipe.
pub fn default_document_types_for_form(form_type: &str) -> &'static [DocumentType] {
    use DocumentType::*;
    match form_type {
        "10-K" => &[
            BusinessDescription,
            RiskFactors,
            ManagementDiscussion,
            ControlsProcedures,
        ],
        "10-Q" => &[RiskFactors, ManagementDiscussion, ControlsProcedures, MarketRisk],
        _ => &[RiskFactors, ManagementDiscussion],
    }
}

/// The role a prompt message plays in the chat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl PromptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptRole::System => "system",
            PromptRole::User => "user",
            PromptRole::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for PromptRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(PromptRole::System),
            "user" => Ok(PromptRole::User),
            "assistant" => Ok(PromptRole::Assistant),
            other => Err(format!("unknown prompt role: {other}")),
        }
    }
}

/// How far along the summarization hierarchy a piece of generated content sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStage {
    #[default]
    SingleSummary,
    AggregateSummary,
    FrontpageSummary,
    CompanyGroupAnalysis,
    CompanyGroupFrontpage,
}

impl ContentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStage::SingleSummary => "single_summary",
            ContentStage::AggregateSummary => "aggregate_summary",
            ContentStage::FrontpageSummary => "frontpage_summary",
            ContentStage::CompanyGroupAnalysis => "company_group_analysis",
            ContentStage::CompanyGroupFrontpage => "company_group_frontpage",
        }
    }
}

impl std::str::FromStr for ContentStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_summary" => Ok(ContentStage::SingleSummary),
            "aggregate_summary" => Ok(ContentStage::AggregateSummary),
            "frontpage_summary" => Ok(ContentStage::FrontpageSummary),
            "company_group_analysis" => Ok(ContentStage::CompanyGroupAnalysis),
            "company_group_frontpage" => Ok(ContentStage::CompanyGroupFrontpage),
            other => Err(format!("unknown content stage: {other}")),
        }
    }
}

/// Which side of the GeneratedContent source relationship is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Documents,
    GeneratedContent,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Documents => "documents",
            SourceType::GeneratedContent => "generated_content",
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documents" => Ok(SourceType::Documents),
            "generated_content" => Ok(SourceType::GeneratedContent),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

/// Lifecycle of a queued job. See the job state diagram in the design docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// The closed set of job_type tags the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Test,
    CompanyIngestion,
    FilingIngestion,
    ContentGeneration,
    BulkIngest,
    CompanyGroupPipeline,
    IngestPipeline,
    FullPipeline,
}

impl JobType {
    pub const ALL: [JobType; 8] = [
        JobType::Test,
        JobType::CompanyIngestion,
        JobType::FilingIngestion,
        JobType::ContentGeneration,
        JobType::BulkIngest,
        JobType::CompanyGroupPipeline,
        JobType::IngestPipeline,
        JobType::FullPipeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Test => "TEST",
            JobType::CompanyIngestion => "COMPANY_INGESTION",
            JobType::FilingIngestion => "FILING_INGESTION",
            JobType::ContentGeneration => "CONTENT_GENERATION",
            JobType::BulkIngest => "BULK_INGEST",
            JobType::CompanyGroupPipeline => "COMPANY_GROUP_PIPELINE",
            JobType::IngestPipeline => "INGEST_PIPELINE",
            JobType::FullPipeline => "FULL_PIPELINE",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|j| j.as_str() == s)
            .ok_or_else(|| format!("unknown job type: {s}"))
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What caused a pipeline run to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    Scheduled,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Scheduled => "scheduled",
        }
    }
}

impl std::str::FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Trigger::Manual),
            "scheduled" => Ok(Trigger::Scheduled),
            other => Err(format!("unknown trigger: {other}")),
        }
    }
}

/// Status of a pipeline-run ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl PipelineRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineRunStatus::Pending => "pending",
            PipelineRunStatus::Running => "running",
            PipelineRunStatus::Completed => "completed",
            PipelineRunStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PipelineRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PipelineRunStatus::Pending),
            "running" => Ok(PipelineRunStatus::Running),
            "completed" => Ok(PipelineRunStatus::Completed),
            "failed" => Ok(PipelineRunStatus::Failed),
            other => Err(format!("unknown pipeline run status: {other}")),
        }
    }
}
