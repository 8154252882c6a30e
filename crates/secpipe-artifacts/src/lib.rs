pub mod company;
pub mod document;
pub mod error;
pub mod filing;
pub mod financial;
pub mod generated_content;
pub mod model_config;
pub mod prompt;

pub use company::{Company, CompanyStore, CompanyUpsert};
pub use document::{Document, DocumentStore, DocumentUpsert};
pub use error::{ArtifactError, Result};
pub use filing::{Filing, FilingStore, FilingUpsert};
pub use financial::{FinancialConcept, FinancialConceptStore, FinancialValue, FinancialValueStore};
pub use generated_content::{
    GeneratedContent, GeneratedContentDraft, GeneratedContentStore, InsertOutcome, Sources,
};
pub use model_config::{ModelConfig, ModelConfigStore};
pub use prompt::{Prompt, PromptStore};
