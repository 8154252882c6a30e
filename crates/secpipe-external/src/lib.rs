mod chat;
mod error;
mod ingestion;
mod stub;

pub use chat::{ChatCompleter, ChatResponse};
pub use error::{ChatError, IngestionError};
pub use ingestion::{CompanyRecord, DocumentRecord, FilingRecord, FinancialValueRecord, IngestionSource};
pub use stub::{StubChatCompleter, StubIngestionSource};
