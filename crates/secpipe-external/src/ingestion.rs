//! `IngestionSource` — the filing fetcher and section extractor the core
//! consumes but does not own. Implementations live outside this crate;
//! the stub here exists for tests and local development.

use async_trait::async_trait;
use chrono::NaiveDate;
use secpipe_core::DocumentType;

use crate::error::IngestionError;

#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub ticker: String,
    pub name: String,
    pub exchanges: Vec<String>,
    pub industry_code: Option<String>,
    pub fiscal_year_end: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilingRecord {
    pub accession_number: String,
    pub form_type: String,
    pub filing_date: NaiveDate,
    pub period_of_report: Option<NaiveDate>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub document_type: DocumentType,
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct FinancialValueRecord {
    pub concept_name: String,
    pub concept_description: Option<String>,
    pub concept_labels: Vec<String>,
    pub value_date: NaiveDate,
    pub value: String,
}

/// Yields Company, Filing, Document, and FinancialValue records for a
/// ticker or accession number. Errors bubble up as `IngestionError`.
#[async_trait]
pub trait IngestionSource: Send + Sync {
    async fn fetch_company(&self, ticker: &str) -> Result<CompanyRecord, IngestionError>;

    async fn fetch_filings(
        &self,
        ticker: &str,
        form: &str,
        count: usize,
    ) -> Result<Vec<FilingRecord>, IngestionError>;

    async fn fetch_documents(&self, filing: &FilingRecord) -> Result<Vec<DocumentRecord>, IngestionError>;

    async fn fetch_financial_values(
        &self,
        filing: &FilingRecord,
    ) -> Result<Vec<FinancialValueRecord>, IngestionError>;
}
