//! Ingestion handlers: pull Company/Filing/Document/FinancialValue records
//! through the injected `IngestionSource` and upsert them into the
//! artifact store.

use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use secpipe_artifacts::{Company, CompanyUpsert, DocumentUpsert, Filing, FilingUpsert};
use secpipe_core::CompanyId;
use tracing::warn;

use crate::context::PipelineContext;
use crate::error::Result;

pub async fn ingest_company(ctx: &PipelineContext, ticker: &str) -> Result<Company> {
    let record = ctx.ingestion.fetch_company(ticker).await?;
    Ok(ctx
        .companies
        .upsert(CompanyUpsert {
            ticker: record.ticker,
            name: record.name,
            exchanges: record.exchanges,
            industry_code: record.industry_code,
            fiscal_year_end: record.fiscal_year_end,
        })
        .await?)
}

/// Fetch and upsert `count` latest filings of `form` for a company,
/// along with each filing's documents. Financial-value extraction is
/// best-effort: a failure is logged and the filing's ingestion continues.
pub async fn ingest_filings(
    ctx: &PipelineContext,
    company_id: CompanyId,
    ticker: &str,
    form: &str,
    count: usize,
) -> Result<Vec<Filing>> {
    ingest_filings_with_options(ctx, company_id, ticker, form, count, true).await
}

/// As [`ingest_filings`], but lets the caller skip document extraction
/// entirely (`include_documents=false`), matching `FILING_INGESTION`'s
/// optional param of the same name.
pub async fn ingest_filings_with_options(
    ctx: &PipelineContext,
    company_id: CompanyId,
    ticker: &str,
    form: &str,
    count: usize,
    include_documents: bool,
) -> Result<Vec<Filing>> {
    let records = ctx.ingestion.fetch_filings(ticker, form, count).await?;
    let mut filings = Vec::with_capacity(records.len());

    for record in &records {
        let filing = ctx
            .filings
            .upsert(FilingUpsert {
                company_id,
                accession_number: record.accession_number.clone(),
                form_type: record.form_type.clone(),
                filing_date: record.filing_date,
                period_of_report: record.period_of_report,
                source_url: record.source_url.clone(),
            })
            .await?;

        if include_documents {
            for document in ctx.ingestion.fetch_documents(record).await? {
                ctx.documents
                    .upsert(DocumentUpsert {
                        filing_id: filing.id,
                        company_id,
                        title: document.title,
                        document_type: document.document_type,
                        content: document.content,
                    })
                    .await?;
            }
        }

        if let Err(e) = ingest_financial_values(ctx, company_id, filing.id, record).await {
            warn!(accession_number = %record.accession_number, error = %e, "financial data ingestion failed, continuing");
        }

        filings.push(filing);
    }

    Ok(filings)
}

async fn ingest_financial_values(
    ctx: &PipelineContext,
    company_id: CompanyId,
    filing_id: secpipe_core::FilingId,
    record: &secpipe_external::FilingRecord,
) -> Result<()> {
    for value in ctx.ingestion.fetch_financial_values(record).await? {
        let labels: BTreeSet<String> = value.concept_labels.into_iter().collect();
        let concept = ctx.financial_concepts.merge(&value.concept_name, value.concept_description.as_deref(), &labels).await?;
        let decimal = Decimal::from_str(&value.value)
            .map_err(|e| crate::error::PipelineError::Validation(format!("invalid financial value {:?}: {e}", value.value)))?;
        ctx.financial_values
            .upsert(company_id, concept.id, value.value_date, Some(filing_id), decimal)
            .await?;
    }
    Ok(())
}

/// `INGEST_PIPELINE`: company metadata followed by its filings, in sequence.
pub async fn ingest_pipeline(ctx: &PipelineContext, ticker: &str, form: &str, count: usize) -> Result<(Company, Vec<Filing>)> {
    let company = ingest_company(ctx, ticker).await?;
    let filings = ingest_filings(ctx, company.id, ticker, form, count).await?;
    Ok((company, filings))
}

/// A single `{cik, company_name, accession_number, form}` descriptor from
/// a `BULK_INGEST` job. The source schema has no ticker or filing_date;
/// `cik` stands in for the ticker (both are stable per-company keys) and
/// the filing_date defaults to today, since bulk descriptors only assert
/// that the filing exists, not when it was filed.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BulkIngestDescriptor {
    pub cik: String,
    pub company_name: String,
    pub accession_number: String,
    pub form: String,
}

pub struct BulkIngestOutcome {
    pub filings_ingested: usize,
}

pub async fn bulk_ingest(
    ctx: &PipelineContext,
    descriptors: &[BulkIngestDescriptor],
    today: chrono::NaiveDate,
    include_documents: bool,
) -> Result<BulkIngestOutcome> {
    let mut filings_ingested = 0;
    for descriptor in descriptors {
        let company = ctx
            .companies
            .upsert(CompanyUpsert {
                ticker: descriptor.cik.clone(),
                name: descriptor.company_name.clone(),
                exchanges: vec![],
                industry_code: None,
                fiscal_year_end: None,
            })
            .await?;
        let filing = ctx
            .filings
            .upsert(FilingUpsert {
                company_id: company.id,
                accession_number: descriptor.accession_number.clone(),
                form_type: descriptor.form.clone(),
                filing_date: today,
                period_of_report: None,
                source_url: None,
            })
            .await?;

        if include_documents {
            let record = secpipe_external::FilingRecord {
                accession_number: descriptor.accession_number.clone(),
                form_type: descriptor.form.clone(),
                filing_date: today,
                period_of_report: None,
                source_url: None,
            };
            for document in ctx.ingestion.fetch_documents(&record).await? {
                ctx.documents
                    .upsert(DocumentUpsert {
                        filing_id: filing.id,
                        company_id: company.id,
                        title: document.title,
                        document_type: document.document_type,
                        content: document.content,
                    })
                    .await?;
            }
        }

        filings_ingested += 1;
    }
    Ok(BulkIngestOutcome { filings_ingested })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secpipe_external::{StubChatCompleter, StubIngestionSource};

    use super::*;

    async fn test_ctx() -> PipelineContext {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        secpipe_db::init_schema(&pool).await.unwrap();
        PipelineContext::new(pool, Arc::new(StubIngestionSource), Arc::new(StubChatCompleter))
    }

    #[tokio::test]
    async fn ingest_pipeline_upserts_company_filings_and_documents() {
        let ctx = test_ctx().await;
        let (company, filings) = ingest_pipeline(&ctx, "aapl", "10-K", 5).await.unwrap();
        assert_eq!(company.ticker, "AAPL");
        assert_eq!(filings.len(), 5);

        let docs = ctx.documents.find_for_filing(filings[0].id, secpipe_core::DocumentType::RiskFactors).await.unwrap();
        assert!(docs.is_some());

        let values = ctx.financial_values.list_for_company(company.id).await.unwrap();
        assert_eq!(values.len(), 5);
    }

    #[tokio::test]
    async fn bulk_ingest_uses_cik_as_ticker_and_todays_date_as_filing_date() {
        let ctx = test_ctx().await;
        let today = chrono::NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let descriptors = vec![BulkIngestDescriptor {
            cik: "0000320193".into(),
            company_name: "Apple Inc.".into(),
            accession_number: "0000320193-24-000123".into(),
            form: "10-K".into(),
        }];
        let outcome = bulk_ingest(&ctx, &descriptors, today, true).await.unwrap();
        assert_eq!(outcome.filings_ingested, 1);

        let company = ctx.companies.get_by_ticker("0000320193").await.unwrap().unwrap();
        let filing = ctx.filings.get_by_accession("0000320193-24-000123").await.unwrap().unwrap();
        assert_eq!(filing.company_id, company.id);
        assert_eq!(filing.filing_date, today);
    }

    #[tokio::test]
    async fn bulk_ingest_fetches_documents_when_include_documents_is_true() {
        let ctx = test_ctx().await;
        let today = chrono::NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let descriptors = vec![BulkIngestDescriptor {
            cik: "0000320193".into(),
            company_name: "Apple Inc.".into(),
            accession_number: "0000320193-24-000123".into(),
            form: "10-K".into(),
        }];
        bulk_ingest(&ctx, &descriptors, today, true).await.unwrap();

        let filing = ctx.filings.get_by_accession("0000320193-24-000123").await.unwrap().unwrap();
        let doc = ctx.documents.find_for_filing(filing.id, secpipe_core::DocumentType::RiskFactors).await.unwrap();
        assert!(doc.is_some());
    }

    #[tokio::test]
    async fn bulk_ingest_skips_documents_when_include_documents_is_false() {
        let ctx = test_ctx().await;
        let today = chrono::NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let descriptors = vec![BulkIngestDescriptor {
            cik: "0000320193".into(),
            company_name: "Apple Inc.".into(),
            accession_number: "0000320193-24-000123".into(),
            form: "10-K".into(),
        }];
        bulk_ingest(&ctx, &descriptors, today, false).await.unwrap();

        let filing = ctx.filings.get_by_accession("0000320193-24-000123").await.unwrap().unwrap();
        let doc = ctx.documents.find_for_filing(filing.id, secpipe_core::DocumentType::RiskFactors).await.unwrap();
        assert!(doc.is_none());
    }
}
