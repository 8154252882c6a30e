//! `filings {ingest|list|get}`

use clap::Subcommand;
use secpipe_artifacts::Filing;
use secpipe_core::CompanyId;
use serde::Serialize;

use crate::cli::output::{print_row, print_rows, OutputFormat};
use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum FilingsAction {
    /// Fetch and upsert the most recent filings for a ticker.
    Ingest {
        ticker: String,
        #[arg(long, default_value = "10-K")]
        form: String,
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(long)]
        no_documents: bool,
    },
    /// List the most recent filings of a form for a company.
    List {
        company_id: String,
        #[arg(long, default_value = "10-K")]
        form: String,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Look up a filing by accession number.
    Get { accession_number: String },
}

#[derive(Debug, Serialize)]
struct FilingView {
    id: String,
    company_id: String,
    accession_number: String,
    form_type: String,
    filing_date: String,
    source_url: Option<String>,
}

impl From<&Filing> for FilingView {
    fn from(f: &Filing) -> Self {
        Self {
            id: f.id.to_string(),
            company_id: f.company_id.to_string(),
            accession_number: f.accession_number.clone(),
            form_type: f.form_type.clone(),
            filing_date: f.filing_date.to_string(),
            source_url: f.source_url.clone(),
        }
    }
}

const HEADERS: [&str; 4] = ["accession_number", "form_type", "filing_date", "company_id"];

fn row(f: &Filing) -> Vec<String> {
    vec![f.accession_number.clone(), f.form_type.clone(), f.filing_date.to_string(), f.company_id.to_string()]
}

pub async fn run(ctx: &PipelineContext, action: FilingsAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        FilingsAction::Ingest { ticker, form, count, no_documents } => {
            let company = secpipe_pipeline::ingest_company(ctx, &ticker).await?;
            let filings =
                secpipe_pipeline::ingest_filings_with_options(ctx, company.id, &ticker, &form, count, !no_documents).await?;
            let rows = filings.iter().map(row).collect();
            let views: Vec<FilingView> = filings.iter().map(FilingView::from).collect();
            print_rows(format, &HEADERS, rows, &views);
        }
        FilingsAction::List { company_id, form, limit } => {
            let company_id = CompanyId::parse(&company_id)?;
            let filings = ctx.filings.list_recent_for_company(company_id, &form, limit).await?;
            let rows = filings.iter().map(row).collect();
            let views: Vec<FilingView> = filings.iter().map(FilingView::from).collect();
            print_rows(format, &HEADERS, rows, &views);
        }
        FilingsAction::Get { accession_number } => {
            let filing = ctx.filings.get_by_accession(&accession_number).await?;
            match filing {
                Some(filing) => print_row(format, &HEADERS, row(&filing), &FilingView::from(&filing)),
                None => anyhow::bail!("no filing found for accession number {accession_number}"),
            }
        }
    }
    Ok(())
}
