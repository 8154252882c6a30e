//! `companies {ingest|get|list}`

use clap::Subcommand;
use secpipe_artifacts::Company;
use serde::Serialize;

use crate::cli::output::{print_row, print_rows, OutputFormat};
use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum CompaniesAction {
    /// Fetch a company from the ingestion source and upsert it.
    Ingest { ticker: String },
    /// Look up a company by ticker.
    Get { ticker: String },
    /// List every known company.
    List,
}

#[derive(Debug, Serialize)]
struct CompanyView {
    id: String,
    ticker: String,
    name: String,
    exchanges: Vec<String>,
    industry_code: Option<String>,
    fiscal_year_end: Option<String>,
}

impl From<&Company> for CompanyView {
    fn from(c: &Company) -> Self {
        Self {
            id: c.id.to_string(),
            ticker: c.ticker.clone(),
            name: c.name.clone(),
            exchanges: c.exchanges.clone(),
            industry_code: c.industry_code.clone(),
            fiscal_year_end: c.fiscal_year_end.clone(),
        }
    }
}

const HEADERS: [&str; 4] = ["ticker", "name", "exchanges", "industry_code"];

fn row(c: &Company) -> Vec<String> {
    vec![c.ticker.clone(), c.name.clone(), c.exchanges.join(","), c.industry_code.clone().unwrap_or_default()]
}

pub async fn run(ctx: &PipelineContext, action: CompaniesAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        CompaniesAction::Ingest { ticker } => {
            let company = secpipe_pipeline::ingest_company(ctx, &ticker).await?;
            print_row(format, &HEADERS, row(&company), &CompanyView::from(&company));
        }
        CompaniesAction::Get { ticker } => {
            let company = ctx.companies.get_by_ticker(&ticker).await?;
            match company {
                Some(company) => print_row(format, &HEADERS, row(&company), &CompanyView::from(&company)),
                None => anyhow::bail!("no company found for ticker {ticker}"),
            }
        }
        CompaniesAction::List => {
            let companies = ctx.companies.list().await?;
            let rows = companies.iter().map(row).collect();
            let views: Vec<CompanyView> = companies.iter().map(CompanyView::from).collect();
            print_rows(format, &HEADERS, rows, &views);
        }
    }
    Ok(())
}
