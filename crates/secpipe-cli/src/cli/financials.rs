//! `financials {list-concepts|list-values|get-concept}`

use clap::Subcommand;
use secpipe_artifacts::{FinancialConcept, FinancialValue};
use secpipe_core::CompanyId;
use serde::Serialize;

use crate::cli::output::{print_row, print_rows, OutputFormat};
use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum FinancialsAction {
    /// List every known financial concept.
    ListConcepts,
    /// List financial values recorded for a company.
    ListValues { company_id: String },
    /// Look up a financial concept by name.
    GetConcept { name: String },
}

#[derive(Debug, Serialize)]
struct ConceptView {
    id: String,
    name: String,
    description: Option<String>,
    labels: Vec<String>,
}

impl From<&FinancialConcept> for ConceptView {
    fn from(c: &FinancialConcept) -> Self {
        Self { id: c.id.to_string(), name: c.name.clone(), description: c.description.clone(), labels: c.labels.iter().cloned().collect() }
    }
}

const CONCEPT_HEADERS: [&str; 3] = ["name", "description", "labels"];

fn concept_row(c: &FinancialConcept) -> Vec<String> {
    vec![c.name.clone(), c.description.clone().unwrap_or_default(), c.labels.iter().cloned().collect::<Vec<_>>().join(",")]
}

#[derive(Debug, Serialize)]
struct ValueView {
    id: String,
    concept_id: String,
    value_date: String,
    filing_id: Option<String>,
    value: String,
}

impl From<&FinancialValue> for ValueView {
    fn from(v: &FinancialValue) -> Self {
        Self {
            id: v.id.to_string(),
            concept_id: v.concept_id.to_string(),
            value_date: v.value_date.to_string(),
            filing_id: v.filing_id.map(|f| f.to_string()),
            value: v.value.to_string(),
        }
    }
}

const VALUE_HEADERS: [&str; 4] = ["concept_id", "value_date", "value", "filing_id"];

fn value_row(v: &FinancialValue) -> Vec<String> {
    vec![v.concept_id.to_string(), v.value_date.to_string(), v.value.to_string(), v.filing_id.map(|f| f.to_string()).unwrap_or_default()]
}

pub async fn run(ctx: &PipelineContext, action: FinancialsAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        FinancialsAction::ListConcepts => {
            let concepts = ctx.financial_concepts.list().await?;
            let rows = concepts.iter().map(concept_row).collect();
            let views: Vec<ConceptView> = concepts.iter().map(ConceptView::from).collect();
            print_rows(format, &CONCEPT_HEADERS, rows, &views);
        }
        FinancialsAction::ListValues { company_id } => {
            let company_id = CompanyId::parse(&company_id)?;
            let values = ctx.financial_values.list_for_company(company_id).await?;
            let rows = values.iter().map(value_row).collect();
            let views: Vec<ValueView> = values.iter().map(ValueView::from).collect();
            print_rows(format, &VALUE_HEADERS, rows, &views);
        }
        FinancialsAction::GetConcept { name } => {
            let concept =
                ctx.financial_concepts.get_by_name(&name).await?.ok_or_else(|| anyhow::anyhow!("no financial concept named {name}"))?;
            print_row(format, &CONCEPT_HEADERS, concept_row(&concept), &ConceptView::from(&concept));
        }
    }
    Ok(())
}
