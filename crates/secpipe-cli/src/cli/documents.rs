//! `documents {list|get}`

use clap::Subcommand;
use secpipe_artifacts::Document;
use secpipe_core::{DocumentType, FilingId};
use serde::Serialize;
use std::str::FromStr;

use crate::cli::output::{print_row, OutputFormat};
use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum DocumentsAction {
    /// Find the document of a given type belonging to a filing.
    List {
        filing_id: String,
        document_type: String,
    },
    /// Look up a document by content hash, optionally printing its body.
    Get {
        content_hash: String,
        #[arg(long)]
        show_content: bool,
    },
}

#[derive(Debug, Serialize)]
struct DocumentView {
    id: String,
    filing_id: String,
    document_type: String,
    title: Option<String>,
    content_hash: String,
    content: Option<String>,
}

const HEADERS: [&str; 4] = ["document_type", "title", "content_hash", "filing_id"];

fn row(d: &Document) -> Vec<String> {
    vec![
        d.document_type.as_str().to_string(),
        d.title.clone().unwrap_or_default(),
        d.content_hash.clone(),
        d.filing_id.to_string(),
    ]
}

pub async fn run(ctx: &PipelineContext, action: DocumentsAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        DocumentsAction::List { filing_id, document_type } => {
            let filing_id = FilingId::parse(&filing_id)?;
            let document_type = DocumentType::from_str(&document_type).map_err(anyhow::Error::msg)?;
            let document = ctx
                .documents
                .find_for_filing(filing_id, document_type)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no {document_type} document for filing {filing_id}"))?;
            let view = DocumentView {
                id: document.id.to_string(),
                filing_id: document.filing_id.to_string(),
                document_type: document.document_type.as_str().to_string(),
                title: document.title.clone(),
                content_hash: document.content_hash.clone(),
                content: None,
            };
            print_row(format, &HEADERS, row(&document), &view);
        }
        DocumentsAction::Get { content_hash, show_content } => {
            let document = ctx
                .documents
                .get_by_hash(&content_hash)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no document found for content hash {content_hash}"))?;
            let content = if show_content { Some(ctx.documents.load_content(document.id).await?) } else { None };
            let view = DocumentView {
                id: document.id.to_string(),
                filing_id: document.filing_id.to_string(),
                document_type: document.document_type.as_str().to_string(),
                title: document.title.clone(),
                content_hash: document.content_hash.clone(),
                content: content.clone(),
            };
            if show_content && format == OutputFormat::Table {
                println!("{}", content.unwrap_or_default());
            } else {
                print_row(format, &HEADERS, row(&document), &view);
            }
        }
    }
    Ok(())
}
