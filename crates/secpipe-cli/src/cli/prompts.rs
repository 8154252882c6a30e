//! `prompts {create|get|list}`

use std::path::PathBuf;

use clap::Subcommand;
use secpipe_artifacts::Prompt;
use secpipe_core::PromptId;
use serde::Serialize;

use crate::cli::output::{print_row, print_rows, OutputFormat};
use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// Read `{prompts_dir}/{name}/prompt.md` (+ sorted examples) and upsert it.
    Create { name: String, prompts_dir: PathBuf },
    /// Look up a prompt by id.
    Get { id: String },
    /// List every stored revision of a prompt name.
    List { name: String },
}

#[derive(Debug, Serialize)]
struct PromptView {
    id: String,
    name: String,
    role: String,
    content_hash: String,
}

impl From<&Prompt> for PromptView {
    fn from(p: &Prompt) -> Self {
        Self { id: p.id.to_string(), name: p.name.clone(), role: p.role.as_str().to_string(), content_hash: p.content_hash.clone() }
    }
}

const HEADERS: [&str; 3] = ["name", "role", "content_hash"];

fn row(p: &Prompt) -> Vec<String> {
    vec![p.name.clone(), p.role.as_str().to_string(), p.content_hash.clone()]
}

pub async fn run(ctx: &PipelineContext, action: PromptsAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        PromptsAction::Create { name, prompts_dir } => {
            let prompt = secpipe_pipeline::ensure_prompt(ctx, &prompts_dir, &name).await?;
            print_row(format, &HEADERS, row(&prompt), &PromptView::from(&prompt));
        }
        PromptsAction::Get { id } => {
            let id = PromptId::parse(&id)?;
            let prompt = ctx.prompts.get(id).await?.ok_or_else(|| anyhow::anyhow!("no prompt found for id {id}"))?;
            print_row(format, &HEADERS, row(&prompt), &PromptView::from(&prompt));
        }
        PromptsAction::List { name } => {
            let prompts = ctx.prompts.list_by_name(&name).await?;
            let rows = prompts.iter().map(row).collect();
            let views: Vec<PromptView> = prompts.iter().map(PromptView::from).collect();
            print_rows(format, &HEADERS, rows, &views);
        }
    }
    Ok(())
}
