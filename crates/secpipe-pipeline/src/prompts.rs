//! Disk-backed prompt and model-config resolution.
//!
//! Prompts live as directories under a configurable root:
//! `{prompts_dir}/{name}/prompt.md` plus optional `examples/*.md`. Both
//! helpers here are thin content-hash-deduplicated upserts over the
//! artifact stores — idempotent by construction, since the store's
//! `ensure` already collapses on content hash.

use std::fs;
use std::path::Path;

use secpipe_artifacts::{ModelConfig, Prompt};
use secpipe_core::{hashing, PromptRole};

use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};

/// Read `{prompts_dir}/{name}/prompt.md` and its sorted `examples/*.md`,
/// canonicalize, and upsert as a system prompt.
pub async fn ensure_prompt(ctx: &PipelineContext, prompts_dir: &Path, name: &str) -> Result<Prompt> {
    let dir = prompts_dir.join(name);
    let prompt_md = fs::read_to_string(dir.join("prompt.md"))
        .map_err(|e| PipelineError::Io(std::io::Error::new(e.kind(), format!("{}: {e}", dir.join("prompt.md").display()))))?;

    let mut example_names = Vec::new();
    let examples_dir = dir.join("examples");
    if examples_dir.is_dir() {
        for entry in fs::read_dir(&examples_dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("md") {
                example_names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    example_names.sort();

    let mut examples = Vec::with_capacity(example_names.len());
    for file_name in &example_names {
        examples.push(fs::read_to_string(examples_dir.join(file_name))?);
    }

    let content = hashing::canonical_prompt_content(&prompt_md, &examples);
    Ok(ctx.prompts.ensure(name, PromptRole::System, None, &content).await?)
}

pub async fn ensure_model_config(ctx: &PipelineContext, model: &str, options: &serde_json::Value) -> Result<ModelConfig> {
    Ok(ctx.model_configs.ensure(model, options).await?)
}
