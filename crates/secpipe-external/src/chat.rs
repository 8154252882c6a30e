//! `ChatCompleter` — the LLM transport the core consumes but does not own.

use async_trait::async_trait;

use crate::error::ChatError;

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub response: String,
    pub total_duration_seconds: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub warning: Option<String>,
}

/// `chat(system, user, model_config) -> {response, total_duration_seconds,
/// input_tokens, output_tokens, warning?}`. The warning channel is opaque
/// and propagated verbatim to `GeneratedContent.warning`.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
        options: &serde_json::Value,
    ) -> Result<ChatResponse, ChatError>;
}
