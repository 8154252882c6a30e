//! Model config store.
//!
//! A model config is a model identifier plus a JSON options bag, content-
//! addressed by the SHA-256 of its canonical envelope so two requests with
//! the same model and options (regardless of key order) dedup to one row.

use chrono::{DateTime, Utc};
use secpipe_core::{hashing, ModelConfigId};
use secpipe_db::DbPool;
use sqlx::FromRow;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct ModelConfigRow {
    id: String,
    model: String,
    options_json: String,
    content_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub id: ModelConfigId,
    pub model: String,
    pub options: serde_json::Value,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ModelConfigRow> for ModelConfig {
    type Error = ArtifactError;

    fn try_from(row: ModelConfigRow) -> Result<Self> {
        Ok(Self {
            id: ModelConfigId::parse(&row.id).map_err(|e| ArtifactError::Invalid("model config id", e.to_string()))?,
            model: row.model,
            options: serde_json::from_str(&row.options_json)?,
            content_hash: row.content_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct ModelConfigStore {
    pool: DbPool,
}

impl ModelConfigStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn ensure(&self, model: &str, options: &serde_json::Value) -> Result<ModelConfig> {
        let (options_json, canonical) = hashing::canonical_model_config(model, options);
        let content_hash = hashing::content_hash(&canonical);
        if let Some(existing) = self.get_by_hash(&content_hash).await? {
            return Ok(existing);
        }

        let id = ModelConfigId::new();
        sqlx::query(
            "INSERT INTO model_configs (id, model, options_json, content_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(model)
        .bind(&options_json)
        .bind(&content_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("model config", id.to_string()))
    }

    pub async fn get(&self, id: ModelConfigId) -> Result<Option<ModelConfig>> {
        let row: Option<ModelConfigRow> =
            sqlx::query_as("SELECT * FROM model_configs WHERE id = ?").bind(id.to_string()).fetch_optional(&self.pool).await?;
        row.map(ModelConfig::try_from).transpose()
    }

    pub async fn get_by_hash(&self, content_hash: &str) -> Result<Option<ModelConfig>> {
        let row: Option<ModelConfigRow> = sqlx::query_as("SELECT * FROM model_configs WHERE content_hash = ?")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ModelConfig::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn ensure_dedups_regardless_of_key_order() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let store = ModelConfigStore::new(pool);
        let a = store.ensure("gpt-4o", &json!({"temperature": 0.2, "max_tokens": 512})).await.unwrap();
        let b = store.ensure("gpt-4o", &json!({"max_tokens": 512, "temperature": 0.2})).await.unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn ensure_creates_distinct_rows_for_distinct_options() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let store = ModelConfigStore::new(pool);
        let a = store.ensure("gpt-4o", &json!({"temperature": 0.2})).await.unwrap();
        let b = store.ensure("gpt-4o", &json!({"temperature": 0.7})).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
