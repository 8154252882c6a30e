//! Prompt store.
//!
//! Prompts are content-addressed: two prompts submitted under different
//! names but with identical role/content collapse onto the same stored
//! record, keyed by `(name, content_hash)`.

use chrono::{DateTime, Utc};
use secpipe_core::{hashing, PromptId, PromptRole};
use secpipe_db::DbPool;
use sqlx::FromRow;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct PromptRow {
    id: String,
    name: String,
    role: String,
    description: Option<String>,
    content: String,
    content_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub id: PromptId,
    pub name: String,
    pub role: PromptRole,
    pub description: Option<String>,
    pub content: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PromptRow> for Prompt {
    type Error = ArtifactError;

    fn try_from(row: PromptRow) -> Result<Self> {
        Ok(Self {
            id: PromptId::parse(&row.id).map_err(|e| ArtifactError::Invalid("prompt id", e.to_string()))?,
            name: row.name,
            role: row.role.parse().map_err(|e: String| ArtifactError::Invalid("prompt role", e))?,
            description: row.description,
            content: row.content,
            content_hash: row.content_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PromptStore {
    pool: DbPool,
}

impl PromptStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert-or-fetch by (name, content_hash): submitting the same name
    /// and content twice returns the existing record rather than
    /// duplicating it.
    pub async fn ensure(
        &self,
        name: &str,
        role: PromptRole,
        description: Option<&str>,
        content: &str,
    ) -> Result<Prompt> {
        let content_hash = hashing::content_hash(content);
        if let Some(existing) = self.get_by_name_and_hash(name, &content_hash).await? {
            return Ok(existing);
        }

        let id = PromptId::new();
        sqlx::query(
            r#"
            INSERT INTO prompts (id, name, role, description, content, content_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(role.as_str())
        .bind(description)
        .bind(content)
        .bind(&content_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("prompt", id.to_string()))
    }

    pub async fn get(&self, id: PromptId) -> Result<Option<Prompt>> {
        let row: Option<PromptRow> =
            sqlx::query_as("SELECT * FROM prompts WHERE id = ?").bind(id.to_string()).fetch_optional(&self.pool).await?;
        row.map(Prompt::try_from).transpose()
    }

    /// Resolve a prompt by content hash alone, used when a caller only has
    /// the hash (e.g. `CONTENT_GENERATION` job params). Multiple names can
    /// legitimately share a content hash; this returns the oldest match.
    pub async fn get_by_hash(&self, content_hash: &str) -> Result<Option<Prompt>> {
        let row: Option<PromptRow> = sqlx::query_as(
            "SELECT * FROM prompts WHERE content_hash = ? ORDER BY created_at LIMIT 1",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Prompt::try_from).transpose()
    }

    pub async fn get_by_name_and_hash(&self, name: &str, content_hash: &str) -> Result<Option<Prompt>> {
        let row: Option<PromptRow> = sqlx::query_as("SELECT * FROM prompts WHERE name = ? AND content_hash = ?")
            .bind(name)
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Prompt::try_from).transpose()
    }

    pub async fn list_by_name(&self, name: &str) -> Result<Vec<Prompt>> {
        let rows: Vec<PromptRow> = sqlx::query_as("SELECT * FROM prompts WHERE name = ? ORDER BY created_at")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Prompt::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_collapses_identical_content_under_same_name() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let store = PromptStore::new(pool);
        let a = store.ensure("company_summary_system", PromptRole::System, None, "Summarize the filing.").await.unwrap();
        let b = store.ensure("company_summary_system", PromptRole::System, Some("unused"), "Summarize the filing.").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.list_by_name("company_summary_system").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ensure_creates_a_new_record_when_content_changes() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let store = PromptStore::new(pool);
        let a = store.ensure("company_summary_system", PromptRole::System, None, "v1").await.unwrap();
        let b = store.ensure("company_summary_system", PromptRole::System, None, "v2").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list_by_name("company_summary_system").await.unwrap().len(), 2);
    }
}
