//! Generated content store — the pipeline's central artifact.
//!
//! A `GeneratedContent` row is content-addressed by the SHA-256 of its
//! text, and carries provenance: which documents and/or prior generated
//! content it was summarized from, and which prompt/model config produced
//! it. The source relationship is a DAG; `insert` walks the candidate's
//! proposed sources before writing to reject anything that would close a
//! cycle.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use secpipe_core::{
    hashing, CompanyId, ContentStage, DocumentId, GeneratedContentId, ModelConfigId, PromptId,
    SourceType,
};
use secpipe_db::DbPool;
use sqlx::FromRow;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct GeneratedContentRow {
    id: String,
    content: String,
    summary: Option<String>,
    company_id: Option<String>,
    company_group_slug: Option<String>,
    document_type: Option<String>,
    form_type: Option<String>,
    content_stage: String,
    source_type: String,
    system_prompt_id: String,
    model_config_id: String,
    total_duration_seconds: f64,
    input_tokens: i64,
    output_tokens: i64,
    warning: Option<String>,
    content_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub id: GeneratedContentId,
    pub content: String,
    pub summary: Option<String>,
    pub company_id: Option<CompanyId>,
    pub company_group_slug: Option<String>,
    pub document_type: Option<String>,
    pub form_type: Option<String>,
    pub content_stage: ContentStage,
    pub source_type: SourceType,
    pub system_prompt_id: PromptId,
    pub model_config_id: ModelConfigId,
    pub total_duration_seconds: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub warning: Option<String>,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GeneratedContentRow> for GeneratedContent {
    type Error = ArtifactError;

    fn try_from(row: GeneratedContentRow) -> Result<Self> {
        Ok(Self {
            id: GeneratedContentId::parse(&row.id)
                .map_err(|e| ArtifactError::Invalid("generated content id", e.to_string()))?,
            content: row.content,
            summary: row.summary,
            company_id: row
                .company_id
                .map(|c| CompanyId::parse(&c))
                .transpose()
                .map_err(|e| ArtifactError::Invalid("company id", e.to_string()))?,
            company_group_slug: row.company_group_slug,
            document_type: row.document_type,
            form_type: row.form_type,
            content_stage: row
                .content_stage
                .parse()
                .map_err(|e: String| ArtifactError::Invalid("content stage", e))?,
            source_type: row
                .source_type
                .parse()
                .map_err(|e: String| ArtifactError::Invalid("source type", e))?,
            system_prompt_id: PromptId::parse(&row.system_prompt_id)
                .map_err(|e| ArtifactError::Invalid("prompt id", e.to_string()))?,
            model_config_id: ModelConfigId::parse(&row.model_config_id)
                .map_err(|e| ArtifactError::Invalid("model config id", e.to_string()))?,
            total_duration_seconds: row.total_duration_seconds,
            input_tokens: row.input_tokens,
            output_tokens: row.output_tokens,
            warning: row.warning,
            content_hash: row.content_hash,
            created_at: row.created_at,
        })
    }
}

/// The provenance a new piece of generated content is built from: either
/// a set of source documents (Stage A) or a set of prior generated
/// content (Stage B/C and the company-group stages).
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub documents: Vec<DocumentId>,
    pub generated_content: Vec<GeneratedContentId>,
}

#[derive(Debug, Clone)]
pub struct GeneratedContentDraft {
    pub content: String,
    pub summary: Option<String>,
    pub company_id: Option<CompanyId>,
    pub company_group_slug: Option<String>,
    pub document_type: Option<String>,
    pub form_type: Option<String>,
    pub content_stage: ContentStage,
    pub sources: Sources,
    pub system_prompt_id: PromptId,
    pub model_config_id: ModelConfigId,
    pub total_duration_seconds: f64,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub warning: Option<String>,
}

/// Outcome of `GeneratedContentStore::insert`: whether a new row was
/// created, or an existing row with the same content hash was returned.
pub struct InsertOutcome {
    pub content: GeneratedContent,
    pub was_created: bool,
}

#[derive(Clone)]
pub struct GeneratedContentStore {
    pool: DbPool,
}

impl GeneratedContentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert new generated content, or return the existing row if one
    /// already has this exact content hash. Rejects source sets that
    /// would close a cycle in the generated-content DAG.
    pub async fn insert(&self, draft: GeneratedContentDraft) -> Result<InsertOutcome> {
        let content_hash = hashing::content_hash(&draft.content);
        if let Some(existing) = self.get_by_hash(&content_hash).await? {
            self.link_sources(existing.id, &draft.sources).await?;
            return Ok(InsertOutcome { content: existing, was_created: false });
        }

        for source_id in &draft.sources.generated_content {
            if self.is_own_ancestor(*source_id).await? {
                return Err(ArtifactError::Cycle);
            }
        }

        let source_type = if draft.sources.generated_content.is_empty() {
            SourceType::Documents
        } else {
            SourceType::GeneratedContent
        };

        let id = GeneratedContentId::new();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO generated_content (
                id, content, summary, company_id, company_group_slug, document_type, form_type,
                content_stage, source_type, system_prompt_id, model_config_id,
                total_duration_seconds, input_tokens, output_tokens, warning, content_hash, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&draft.content)
        .bind(&draft.summary)
        .bind(draft.company_id.map(|c| c.to_string()))
        .bind(&draft.company_group_slug)
        .bind(&draft.document_type)
        .bind(&draft.form_type)
        .bind(draft.content_stage.as_str())
        .bind(source_type.as_str())
        .bind(draft.system_prompt_id.to_string())
        .bind(draft.model_config_id.to_string())
        .bind(draft.total_duration_seconds)
        .bind(draft.input_tokens)
        .bind(draft.output_tokens)
        .bind(&draft.warning)
        .bind(&content_hash)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        for document_id in &draft.sources.documents {
            sqlx::query(
                "INSERT OR IGNORE INTO generated_content_documents (content_id, document_id) VALUES (?, ?)",
            )
            .bind(id.to_string())
            .bind(document_id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        for source_id in &draft.sources.generated_content {
            sqlx::query(
                "INSERT OR IGNORE INTO generated_content_sources (content_id, source_content_id) VALUES (?, ?)",
            )
            .bind(id.to_string())
            .bind(source_id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let content =
            self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("generated content", id.to_string()))?;
        Ok(InsertOutcome { content, was_created: true })
    }

    /// Record provenance for a content hash that already existed: a
    /// different document or source set can still summarize to
    /// byte-identical output, and that link must be recorded even though
    /// no new row is written.
    async fn link_sources(&self, content_id: GeneratedContentId, sources: &Sources) -> Result<()> {
        for document_id in &sources.documents {
            sqlx::query(
                "INSERT OR IGNORE INTO generated_content_documents (content_id, document_id) VALUES (?, ?)",
            )
            .bind(content_id.to_string())
            .bind(document_id.to_string())
            .execute(&self.pool)
            .await?;
        }
        for source_id in &sources.generated_content {
            sqlx::query(
                "INSERT OR IGNORE INTO generated_content_sources (content_id, source_content_id) VALUES (?, ?)",
            )
            .bind(content_id.to_string())
            .bind(source_id.to_string())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// True if `node` is reachable from itself by walking the source
    /// edges already committed to the table. Every edge this store writes
    /// points from a brand-new id to strictly pre-existing ids, so a
    /// well-formed graph can never satisfy this; it exists to catch
    /// corrupted provenance data before it's compounded by a new insert.
    async fn is_own_ancestor(&self, node: GeneratedContentId) -> Result<bool> {
        let mut visited = HashSet::new();
        for start in self.list_sources(node).await? {
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                if current == node {
                    return Ok(true);
                }
                if !visited.insert(current) {
                    continue;
                }
                for next in self.list_sources(current).await? {
                    stack.push(next);
                }
            }
        }
        Ok(false)
    }

    async fn list_sources(&self, content_id: GeneratedContentId) -> Result<Vec<GeneratedContentId>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT source_content_id FROM generated_content_sources WHERE content_id = ?",
        )
        .bind(content_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(s,)| GeneratedContentId::parse(&s).map_err(|e| ArtifactError::Invalid("generated content id", e.to_string())))
            .collect()
    }

    pub async fn get(&self, id: GeneratedContentId) -> Result<Option<GeneratedContent>> {
        let row: Option<GeneratedContentRow> =
            sqlx::query_as("SELECT * FROM generated_content WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(GeneratedContent::try_from).transpose()
    }

    pub async fn get_by_hash(&self, content_hash: &str) -> Result<Option<GeneratedContent>> {
        let row: Option<GeneratedContentRow> =
            sqlx::query_as("SELECT * FROM generated_content WHERE content_hash = ?")
                .bind(content_hash)
                .fetch_optional(&self.pool)
                .await?;
        row.map(GeneratedContent::try_from).transpose()
    }

    /// Existing single-summary content for a document under the same
    /// prompt and model config, used by Stage A to skip regenerating
    /// unchanged summaries unless `force` is set.
    pub async fn find_existing_content_for_document(
        &self,
        document_id: DocumentId,
        system_prompt_id: PromptId,
        model_config_id: ModelConfigId,
    ) -> Result<Option<GeneratedContent>> {
        let row: Option<GeneratedContentRow> = sqlx::query_as(
            r#"
            SELECT gc.* FROM generated_content gc
            JOIN generated_content_documents gcd ON gcd.content_id = gc.id
            WHERE gcd.document_id = ? AND gc.system_prompt_id = ? AND gc.model_config_id = ?
              AND gc.content_stage = 'single_summary'
            "#,
        )
        .bind(document_id.to_string())
        .bind(system_prompt_id.to_string())
        .bind(model_config_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(GeneratedContent::try_from).transpose()
    }

    /// Existing content keyed on (system_prompt_id, model_config_id, the
    /// exact ordered source document set), used by aggregate/frontpage
    /// stages to detect whether their inputs have already been summarized
    /// together before.
    pub async fn find_existing_for_source_documents(
        &self,
        document_ids: &[DocumentId],
        system_prompt_id: PromptId,
        model_config_id: ModelConfigId,
    ) -> Result<Option<GeneratedContent>> {
        if document_ids.is_empty() {
            return Ok(None);
        }
        let candidates: Vec<GeneratedContentRow> = sqlx::query_as(
            "SELECT * FROM generated_content WHERE system_prompt_id = ? AND model_config_id = ?",
        )
        .bind(system_prompt_id.to_string())
        .bind(model_config_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut wanted: Vec<String> = document_ids.iter().map(|d| d.to_string()).collect();
        wanted.sort();

        for row in candidates {
            let id = GeneratedContentId::parse(&row.id)
                .map_err(|e| ArtifactError::Invalid("generated content id", e.to_string()))?;
            let mut actual = self.list_source_documents(id).await?;
            actual.sort();
            if actual == wanted {
                return Ok(Some(GeneratedContent::try_from(row)?));
            }
        }
        Ok(None)
    }

    /// Symmetric pre-check for the aggregate/frontpage stages: existing
    /// content keyed on (system_prompt_id, model_config_id, exact ordered
    /// set of source generated_content). Lets Stage B/C skip an LLM call
    /// when their sources have already produced output, the same
    /// optimization `find_existing_for_source_documents` gives Stage A.
    pub async fn find_existing_for_source_content(
        &self,
        source_ids: &[GeneratedContentId],
        system_prompt_id: PromptId,
        model_config_id: ModelConfigId,
    ) -> Result<Option<GeneratedContent>> {
        if source_ids.is_empty() {
            return Ok(None);
        }
        let candidates: Vec<GeneratedContentRow> = sqlx::query_as(
            "SELECT * FROM generated_content WHERE system_prompt_id = ? AND model_config_id = ?",
        )
        .bind(system_prompt_id.to_string())
        .bind(model_config_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut wanted: Vec<String> = source_ids.iter().map(|s| s.to_string()).collect();
        wanted.sort();

        for row in candidates {
            let id = GeneratedContentId::parse(&row.id)
                .map_err(|e| ArtifactError::Invalid("generated content id", e.to_string()))?;
            let mut actual: Vec<String> = self.list_sources(id).await?.into_iter().map(|s| s.to_string()).collect();
            actual.sort();
            if actual == wanted {
                return Ok(Some(GeneratedContent::try_from(row)?));
            }
        }
        Ok(None)
    }

    /// Most recent content of `content_stage` for a company, newest first,
    /// used to gather source material for the cross-company stage.
    pub async fn list_recent_for_company(
        &self,
        company_id: CompanyId,
        content_stage: ContentStage,
        limit: i64,
    ) -> Result<Vec<GeneratedContent>> {
        let rows: Vec<GeneratedContentRow> = sqlx::query_as(
            "SELECT * FROM generated_content WHERE company_id = ? AND content_stage = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(company_id.to_string())
        .bind(content_stage.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(GeneratedContent::try_from).collect()
    }

    pub async fn list_source_documents(&self, content_id: GeneratedContentId) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT document_id FROM generated_content_documents WHERE content_id = ?",
        )
        .bind(content_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }

    pub async fn list_source_content(&self, content_id: GeneratedContentId) -> Result<Vec<GeneratedContentId>> {
        self.list_sources(content_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{CompanyStore, CompanyUpsert};
    use crate::document::{DocumentStore, DocumentUpsert};
    use crate::filing::{FilingStore, FilingUpsert};
    use crate::model_config::ModelConfigStore;
    use crate::prompt::PromptStore;
    use chrono::NaiveDate;
    use secpipe_core::{DocumentType, PromptRole};

    async fn seed() -> (DbPool, DocumentId, PromptId, ModelConfigId) {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let company = CompanyStore::new(pool.clone())
            .upsert(CompanyUpsert {
                ticker: "AAPL".into(),
                name: "Apple".into(),
                exchanges: vec![],
                industry_code: None,
                fiscal_year_end: None,
            })
            .await
            .unwrap();
        let filing = FilingStore::new(pool.clone())
            .upsert(FilingUpsert {
                company_id: company.id,
                accession_number: "acc-1".into(),
                form_type: "10-K".into(),
                filing_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                period_of_report: None,
                source_url: None,
            })
            .await
            .unwrap();
        let document = DocumentStore::new(pool.clone())
            .upsert(DocumentUpsert {
                filing_id: filing.id,
                company_id: company.id,
                title: None,
                document_type: DocumentType::RiskFactors,
                content: "Risk text.".into(),
            })
            .await
            .unwrap();
        let prompt = PromptStore::new(pool.clone())
            .ensure("single_summary_system", PromptRole::System, None, "Summarize this section.")
            .await
            .unwrap();
        let model_config = ModelConfigStore::new(pool.clone())
            .ensure("gpt-4o", &serde_json::json!({}))
            .await
            .unwrap();
        (pool, document.id, prompt.id, model_config.id)
    }

    #[tokio::test]
    async fn insert_is_idempotent_by_content_hash() {
        let (pool, document_id, prompt_id, model_config_id) = seed().await;
        let store = GeneratedContentStore::new(pool);
        let draft = || GeneratedContentDraft {
            content: "Summary text.".into(),
            summary: None,
            company_id: None,
            company_group_slug: None,
            document_type: Some("risk_factors".into()),
            form_type: Some("10-K".into()),
            content_stage: ContentStage::SingleSummary,
            sources: Sources { documents: vec![document_id], generated_content: vec![] },
            system_prompt_id: prompt_id,
            model_config_id,
            total_duration_seconds: 1.5,
            input_tokens: 100,
            output_tokens: 50,
            warning: None,
        };

        let first = store.insert(draft()).await.unwrap();
        assert!(first.was_created);
        let second = store.insert(draft()).await.unwrap();
        assert!(!second.was_created);
        assert_eq!(first.content.id, second.content.id);
    }

    #[tokio::test]
    async fn find_existing_content_for_document_locates_single_summary() {
        let (pool, document_id, prompt_id, model_config_id) = seed().await;
        let store = GeneratedContentStore::new(pool);
        store
            .insert(GeneratedContentDraft {
                content: "Summary text.".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: Some("risk_factors".into()),
                form_type: Some("10-K".into()),
                content_stage: ContentStage::SingleSummary,
                sources: Sources { documents: vec![document_id], generated_content: vec![] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await
            .unwrap();

        let found = store
            .find_existing_content_for_document(document_id, prompt_id, model_config_id)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn insert_allows_legitimate_diamond_provenance() {
        let (pool, document_id, prompt_id, model_config_id) = seed().await;
        let store = GeneratedContentStore::new(pool);
        let base = store
            .insert(GeneratedContentDraft {
                content: "Base summary.".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: Some("risk_factors".into()),
                form_type: Some("10-K".into()),
                content_stage: ContentStage::SingleSummary,
                sources: Sources { documents: vec![document_id], generated_content: vec![] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await
            .unwrap()
            .content;

        let aggregate = store
            .insert(GeneratedContentDraft {
                content: "Aggregate summary.".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: None,
                form_type: Some("10-K".into()),
                content_stage: ContentStage::AggregateSummary,
                sources: Sources { documents: vec![], generated_content: vec![base.id] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await
            .unwrap()
            .content;

        // A frontpage summary sourcing both `base` and `aggregate` (which
        // itself already sources `base`) is a diamond, not a cycle, and
        // must be allowed.
        let result = store
            .insert(GeneratedContentDraft {
                content: "Frontpage summary.".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: None,
                form_type: Some("10-K".into()),
                content_stage: ContentStage::FrontpageSummary,
                sources: Sources { documents: vec![], generated_content: vec![base.id, aggregate.id] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn insert_rejects_a_source_that_is_corrupted_into_its_own_ancestor() {
        let (pool, document_id, prompt_id, model_config_id) = seed().await;
        let store = GeneratedContentStore::new(pool.clone());
        let a = store
            .insert(GeneratedContentDraft {
                content: "A".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: Some("risk_factors".into()),
                form_type: Some("10-K".into()),
                content_stage: ContentStage::SingleSummary,
                sources: Sources { documents: vec![document_id], generated_content: vec![] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await
            .unwrap()
            .content;
        let b = store
            .insert(GeneratedContentDraft {
                content: "B".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: None,
                form_type: Some("10-K".into()),
                content_stage: ContentStage::AggregateSummary,
                sources: Sources { documents: vec![], generated_content: vec![a.id] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await
            .unwrap()
            .content;

        // Simulate corrupted provenance data: wire `a` back to `b`,
        // closing a 2-cycle (a -> nothing normally, but now b -> a -> b).
        sqlx::query("INSERT INTO generated_content_sources (content_id, source_content_id) VALUES (?, ?)")
            .bind(a.id.to_string())
            .bind(b.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let result = store
            .insert(GeneratedContentDraft {
                content: "C".into(),
                summary: None,
                company_id: None,
                company_group_slug: None,
                document_type: None,
                form_type: Some("10-K".into()),
                content_stage: ContentStage::FrontpageSummary,
                sources: Sources { documents: vec![], generated_content: vec![a.id] },
                system_prompt_id: prompt_id,
                model_config_id,
                total_duration_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 5,
                warning: None,
            })
            .await;
        assert!(matches!(result, Err(ArtifactError::Cycle)));
    }
}
