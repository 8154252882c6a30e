//! Document store.
//!
//! Document content can be large (full filing sections), so the content
//! column is loaded lazily: `DocumentStore::get` never selects it, while
//! the content hash is always present on the header. Call
//! `DocumentStore::load_content` when the text itself is actually needed.

use chrono::{DateTime, Utc};
use secpipe_core::{hashing, CompanyId, DocumentId, DocumentType, FilingId};
use secpipe_db::DbPool;
use sqlx::FromRow;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct DocumentHeaderRow {
    id: String,
    filing_id: String,
    company_id: String,
    title: Option<String>,
    document_type: String,
    content_hash: String,
    created_at: DateTime<Utc>,
}

/// A document without its (potentially large) text content loaded.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub filing_id: FilingId,
    pub company_id: CompanyId,
    pub title: Option<String>,
    pub document_type: DocumentType,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DocumentHeaderRow> for Document {
    type Error = ArtifactError;

    fn try_from(row: DocumentHeaderRow) -> Result<Self> {
        Ok(Self {
            id: DocumentId::parse(&row.id).map_err(|e| ArtifactError::Invalid("document id", e.to_string()))?,
            filing_id: FilingId::parse(&row.filing_id)
                .map_err(|e| ArtifactError::Invalid("filing id", e.to_string()))?,
            company_id: CompanyId::parse(&row.company_id)
                .map_err(|e| ArtifactError::Invalid("company id", e.to_string()))?,
            title: row.title,
            document_type: row
                .document_type
                .parse()
                .map_err(|e: String| ArtifactError::Invalid("document type", e))?,
            content_hash: row.content_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DocumentUpsert {
    pub filing_id: FilingId,
    pub company_id: CompanyId,
    pub title: Option<String>,
    pub document_type: DocumentType,
    pub content: String,
}

#[derive(Clone)]
pub struct DocumentStore {
    pool: DbPool,
}

impl DocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upsert a document within a filing, keyed on (filing, document_type) —
    /// re-ingesting the same filing replaces the section text in place so
    /// the content hash always reflects the latest fetch.
    pub async fn upsert(&self, data: DocumentUpsert) -> Result<Document> {
        let content_hash = hashing::content_hash(&data.content);
        let existing: Option<DocumentHeaderRow> = sqlx::query_as(
            "SELECT id, filing_id, company_id, title, document_type, content_hash, created_at
             FROM documents WHERE filing_id = ? AND document_type = ?",
        )
        .bind(data.filing_id.to_string())
        .bind(data.document_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(existing) = existing {
            sqlx::query("UPDATE documents SET title = ?, content = ?, content_hash = ? WHERE id = ?")
                .bind(&data.title)
                .bind(&data.content)
                .bind(&content_hash)
                .bind(&existing.id)
                .execute(&self.pool)
                .await?;
            let id = DocumentId::parse(&existing.id)
                .map_err(|e| ArtifactError::Invalid("document id", e.to_string()))?;
            return self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("document", existing.id));
        }

        let id = DocumentId::new();
        sqlx::query(
            r#"
            INSERT INTO documents (id, filing_id, company_id, title, document_type, content, content_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(data.filing_id.to_string())
        .bind(data.company_id.to_string())
        .bind(&data.title)
        .bind(data.document_type.as_str())
        .bind(&data.content)
        .bind(&content_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("document", id.to_string()))
    }

    pub async fn get(&self, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<DocumentHeaderRow> = sqlx::query_as(
            "SELECT id, filing_id, company_id, title, document_type, content_hash, created_at
             FROM documents WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    pub async fn get_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        let row: Option<DocumentHeaderRow> = sqlx::query_as(
            "SELECT id, filing_id, company_id, title, document_type, content_hash, created_at
             FROM documents WHERE content_hash = ?",
        )
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    /// First document of `document_type` belonging to `filing_id`, if any.
    pub async fn find_for_filing(
        &self,
        filing_id: FilingId,
        document_type: DocumentType,
    ) -> Result<Option<Document>> {
        let row: Option<DocumentHeaderRow> = sqlx::query_as(
            "SELECT id, filing_id, company_id, title, document_type, content_hash, created_at
             FROM documents WHERE filing_id = ? AND document_type = ?",
        )
        .bind(filing_id.to_string())
        .bind(document_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    pub async fn load_content(&self, id: DocumentId) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT content FROM documents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(content,)| content)
            .ok_or_else(|| ArtifactError::NotFound("document", id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::{CompanyStore, CompanyUpsert};
    use crate::filing::{FilingStore, FilingUpsert};
    use chrono::NaiveDate;

    async fn seed_filing() -> (DbPool, FilingId, CompanyId) {
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
        (pool, filing.id, company.id)
    }

    #[tokio::test]
    async fn hash_is_always_present_but_content_is_lazy() {
        let (pool, filing_id, company_id) = seed_filing().await;
        let store = DocumentStore::new(pool);
        let doc = store
            .upsert(DocumentUpsert {
                filing_id,
                company_id,
                title: Some("Risk Factors".into()),
                document_type: DocumentType::RiskFactors,
                content: "Our business faces risks.".into(),
            })
            .await
            .unwrap();
        assert_eq!(doc.content_hash, hashing::content_hash("Our business faces risks."));
        let content = store.load_content(doc.id).await.unwrap();
        assert_eq!(content, "Our business faces risks.");
    }

    #[tokio::test]
    async fn reingesting_same_section_updates_hash_in_place() {
        let (pool, filing_id, company_id) = seed_filing().await;
        let store = DocumentStore::new(pool);
        let first = store
            .upsert(DocumentUpsert {
                filing_id,
                company_id,
                title: None,
                document_type: DocumentType::RiskFactors,
                content: "v1".into(),
            })
            .await
            .unwrap();
        let second = store
            .upsert(DocumentUpsert {
                filing_id,
                company_id,
                title: None,
                document_type: DocumentType::RiskFactors,
                content: "v2".into(),
            })
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_ne!(first.content_hash, second.content_hash);
    }
}
