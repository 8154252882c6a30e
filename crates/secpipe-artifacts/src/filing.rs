//! Filing store.

use chrono::{DateTime, NaiveDate, Utc};
use secpipe_core::{CompanyId, FilingId};
use secpipe_db::DbPool;
use sqlx::FromRow;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct FilingRow {
    id: String,
    company_id: String,
    accession_number: String,
    form_type: String,
    filing_date: NaiveDate,
    period_of_report: Option<NaiveDate>,
    source_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Filing {
    pub id: FilingId,
    pub company_id: CompanyId,
    pub accession_number: String,
    pub form_type: String,
    pub filing_date: NaiveDate,
    pub period_of_report: Option<NaiveDate>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FilingRow> for Filing {
    type Error = ArtifactError;

    fn try_from(row: FilingRow) -> Result<Self> {
        Ok(Self {
            id: FilingId::parse(&row.id).map_err(|e| ArtifactError::Invalid("filing id", e.to_string()))?,
            company_id: CompanyId::parse(&row.company_id)
                .map_err(|e| ArtifactError::Invalid("company id", e.to_string()))?,
            accession_number: row.accession_number,
            form_type: row.form_type,
            filing_date: row.filing_date,
            period_of_report: row.period_of_report,
            source_url: row.source_url,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FilingUpsert {
    pub company_id: CompanyId,
    pub accession_number: String,
    pub form_type: String,
    pub filing_date: NaiveDate,
    pub period_of_report: Option<NaiveDate>,
    pub source_url: Option<String>,
}

#[derive(Clone)]
pub struct FilingStore {
    pool: DbPool,
}

impl FilingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upsert keyed on the unique accession number, per the data model.
    pub async fn upsert(&self, data: FilingUpsert) -> Result<Filing> {
        if let Some(existing) = self.get_by_accession(&data.accession_number).await? {
            sqlx::query(
                r#"
                UPDATE filings
                SET form_type = ?, filing_date = ?, period_of_report = ?, source_url = ?
                WHERE id = ?
                "#,
            )
            .bind(&data.form_type)
            .bind(data.filing_date)
            .bind(data.period_of_report)
            .bind(&data.source_url)
            .bind(existing.id.to_string())
            .execute(&self.pool)
            .await?;
            return self
                .get(existing.id)
                .await?
                .ok_or_else(|| ArtifactError::NotFound("filing", existing.id.to_string()));
        }

        let id = FilingId::new();
        sqlx::query(
            r#"
            INSERT INTO filings (id, company_id, accession_number, form_type, filing_date, period_of_report, source_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(data.company_id.to_string())
        .bind(&data.accession_number)
        .bind(&data.form_type)
        .bind(data.filing_date)
        .bind(data.period_of_report)
        .bind(&data.source_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("filing", id.to_string()))
    }

    pub async fn get(&self, id: FilingId) -> Result<Option<Filing>> {
        let row: Option<FilingRow> = sqlx::query_as("SELECT * FROM filings WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Filing::try_from).transpose()
    }

    pub async fn get_by_accession(&self, accession_number: &str) -> Result<Option<Filing>> {
        let row: Option<FilingRow> =
            sqlx::query_as("SELECT * FROM filings WHERE accession_number = ?")
                .bind(accession_number)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Filing::try_from).transpose()
    }

    /// Most recent `count` filings of `form_type` for a company, newest first.
    pub async fn list_recent_for_company(
        &self,
        company_id: CompanyId,
        form_type: &str,
        count: i64,
    ) -> Result<Vec<Filing>> {
        let rows: Vec<FilingRow> = sqlx::query_as(
            r#"
            SELECT * FROM filings
            WHERE company_id = ? AND form_type = ?
            ORDER BY filing_date DESC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(company_id.to_string())
        .bind(form_type)
        .bind(count)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Filing::try_from).collect()
    }
}
