//! Company store.

use chrono::{DateTime, Utc};
use secpipe_core::CompanyId;
use secpipe_db::DbPool;
use sqlx::FromRow;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct CompanyRow {
    id: String,
    ticker: String,
    name: String,
    exchanges: String,
    industry_code: Option<String>,
    fiscal_year_end: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Company {
    pub id: CompanyId,
    pub ticker: String,
    pub name: String,
    pub exchanges: Vec<String>,
    pub industry_code: Option<String>,
    pub fiscal_year_end: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = ArtifactError;

    fn try_from(row: CompanyRow) -> Result<Self> {
        Ok(Self {
            id: CompanyId::parse(&row.id).map_err(|e| ArtifactError::Invalid("company id", e.to_string()))?,
            ticker: row.ticker,
            name: row.name,
            exchanges: serde_json::from_str(&row.exchanges)?,
            industry_code: row.industry_code,
            fiscal_year_end: row.fiscal_year_end,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields an ingestion source supplies when upserting a company.
#[derive(Debug, Clone)]
pub struct CompanyUpsert {
    pub ticker: String,
    pub name: String,
    pub exchanges: Vec<String>,
    pub industry_code: Option<String>,
    pub fiscal_year_end: Option<String>,
}

#[derive(Clone)]
pub struct CompanyStore {
    pool: DbPool,
}

impl CompanyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a company, or update it in place if the ticker already exists.
    /// Tickers are stored uppercase, matching the "ticker (unique, uppercase)"
    /// attribute in the data model.
    pub async fn upsert(&self, data: CompanyUpsert) -> Result<Company> {
        let ticker = data.ticker.to_uppercase();
        if let Some(existing) = self.get_by_ticker(&ticker).await? {
            let now = Utc::now();
            sqlx::query(
                r#"
                UPDATE companies
                SET name = ?, exchanges = ?, industry_code = ?, fiscal_year_end = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&data.name)
            .bind(serde_json::to_string(&data.exchanges)?)
            .bind(&data.industry_code)
            .bind(&data.fiscal_year_end)
            .bind(now)
            .bind(existing.id.to_string())
            .execute(&self.pool)
            .await?;
            return self.get(existing.id).await?.ok_or_else(|| {
                ArtifactError::NotFound("company", existing.id.to_string())
            });
        }

        let id = secpipe_core::CompanyId::new();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO companies (id, ticker, name, exchanges, industry_code, fiscal_year_end, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&ticker)
        .bind(&data.name)
        .bind(serde_json::to_string(&data.exchanges)?)
        .bind(&data.industry_code)
        .bind(&data.fiscal_year_end)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| ArtifactError::NotFound("company", id.to_string()))
    }

    pub async fn get(&self, id: CompanyId) -> Result<Option<Company>> {
        let row: Option<CompanyRow> = sqlx::query_as("SELECT * FROM companies WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Company::try_from).transpose()
    }

    pub async fn get_by_ticker(&self, ticker: &str) -> Result<Option<Company>> {
        let row: Option<CompanyRow> =
            sqlx::query_as("SELECT * FROM companies WHERE ticker = ?")
                .bind(ticker.to_uppercase())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Company::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Company>> {
        let rows: Vec<CompanyRow> =
            sqlx::query_as("SELECT * FROM companies ORDER BY ticker").fetch_all(&self.pool).await?;
        rows.into_iter().map(Company::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> CompanyStore {
        CompanyStore::new(secpipe_db::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn upsert_uppercases_ticker_and_is_idempotent_on_ticker() {
        let store = store().await;
        let a = store
            .upsert(CompanyUpsert {
                ticker: "aapl".into(),
                name: "Apple Inc.".into(),
                exchanges: vec!["NASDAQ".into()],
                industry_code: None,
                fiscal_year_end: None,
            })
            .await
            .unwrap();
        assert_eq!(a.ticker, "AAPL");

        let b = store
            .upsert(CompanyUpsert {
                ticker: "AAPL".into(),
                name: "Apple Inc. (renamed)".into(),
                exchanges: vec!["NASDAQ".into()],
                industry_code: Some("3571".into()),
                fiscal_year_end: None,
            })
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.name, "Apple Inc. (renamed)");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
