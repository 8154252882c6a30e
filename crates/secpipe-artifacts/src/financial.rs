//! Financial concept and value stores.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use secpipe_core::{CompanyId, FilingId, FinancialConceptId, FinancialValueId};
use secpipe_db::DbPool;
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{ArtifactError, Result};

#[derive(Debug, Clone, FromRow)]
struct FinancialConceptRow {
    id: String,
    name: String,
    description: Option<String>,
    labels: String,
}

#[derive(Debug, Clone)]
pub struct FinancialConcept {
    pub id: FinancialConceptId,
    pub name: String,
    pub description: Option<String>,
    pub labels: BTreeSet<String>,
}

impl TryFrom<FinancialConceptRow> for FinancialConcept {
    type Error = ArtifactError;

    fn try_from(row: FinancialConceptRow) -> Result<Self> {
        Ok(Self {
            id: FinancialConceptId::parse(&row.id)
                .map_err(|e| ArtifactError::Invalid("financial concept id", e.to_string()))?,
            name: row.name,
            description: row.description,
            labels: serde_json::from_str(&row.labels)?,
        })
    }
}

#[derive(Clone)]
pub struct FinancialConceptStore {
    pool: DbPool,
}

impl FinancialConceptStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Merge a concept by name: if one already exists, union its labels
    /// with the supplied set rather than overwriting them.
    pub async fn merge(
        &self,
        name: &str,
        description: Option<&str>,
        labels: &BTreeSet<String>,
    ) -> Result<FinancialConcept> {
        if let Some(existing) = self.get_by_name(name).await? {
            let merged: BTreeSet<String> = existing.labels.union(labels).cloned().collect();
            sqlx::query("UPDATE financial_concepts SET labels = ?, description = COALESCE(?, description) WHERE id = ?")
                .bind(serde_json::to_string(&merged)?)
                .bind(description)
                .bind(existing.id.to_string())
                .execute(&self.pool)
                .await?;
            return self
                .get(existing.id)
                .await?
                .ok_or_else(|| ArtifactError::NotFound("financial concept", existing.id.to_string()));
        }

        let id = FinancialConceptId::new();
        sqlx::query("INSERT INTO financial_concepts (id, name, description, labels) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(description)
            .bind(serde_json::to_string(labels)?)
            .execute(&self.pool)
            .await?;
        self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("financial concept", id.to_string()))
    }

    pub async fn get(&self, id: FinancialConceptId) -> Result<Option<FinancialConcept>> {
        let row: Option<FinancialConceptRow> =
            sqlx::query_as("SELECT * FROM financial_concepts WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(FinancialConcept::try_from).transpose()
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<FinancialConcept>> {
        let row: Option<FinancialConceptRow> =
            sqlx::query_as("SELECT * FROM financial_concepts WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        row.map(FinancialConcept::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<FinancialConcept>> {
        let rows: Vec<FinancialConceptRow> =
            sqlx::query_as("SELECT * FROM financial_concepts ORDER BY name").fetch_all(&self.pool).await?;
        rows.into_iter().map(FinancialConcept::try_from).collect()
    }
}

#[derive(Debug, Clone, FromRow)]
struct FinancialValueRow {
    id: String,
    company_id: String,
    concept_id: String,
    value_date: NaiveDate,
    filing_id: Option<String>,
    value: String,
}

#[derive(Debug, Clone)]
pub struct FinancialValue {
    pub id: FinancialValueId,
    pub company_id: CompanyId,
    pub concept_id: FinancialConceptId,
    pub value_date: NaiveDate,
    pub filing_id: Option<FilingId>,
    pub value: Decimal,
}

impl TryFrom<FinancialValueRow> for FinancialValue {
    type Error = ArtifactError;

    fn try_from(row: FinancialValueRow) -> Result<Self> {
        Ok(Self {
            id: FinancialValueId::parse(&row.id)
                .map_err(|e| ArtifactError::Invalid("financial value id", e.to_string()))?,
            company_id: CompanyId::parse(&row.company_id)
                .map_err(|e| ArtifactError::Invalid("company id", e.to_string()))?,
            concept_id: FinancialConceptId::parse(&row.concept_id)
                .map_err(|e| ArtifactError::Invalid("financial concept id", e.to_string()))?,
            value_date: row.value_date,
            filing_id: row
                .filing_id
                .map(|f| FilingId::parse(&f))
                .transpose()
                .map_err(|e| ArtifactError::Invalid("filing id", e.to_string()))?,
            value: Decimal::from_str(&row.value)
                .map_err(|e| ArtifactError::Invalid("financial value", e.to_string()))?,
        })
    }
}

#[derive(Clone)]
pub struct FinancialValueStore {
    pool: DbPool,
}

impl FinancialValueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upsert on (company, concept, value_date, filing-or-null).
    pub async fn upsert(
        &self,
        company_id: CompanyId,
        concept_id: FinancialConceptId,
        value_date: NaiveDate,
        filing_id: Option<FilingId>,
        value: Decimal,
    ) -> Result<FinancialValue> {
        let existing: Option<FinancialValueRow> = sqlx::query_as(
            r#"
            SELECT * FROM financial_values
            WHERE company_id = ? AND concept_id = ? AND value_date = ?
              AND COALESCE(filing_id, '') = COALESCE(?, '')
            "#,
        )
        .bind(company_id.to_string())
        .bind(concept_id.to_string())
        .bind(value_date)
        .bind(filing_id.map(|f| f.to_string()))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(existing) = existing {
            sqlx::query("UPDATE financial_values SET value = ? WHERE id = ?")
                .bind(value.to_string())
                .bind(&existing.id)
                .execute(&self.pool)
                .await?;
            let id = FinancialValueId::parse(&existing.id)
                .map_err(|e| ArtifactError::Invalid("financial value id", e.to_string()))?;
            return self
                .get(id)
                .await?
                .ok_or_else(|| ArtifactError::NotFound("financial value", existing.id));
        }

        let id = FinancialValueId::new();
        sqlx::query(
            "INSERT INTO financial_values (id, company_id, concept_id, value_date, filing_id, value) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(company_id.to_string())
        .bind(concept_id.to_string())
        .bind(value_date)
        .bind(filing_id.map(|f| f.to_string()))
        .bind(value.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or_else(|| ArtifactError::NotFound("financial value", id.to_string()))
    }

    pub async fn get(&self, id: FinancialValueId) -> Result<Option<FinancialValue>> {
        let row: Option<FinancialValueRow> =
            sqlx::query_as("SELECT * FROM financial_values WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(FinancialValue::try_from).transpose()
    }

    pub async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<FinancialValue>> {
        let rows: Vec<FinancialValueRow> = sqlx::query_as(
            "SELECT * FROM financial_values WHERE company_id = ? ORDER BY value_date DESC",
        )
        .bind(company_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FinancialValue::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merge_unions_labels_instead_of_overwriting() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let store = FinancialConceptStore::new(pool);
        let mut labels_a = BTreeSet::new();
        labels_a.insert("balance_sheet".to_string());
        let a = store.merge("Revenue", Some("Total revenue"), &labels_a).await.unwrap();
        assert_eq!(a.labels.len(), 1);

        let mut labels_b = BTreeSet::new();
        labels_b.insert("income_statement".to_string());
        let b = store.merge("Revenue", None, &labels_b).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.labels.len(), 2);
        assert_eq!(b.description.as_deref(), Some("Total revenue"));
    }

    #[tokio::test]
    async fn upsert_keys_on_company_concept_date_and_filing() {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        let concepts = FinancialConceptStore::new(pool.clone());
        let concept = concepts.merge("Revenue", None, &BTreeSet::new()).await.unwrap();
        let companies = crate::company::CompanyStore::new(pool.clone());
        let company = companies
            .upsert(crate::company::CompanyUpsert {
                ticker: "ACME".to_string(),
                name: "Acme Corp".to_string(),
                exchanges: vec!["NYSE".to_string()],
                industry_code: None,
                fiscal_year_end: None,
            })
            .await
            .unwrap();
        let company_id = company.id;
        let values = FinancialValueStore::new(pool);
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

        let a = values
            .upsert(company_id, concept.id, date, None, Decimal::from_str("1000.50").unwrap())
            .await
            .unwrap();
        let b = values
            .upsert(company_id, concept.id, date, None, Decimal::from_str("2000.75").unwrap())
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.value, Decimal::from_str("2000.75").unwrap());
        assert_eq!(values.list_for_company(company_id).await.unwrap().len(), 1);
    }
}
