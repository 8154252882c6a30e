//! Schema creation.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS` the same way
//! `SchemaStorage::init_tables` lays out the schema-contract tables: a
//! single idempotent batch executed once per pool, safe to call on every
//! process start.

pub const CREATE_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    ticker TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    exchanges TEXT NOT NULL DEFAULT '[]',
    industry_code TEXT,
    fiscal_year_end TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS filings (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    accession_number TEXT NOT NULL UNIQUE,
    form_type TEXT NOT NULL,
    filing_date TEXT NOT NULL,
    period_of_report TEXT,
    source_url TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_filings_company ON filings(company_id);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    filing_id TEXT NOT NULL REFERENCES filings(id) ON DELETE CASCADE,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    title TEXT,
    document_type TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_company ON documents(company_id);
CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(content_hash);

CREATE TABLE IF NOT EXISTS financial_concepts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    labels TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS financial_values (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    concept_id TEXT NOT NULL REFERENCES financial_concepts(id) ON DELETE CASCADE,
    value_date TEXT NOT NULL,
    filing_id TEXT REFERENCES filings(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_financial_values_key
    ON financial_values(company_id, concept_id, value_date, COALESCE(filing_id, ''));

CREATE TABLE IF NOT EXISTS prompts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    description TEXT,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(name, content_hash)
);
CREATE INDEX IF NOT EXISTS idx_prompts_hash ON prompts(content_hash);

CREATE TABLE IF NOT EXISTS model_configs (
    id TEXT PRIMARY KEY,
    model TEXT NOT NULL,
    options_json TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS generated_content (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    summary TEXT,
    company_id TEXT REFERENCES companies(id) ON DELETE CASCADE,
    company_group_slug TEXT,
    document_type TEXT,
    form_type TEXT,
    content_stage TEXT NOT NULL,
    source_type TEXT NOT NULL,
    system_prompt_id TEXT NOT NULL REFERENCES prompts(id),
    model_config_id TEXT NOT NULL REFERENCES model_configs(id),
    total_duration_seconds REAL NOT NULL DEFAULT 0,
    input_tokens INTEGER NOT NULL DEFAULT 0,
    output_tokens INTEGER NOT NULL DEFAULT 0,
    warning TEXT,
    content_hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_generated_content_hash ON generated_content(content_hash);
CREATE INDEX IF NOT EXISTS idx_generated_content_company ON generated_content(company_id);

CREATE TABLE IF NOT EXISTS generated_content_documents (
    content_id TEXT NOT NULL REFERENCES generated_content(id) ON DELETE CASCADE,
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    PRIMARY KEY (content_id, document_id)
);

CREATE TABLE IF NOT EXISTS generated_content_sources (
    content_id TEXT NOT NULL REFERENCES generated_content(id) ON DELETE CASCADE,
    source_content_id TEXT NOT NULL REFERENCES generated_content(id) ON DELETE CASCADE,
    PRIMARY KEY (content_id, source_content_id)
);

CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    job_type TEXT NOT NULL,
    params TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 5,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    updated_at TEXT NOT NULL,
    retry_count INTEGER NOT NULL DEFAULT 0,
    max_retries INTEGER NOT NULL DEFAULT 3,
    worker_id TEXT,
    error TEXT,
    result TEXT
);
CREATE INDEX IF NOT EXISTS idx_jobs_claim ON jobs(status, priority, created_at);
CREATE INDEX IF NOT EXISTS idx_jobs_type ON jobs(job_type);

CREATE TABLE IF NOT EXISTS pipeline_runs (
    id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    forms TEXT NOT NULL,
    trigger_kind TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    jobs_created INTEGER NOT NULL DEFAULT 0,
    jobs_completed INTEGER NOT NULL DEFAULT 0,
    jobs_failed INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    error TEXT,
    run_metadata TEXT NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_pipeline_runs_company ON pipeline_runs(company_id);
"#;
