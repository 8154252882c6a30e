use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("timeout after {0}s")]
    Timeout(f64),
    #[error("upstream error: {0}")]
    Upstream(String),
}
