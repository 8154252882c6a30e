use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("job {0} not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
