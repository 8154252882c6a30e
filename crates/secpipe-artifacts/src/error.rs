use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("would introduce a cycle in the generated-content source graph")]
    Cycle,

    #[error("ambiguous short hash {0:?} matches more than one row")]
    AmbiguousHash(String),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
