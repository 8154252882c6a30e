//! Error taxonomy for pipeline stages and handlers.
//!
//! Every variant maps onto one of the four classes from the error-handling
//! design: validation (non-retryable), transient-external (retryable),
//! data-consistency (not actually an error — handled inline by the artifact
//! store's insert-or-fetch), and fatal-invariant.

use secpipe_artifacts::ArtifactError;
use secpipe_external::{ChatError, IngestionError};
use secpipe_worker::HandlerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Queue(#[from] secpipe_queue::QueueError),

    #[error(transparent)]
    Ledger(#[from] secpipe_ledger::LedgerError),

    #[error("ingestion source error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("chat completer error: {0}")]
    Chat(#[from] ChatError),

    #[error("prompt directory error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Classify a pipeline error the way a handler must before surfacing it
/// through the job store's `fail`.
impl From<PipelineError> for HandlerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => HandlerError::Validation(msg),
            PipelineError::SourceNotFound(msg) => HandlerError::Validation(msg),
            PipelineError::Artifact(ArtifactError::Cycle) => {
                HandlerError::FatalInvariant("generated content source cycle rejected".to_string())
            }
            PipelineError::Artifact(ArtifactError::NotFound(what, id)) => {
                HandlerError::Validation(format!("{what} not found: {id}"))
            }
            PipelineError::Artifact(ArtifactError::Invalid(what, msg)) => {
                HandlerError::Validation(format!("invalid {what}: {msg}"))
            }
            PipelineError::Artifact(ArtifactError::AmbiguousHash(hash)) => {
                HandlerError::Validation(format!("ambiguous short hash: {hash}"))
            }
            PipelineError::Artifact(other) => HandlerError::Transient(other.to_string()),
            PipelineError::Queue(e) => HandlerError::Transient(e.to_string()),
            PipelineError::Ledger(e) => HandlerError::Transient(e.to_string()),
            PipelineError::Ingestion(IngestionError::NotFound(msg)) => HandlerError::Validation(msg),
            PipelineError::Ingestion(IngestionError::Upstream(msg)) => HandlerError::Transient(msg),
            PipelineError::Chat(ChatError::Timeout(secs)) => {
                HandlerError::Transient(format!("chat completer timed out after {secs}s"))
            }
            PipelineError::Chat(ChatError::Upstream(msg)) => HandlerError::Transient(msg),
            PipelineError::Io(e) => HandlerError::Validation(e.to_string()),
        }
    }
}
