//! Handler registry: a process-wide, effectively-immutable `job_type ->
//! handler` table built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use secpipe_core::JobType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("transient error: {0}")]
    Transient(String),
    #[error("fatal invariant violation: {0}")]
    FatalInvariant(String),
}

/// A handler's contract: accepts a `params` map, returns a JSON result or
/// a typed error that the worker loop turns into `fail(id, ...)`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, params: serde_json::Value) -> Result<serde_json::Value, HandlerError>;
}

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<JobType, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job_type: JobType, handler: Arc<dyn Handler>) {
        self.handlers.insert(job_type, handler);
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&job_type).cloned()
    }

    /// Every job_type the registry knows how to dispatch, in declaration order.
    pub fn registered_types(&self) -> Vec<JobType> {
        self.handlers.keys().copied().collect()
    }
}
