//! Handler registry, dispatcher, and worker loop that claims jobs off a
//! [`secpipe_queue::JobStore`] and drives them to completion.

pub mod identity;
mod loop_;
pub mod registry;

pub use identity::generate_worker_id;
pub use loop_::{run_forever, run_once, WorkerConfig};
pub use registry::{Handler, HandlerError, HandlerRegistry};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use secpipe_core::{JobStatus, JobType};
    use secpipe_queue::JobStore;

    use super::*;

    struct DoublingHandler;

    #[async_trait]
    impl Handler for DoublingHandler {
        async fn handle(&self, params: serde_json::Value) -> Result<serde_json::Value, HandlerError> {
            let n = params.get("n").and_then(|v| v.as_i64()).ok_or_else(|| {
                HandlerError::Validation("missing integer field `n`".to_string())
            })?;
            Ok(serde_json::json!({ "n": n * 2 }))
        }
    }

    struct AlwaysFailsHandler;

    #[async_trait]
    impl Handler for AlwaysFailsHandler {
        async fn handle(&self, _params: serde_json::Value) -> Result<serde_json::Value, HandlerError> {
            Err(HandlerError::Transient("upstream unavailable".to_string()))
        }
    }

    async fn test_store() -> JobStore {
        let pool = secpipe_db::connect_in_memory().await.unwrap();
        secpipe_db::init_schema(&pool).await.unwrap();
        JobStore::new(pool)
    }

    #[tokio::test]
    async fn run_once_dispatches_and_completes() {
        let store = test_store().await;
        let mut registry = HandlerRegistry::new();
        registry.register(JobType::Test, Arc::new(DoublingHandler));
        let config = WorkerConfig::new("test-worker-1".to_string());

        let job = store.create(JobType::Test, serde_json::json!({"n": 21}), 0, 3).await.unwrap();
        let claimed = run_once(&store, &registry, &config).await.unwrap();
        assert!(claimed);

        let job = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result, Some(serde_json::json!({"n": 42})));
    }

    #[tokio::test]
    async fn run_once_returns_false_on_empty_queue() {
        let store = test_store().await;
        let registry = HandlerRegistry::new();
        let config = WorkerConfig::new("test-worker-1".to_string());

        assert!(!run_once(&store, &registry, &config).await.unwrap());
    }

    #[tokio::test]
    async fn run_once_fails_job_without_raising_when_handler_errors() {
        let store = test_store().await;
        let mut registry = HandlerRegistry::new();
        registry.register(JobType::Test, Arc::new(AlwaysFailsHandler));
        let config = WorkerConfig::new("test-worker-1".to_string());

        let job = store.create(JobType::Test, serde_json::json!({}), 0, 3).await.unwrap();
        assert!(run_once(&store, &registry, &config).await.unwrap());

        let job = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.error.as_deref(), Some("transient error: upstream unavailable"));
    }

    #[tokio::test]
    async fn run_once_marks_job_failed_when_no_handler_registered() {
        let store = test_store().await;
        let registry = HandlerRegistry::new();
        let config = WorkerConfig::new("test-worker-1".to_string());

        let job = store.create(JobType::Test, serde_json::json!({}), 0, 0).await.unwrap();
        assert!(run_once(&store, &registry, &config).await.unwrap());

        let job = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }
}
