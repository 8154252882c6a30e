//! `worker start` — run a worker loop against the shared job queue.

use clap::Subcommand;
use secpipe_worker::{generate_worker_id, run_once, WorkerConfig};
use tracing::info;

use secpipe_pipeline::PipelineContext;

#[derive(Subcommand, Debug)]
pub enum WorkerAction {
    /// Claim and process jobs until the queue has stayed empty for `--max-idle-polls` cycles.
    Start {
        #[arg(long)]
        max_idle_polls: Option<u64>,
    },
}

pub async fn run(ctx: &PipelineContext, action: WorkerAction) -> anyhow::Result<()> {
    let WorkerAction::Start { max_idle_polls } = action;
    let registry = secpipe_pipeline::build_registry(ctx.clone());
    let config = WorkerConfig::new(generate_worker_id());
    info!(worker_id = %config.worker_id, "starting worker");

    let mut idle_polls = 0u64;
    loop {
        let claimed = run_once(&ctx.jobs, &registry, &config).await?;
        if claimed {
            idle_polls = 0;
            continue;
        }
        idle_polls += 1;
        if let Some(max) = max_idle_polls {
            if idle_polls >= max {
                info!(idle_polls, "queue stayed empty, stopping");
                return Ok(());
            }
        }
        tokio::time::sleep(config.poll_backoff).await;
    }
}
