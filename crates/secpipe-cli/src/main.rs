//! `secpipe` — operator CLI for the filing-ingestion and summarization pipeline.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use secpipe_external::{StubChatCompleter, StubIngestionSource};
use secpipe_logging::{secpipe_home, LogConfig};
use secpipe_pipeline::PipelineContext;
use tracing::error;

use cli::companies::CompaniesAction;
use cli::documents::DocumentsAction;
use cli::filings::FilingsAction;
use cli::financials::FinancialsAction;
use cli::jobs::JobsAction;
use cli::output::OutputFormat;
use cli::pipeline::PipelineAction;
use cli::prompts::PromptsAction;
use cli::worker::WorkerAction;

#[derive(Parser, Debug)]
#[command(name = "secpipe", about = "Filing ingestion and summarization pipeline")]
struct Cli {
    /// Path to the SQLite database file. Defaults to `~/.secpipe/secpipe.db`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format for resource commands.
    #[arg(long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable stage-level dedup shortcuts on pipeline invocations.
    #[arg(long, global = true)]
    force: bool,

    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Company metadata.
    #[command(subcommand)]
    Companies(CompaniesAction),
    /// SEC filings.
    #[command(subcommand)]
    Filings(FilingsAction),
    /// Filing documents.
    #[command(subcommand)]
    Documents(DocumentsAction),
    /// Structured financial concepts and values.
    #[command(subcommand)]
    Financials(FinancialsAction),
    /// Stored prompts.
    #[command(subcommand)]
    Prompts(PromptsAction),
    /// Durable job queue.
    #[command(subcommand)]
    Jobs(JobsAction),
    /// Run the worker loop.
    #[command(subcommand)]
    Worker(WorkerAction),
    /// Invoke orchestration stages directly, bypassing the job queue.
    #[command(subcommand)]
    Pipeline(PipelineAction),
}

fn db_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| secpipe_home().join("secpipe.db"))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = db_path(cli.db);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let pool = secpipe_db::connect(&url).await?;
    secpipe_db::init_schema(&pool).await?;

    let ctx = PipelineContext::new(pool, Arc::new(StubIngestionSource), Arc::new(StubChatCompleter));

    match cli.command {
        Commands::Companies(action) => cli::companies::run(&ctx, action, cli.output).await,
        Commands::Filings(action) => cli::filings::run(&ctx, action, cli.output).await,
        Commands::Documents(action) => cli::documents::run(&ctx, action, cli.output).await,
        Commands::Financials(action) => cli::financials::run(&ctx, action, cli.output).await,
        Commands::Prompts(action) => cli::prompts::run(&ctx, action, cli.output).await,
        Commands::Jobs(action) => cli::jobs::run(&ctx, action, cli.output).await,
        Commands::Worker(action) => cli::worker::run(&ctx, action).await,
        Commands::Pipeline(action) => cli::pipeline::run(&ctx, action, cli.output, cli.force).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = secpipe_logging::init_logging(LogConfig { app_name: "secpipe", verbose: cli.verbose, quiet_console: false }) {
        eprintln!("failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
