//! jobrag - job retrieval + RAG chat service
//!
//! Serves the HTTP surface over a SQLite-backed embedding store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use jobrag::app::AppContext;
use jobrag::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "jobrag",
    version,
    about = "Embedding-based job retrieval with a RAG chat assistant"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server to (host:port)
    #[arg(long, env = "JOBRAG_BIND")]
    bind: Option<String>,

    /// SQLite database file for jobs and chat history
    #[arg(long, env = "JOBRAG_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(db_path) = &cli.db_path {
        config.database.path = db_path.clone();
    }

    let ctx = Arc::new(AppContext::from_config(config).context("failed to initialize service")?);
    jobrag::server::serve(ctx).await.context("server error")
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,jobrag=info",
        1 => "info,jobrag=debug",
        2 => "debug,jobrag=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
