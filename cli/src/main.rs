use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use fleetscope_core::api::{AppConfig, CliError, ExecutorProvider, ToolExecutor};
use fleetscope_core::config;

mod commands;
mod logging;

use commands::cli::{self, Commands};
use commands::run::{self, Output};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = cli::Args::parse();

    let cfg = load_config(&args)?;
    let log_guard = logging::init(&cfg.logging);

    let code = dispatch(args, cfg).await?;
    // exit() skips destructors; flush the file writer first.
    drop(log_guard);
    std::process::exit(code);
}

fn load_config(args: &cli::Args) -> Result<AppConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => config::load_from_path(Path::new(path)),
        None => config::load_default(),
    }
    .map_err(CliError::Config)?;

    if let Some(path) = &args.fixture {
        cfg.fixture.path = path.clone();
        cfg.executor.provider = ExecutorProvider::Fixture;
    }
    if let Some(case) = &args.case {
        cfg.fixture.case = case.clone();
    }
    Ok(cfg)
}

async fn dispatch(args: cli::Args, cfg: AppConfig) -> Result<i32, CliError> {
    let out = Output {
        compact: args.compact,
    };

    match &args.command {
        Commands::Tools => run::tools(&out),
        Commands::Diagnose(d) => run::diagnose(d, &cfg, executor(&cfg)?.as_ref(), &out).await,
        Commands::Tool(t) => run::tool(t, executor(&cfg)?.as_ref(), &out).await,
        Commands::Overview(o) => run::overview(o, executor(&cfg)?.as_ref(), &out).await,
        Commands::Enroll(e) => run::enroll(e, executor(&cfg)?.as_ref(), &out).await,
    }
}

/// Listing tools needs no data source, so the executor is built per command.
fn executor(cfg: &AppConfig) -> Result<Arc<dyn ToolExecutor>, CliError> {
    let executor = fleetscope_plugins::build_executor(cfg)?;
    tracing::debug!(target: "fleetscope.cli", executor = executor.name(), "executor built");
    Ok(executor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tools_listing_needs_no_executor() {
        // default config selects the live executor without a token
        let args = cli::Args::parse_from(["fleetscope", "tools"]);
        assert_eq!(dispatch(args, AppConfig::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn data_commands_build_the_executor() {
        let args = cli::Args::parse_from(["fleetscope", "overview"]);
        let err = dispatch(args, AppConfig::default()).await.unwrap_err();
        assert!(matches!(err, CliError::Executor(_)));
    }
}
