//! Run one workflow of a Routix program against a case.
//!
//! Usage: routix-run <program.rtx> --workflow NAME --case case.json
//!            [--agents agents.json] [--config engine.json]
//!
//! Prints the execution result as JSON on stdout. Logging goes to stderr and
//! honours `RUST_LOG`.

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routix_engine::{EngineConfig, Record, RuleEngine};
use routix_parser::{parse, ErrorReporter};

#[derive(Parser)]
#[command(name = "routix-run")]
#[command(about = "Run a Routix workflow against a case and candidate agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Routix program file
    program: PathBuf,

    /// Workflow to run
    #[arg(short, long)]
    workflow: String,

    /// JSON object with the case's fields
    #[arg(short, long)]
    case: PathBuf,

    /// JSON array of candidate agents, in priority order
    #[arg(short, long)]
    agents: Option<PathBuf>,

    /// Engine configuration (JSON)
    #[arg(long, env = "ROUTIX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let filename = cli.program.display().to_string();
    let source = read(&cli.program)?;
    let program = match parse(&source) {
        Ok(program) => program,
        Err(err) => {
            let reporter = ErrorReporter::new(&filename, &source);
            if reporter.report(&err).is_err() {
                eprintln!("{}", err);
            }
            bail!("{} failed to parse", filename);
        }
    };

    let case: Record = serde_json::from_str(&read(&cli.case)?)
        .with_context(|| format!("{} is not a case object", cli.case.display()))?;
    let agents: Vec<Record> = match &cli.agents {
        Some(path) => serde_json::from_str(&read(path)?)
            .with_context(|| format!("{} is not an array of agents", path.display()))?,
        None => Vec::new(),
    };

    let engine = RuleEngine::from_program(&program, config);
    let result = engine.run_by_name(&cli.workflow, &case, &agents)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from([
            "routix-run",
            "triage.rtx",
            "--workflow",
            "triage",
            "--case",
            "case.json",
        ])
        .unwrap();
        assert_eq!(cli.workflow, "triage");
        assert_eq!(cli.log_level, "info");
        assert!(cli.agents.is_none());

        let config = Cli::command()
            .get_arguments()
            .find(|a| a.get_id() == "config")
            .and_then(|a| a.get_env())
            .map(|env| env.to_os_string());
        assert_eq!(config, Some("ROUTIX_CONFIG".into()));
    }
}
