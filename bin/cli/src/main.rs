//! `vaultflow` command line.
//!
//! Validates, orders, simulates, and executes workflow graphs exported by
//! the editor, against the devnet chain client and the dry-run executor.

mod config;
mod error;

use crate::config::CliConfig;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use rootcause::Report;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vaultflow_chain::{DevnetClient, DryRunExecutor};
use vaultflow_core::{AccountContext, Address};
use vaultflow_workflow::{Orchestrator, RunStatus, WorkflowGraph, order};

#[derive(Parser, Debug)]
#[command(name = "vaultflow", version, about = "Run DeFi workflow graphs", long_about = None)]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, env = "VAULTFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Account address, overriding the configured one
    #[arg(short, long)]
    account: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a graph for structural and field errors
    Validate {
        /// Graph JSON exported by the editor
        graph: PathBuf,
    },
    /// Print the execution order of a graph
    Order {
        /// Graph JSON exported by the editor
        graph: PathBuf,
    },
    /// Compile a graph and estimate its cost without submitting anything
    Simulate {
        /// Graph JSON exported by the editor
        graph: PathBuf,
    },
    /// Execute a graph against the dry-run executor
    Execute {
        /// Graph JSON exported by the editor
        graph: PathBuf,

        /// Log every step transition while the run is in flight
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(report) => {
            eprintln!("error: {}", report.current_context());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Report<CliError>> {
    let settings = CliConfig::load(cli.config.as_deref()).map_err(|e| CliError::Config {
        details: e.to_string(),
    })?;
    info!("Loaded configuration");

    let account = cli
        .account
        .or_else(|| settings.account.address.clone())
        .map(AccountContext::new);
    if account.is_none() {
        warn!("no account configured; set account.address or pass --account");
    }

    let client = DevnetClient::new(&settings.devnet.chain()).map_err(|e| CliError::Chain {
        details: e.to_string(),
    })?;
    let executor = DryRunExecutor::new(settings.devnet.gas_per_operation);
    let orchestrator = Orchestrator::with_config(client, executor, settings.engine);

    match cli.command {
        Commands::Validate { graph } => {
            let graph = load_graph(&graph)?;
            let validation = orchestrator.validate(&graph, account.as_ref());
            print_json(&validation)?;
            Ok(exit_code(validation.valid))
        }
        Commands::Order { graph } => {
            let graph = load_graph(&graph)?;
            let ordering = order(&graph);
            print_json(&ordering)?;
            Ok(exit_code(!ordering.has_cycle))
        }
        Commands::Simulate { graph } => {
            let graph = load_graph(&graph)?;
            let simulation = orchestrator
                .simulate(&graph, account.as_ref())
                .await
                .map_err(|report| CliError::Workflow {
                    details: report.current_context().to_string(),
                })?;
            print_json(&simulation)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Execute {
            graph,
            watch: follow,
        } => {
            let graph = load_graph(&graph)?;
            let result = if follow {
                let (status, progress) = watch::channel(RunStatus::default());
                let logger = tokio::spawn(log_progress(progress));
                let result = orchestrator
                    .execute_with_status(&graph, account.as_ref(), &status)
                    .await;
                // closing the channel ends the logger after the final snapshot
                drop(status);
                if let Err(e) = logger.await {
                    warn!(error = %e, "progress logger stopped");
                }
                result
            } else {
                orchestrator.execute(&graph, account.as_ref()).await
            };
            let report = result.map_err(|report| CliError::Workflow {
                details: report.current_context().to_string(),
            })?;
            print_json(&report)?;
            Ok(exit_code(report.success))
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_graph(path: &Path) -> Result<WorkflowGraph, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::ReadGraph {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| CliError::ParseGraph {
        path: path.display().to_string(),
        details: e.to_string(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::Output {
        details: e.to_string(),
    })?;
    println!("{json}");
    Ok(())
}

async fn log_progress(mut status: watch::Receiver<RunStatus>) {
    while status.changed().await.is_ok() {
        let snapshot = status.borrow_and_update().clone();
        let Some(index) = snapshot.current_step else {
            continue;
        };
        if let Some(step) = snapshot.steps.get(index) {
            info!(
                step = index + 1,
                of = snapshot.steps.len(),
                node_id = %step.node_id,
                status = step.status.as_str(),
                "{}",
                step.description
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from([
            "vaultflow",
            "--account",
            "0x1111111111111111111111111111111111111111",
            "execute",
            "graph.json",
            "--watch",
        ])
        .expect("parse");
        assert!(cli.account.is_some());
        match cli.command {
            Commands::Execute { graph, watch } => {
                assert_eq!(graph, PathBuf::from("graph.json"));
                assert!(watch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_account() {
        let parsed = Cli::try_parse_from(["vaultflow", "--account", "nope", "validate", "g.json"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn loads_graph_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        let graph = serde_json::json!({
            "nodes": [
                {"id": "start", "kind": {"category": "control", "role": "start"}},
                {"id": "end", "kind": {"category": "control", "role": "end"}}
            ],
            "edges": [
                {"id": "e1", "source": "start", "target": "end"}
            ]
        });
        write!(file, "{graph}").expect("write graph");

        let graph = load_graph(file.path()).expect("load graph");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn reports_unparseable_graph() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "not json").expect("write graph");

        let err = load_graph(file.path()).unwrap_err();
        assert!(matches!(err, CliError::ParseGraph { .. }));
    }

    #[test]
    fn reports_missing_graph() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = load_graph(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::ReadGraph { .. }));
    }
}
