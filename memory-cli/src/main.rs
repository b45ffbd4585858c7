//! `memory-cli`: command-line surface over `memory-core::core::MemoryCore`.
//!
//! One subcommand per facade method (§6); see [`commands`] for the
//! request/response shape of each.

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use output::{write_output, OutputFormat};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "memory-cli", version, about = "Self-evolving episodic memory engine for LLM agents")]
struct Cli {
    /// TOML config file (backend selection, LLM credentials).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the iterative controller (optionally MaTTS) against a task.
    Solve(commands::solve::SolveArgs),
    /// Rank stored Memories against a query.
    Retrieve(commands::retrieve::RetrieveArgs),
    /// Show a Memory's ancestor chain, descendants, and evolution stage.
    Genealogy(commands::genealogy::GenealogyArgs),
    /// Aggregate trace/memory counts and cache/API statistics.
    Statistics(commands::statistics::StatisticsArgs),
    /// Delete traces and memories older than a retention window.
    Cleanup(commands::cleanup::CleanupArgs),
    /// Irreversibly delete every trace and memory in a workspace.
    DeleteWorkspace(commands::delete_workspace::DeleteWorkspaceArgs),
    /// Write a workspace's memories to a gzip-compressed tar archive.
    Backup(commands::backup::BackupArgs),
    /// Load a backup archive back into a store.
    Restore(commands::restore::RestoreArgs),
    /// Check a backup archive's memories against the required-field invariant.
    Validate(commands::validate::ValidateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let resolved = config::load(cli.config.as_deref())?;
    let core = config::build_core(&resolved).await?;

    match cli.command {
        Command::Solve(args) => write_output(&commands::solve::run(&core, args).await?, cli.format),
        Command::Retrieve(args) => write_output(&commands::retrieve::run(&core, args).await?, cli.format),
        Command::Genealogy(args) => write_output(&commands::genealogy::run(&core, args).await?, cli.format),
        Command::Statistics(args) => write_output(&commands::statistics::run(&core, args).await?, cli.format),
        Command::Cleanup(args) => write_output(&commands::cleanup::run(&core, args).await?, cli.format),
        Command::DeleteWorkspace(args) => write_output(&commands::delete_workspace::run(&core, args).await?, cli.format),
        Command::Backup(args) => write_output(&commands::backup::run(&core, args).await?, cli.format),
        Command::Restore(args) => write_output(&commands::restore::run(&core, args).await?, cli.format),
        Command::Validate(args) => write_output(&commands::validate::run(&core, args).await?, cli.format),
    }
}
