use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata: dependency-ordered migrations for 3-D scenes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project root (where strata.toml and the ledger live)
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Ledger document, overriding strata.toml
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the ledger against every rule and print a report
    Validate(ValidateArgs),
    /// Quiet validation for pre-submission hooks
    Check(CheckArgs),
    /// Show applied entries, pending entries, and tags
    Status(StatusArgs),
    /// List pending entries in application order
    Plan(PlanArgs),
    /// Show one entry with its producers and dependents
    Show(ShowArgs),
    /// Apply pending entries through an external runner
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Skip asset checks even if strata.toml enables them
    #[arg(long)]
    pub no_assets: bool,
}

#[derive(Args)]
pub struct CheckArgs {}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct PlanArgs {}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Program invoked once per entry as `<program> <id> <type> <source>`
    #[arg(long)]
    pub runner: PathBuf,
    /// Per-entry time limit in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Print the plan without running anything
    #[arg(long)]
    pub dry_run: bool,
}
