use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// The full report as JSON on stdout.
    Json,
}

/// Run the CI pipeline locally.
#[derive(Parser, Debug)]
#[command(name = "localci", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file; defaults to ./localci.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Options for the implicit `run` when no subcommand is given.
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Comma-separated categories to run (default: all).
    #[arg(long, value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Fast subset for local iteration.
    #[arg(long)]
    pub quick: bool,

    /// Also run adjacent independent categories concurrently.
    #[arg(long)]
    pub parallel: bool,

    /// Treat every check as critical.
    #[arg(long)]
    pub ci: bool,

    /// Print commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Upper bound on concurrently running checks.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_parallel: Option<u64>,

    /// Where reports are written.
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Echo check output as it happens.
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable progress spinners.
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    #[arg(long, value_delimiter = ',')]
    pub categories: Vec<String>,

    #[arg(long)]
    pub quick: bool,

    #[arg(long)]
    pub parallel: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run checks (the default).
    Run(RunArgs),
    /// Show the execution plan without running anything.
    List(ListArgs),
}
