use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "ridlpp developers",
    version,
    about = "RIDL++ CLI - A command-line interface for quantifying and ranking site-specific radiation damage across a dose series of crystallographic datasets.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble the damage series and rank residue/atom types by damage susceptibility.
    Rank(RankArgs),
    /// Compare the damage orderings produced by two metric selections.
    Compare(CompareArgs),
}

/// Arguments for the `rank` subcommand.
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Path to the series configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Density metric to rank on (e.g. 'loss', 'mean', 'gain', 'net').
    #[arg(short, long, default_value = "loss", value_name = "NAME")]
    pub metric: String,

    /// Rank on the Calpha-normalised variant instead of the raw values.
    #[arg(short, long)]
    pub normalised: bool,

    /// Number of ranking lines to print to the console (0 prints all).
    #[arg(short, long, default_value_t = 0, value_name = "INT")]
    pub lines: usize,
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Path to the series configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Metric for the first ranking.
    #[arg(long, default_value = "loss", value_name = "NAME")]
    pub first_metric: String,

    /// Use the Calpha-normalised variant for the first ranking.
    #[arg(long)]
    pub first_normalised: bool,

    /// Metric for the second ranking.
    #[arg(long, default_value = "gain", value_name = "NAME")]
    pub second_metric: String,

    /// Use the Calpha-normalised variant for the second ranking.
    #[arg(long)]
    pub second_normalised: bool,
}
