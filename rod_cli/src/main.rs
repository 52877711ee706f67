//! # Rodwise CLI Application
//!
//! Command-line front end over `rod_core`: validate a structure, run section
//! queries, print uniform-step tables and assemble reports. Every command
//! prints JSON to stdout; logs go to stderr.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Rod structure post-processing tool
#[derive(Parser)]
#[command(name = "rod_cli")]
#[command(author = "Rodwise Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Post-processing for axially loaded rod structures", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Settings file (JSON); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a structure for invariant violations
    Validate(commands::validate::ValidateArgs),
    /// Evaluate N, σ and u at one or more sections
    Query(commands::query::QueryArgs),
    /// Print the uniform-step table over every rod
    Sample(commands::sample::SampleArgs),
    /// Assemble a report from the selected sections
    Report(commands::report::ReportArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Query(args) => commands::query::execute(args, settings),
        Commands::Sample(args) => commands::sample::execute(args, settings),
        Commands::Report(args) => commands::report::execute(args, settings),
    }
}
