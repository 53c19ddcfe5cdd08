//! Gaya command-line interface.
//!
//! Runs the data-quality checks configured in `gaya.yml` and exits with a
//! code CI can gate on:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | all checks passed |
//! | 1 | warnings only |
//! | 2 | one or more failures |
//! | 3 | infrastructure error (config, connection, baseline I/O) |
//!
//! # Operational Guarantees
//! - Only aggregate, read-only queries reach the data source
//! - Connection strings are redacted in logs and errors
//! - Stdout carries the report; logs go to stderr

mod exit_codes;
mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gaya_core::baseline::DEFAULT_BASELINE_DIR;
use gaya_core::config::{self, DEFAULT_CONFIG_FILE};
use gaya_core::logging::init_logging;
use gaya_core::{BaselineStore, JsonFileStore};
use tracing::error;

use crate::report::OutputMode;

#[derive(Parser)]
#[command(name = "gaya")]
#[command(about = "Simple data quality checks that just work")]
#[command(version)]
#[command(long_about = "
Gaya - data quality checks for warehouse tables

Gaya collects aggregate statistics for each configured table and checks
null rates, required columns, uniqueness, row-count bounds, volume change
and schema drift. Baselines are kept as JSON files under .gaya/baselines.

EXIT CODES:
  0  all checks passed
  1  warnings only
  2  one or more failures
  3  infrastructure error

EXAMPLES:
  gaya init
  gaya run
  gaya run --quiet
  gaya run --json --config warehouse.yml
  gaya reset public.orders
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a starter gaya.yml
    Init(InitArgs),
    /// Run all configured checks
    Run(RunArgs),
    /// Delete a table's stored baseline
    Reset(ResetArgs),
    /// List tables with a stored baseline
    Baselines(StoreArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Config file to create
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// One line per issue (CI-friendly)
    #[arg(long, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON output
    #[arg(long)]
    pub json: bool,

    /// Run checks without updating baselines
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl RunArgs {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Args)]
pub struct ResetArgs {
    /// Table whose baseline is removed, e.g. public.orders
    pub table: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct StoreArgs {
    /// Directory holding baseline files
    #[arg(long, env = "GAYA_BASELINE_DIR", default_value = DEFAULT_BASELINE_DIR)]
    pub baseline_dir: PathBuf,
}

impl StoreArgs {
    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.baseline_dir)
    }
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress logs
    #[arg(long, global = true, help = "Only log errors")]
    pub log_quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.log_quiet) {
        eprintln!("Warning: {}", e);
    }

    let code = match dispatch(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("\n  ✖  {:#}\n", e);
            exit_codes::INFRASTRUCTURE_ERROR
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn dispatch(command: Command) -> anyhow::Result<i32> {
    match command {
        Command::Init(args) => init(&args),
        Command::Run(args) => run::execute(&args).await,
        Command::Reset(args) => reset(&args),
        Command::Baselines(args) => list_baselines(&args),
    }
}

fn init(args: &InitArgs) -> anyhow::Result<i32> {
    if config::init(&args.config)? {
        println!(
            "{} created. Edit it, then run: gaya run",
            args.config.display()
        );
    } else {
        println!(
            "{} already exists. Remove it to re-initialise.",
            args.config.display()
        );
    }
    Ok(exit_codes::SUCCESS)
}

fn reset(args: &ResetArgs) -> anyhow::Result<i32> {
    if args.store.store().delete(&args.table)? {
        println!("Baseline for '{}' removed.", args.table);
    } else {
        println!("No baseline stored for '{}'.", args.table);
    }
    Ok(exit_codes::SUCCESS)
}

fn list_baselines(args: &StoreArgs) -> anyhow::Result<i32> {
    let store = args.store();
    let tables = store.list_tables()?;
    if tables.is_empty() {
        println!("No baselines in {}", store.dir().display());
        return Ok(exit_codes::SUCCESS);
    }

    for table in tables {
        match store.load(&table) {
            Some(baseline) => println!(
                "{}  {} rows  {} columns  run {}  {}",
                table,
                baseline.row_count,
                baseline.schema.len(),
                baseline.run_count,
                baseline.run_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            ),
            None => println!("{}  (unreadable)", table),
        }
    }
    Ok(exit_codes::SUCCESS)
}
