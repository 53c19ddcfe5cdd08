//! `gaya run`: collect, check and report every configured table.

use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;

use gaya_core::config::{self, ProjectConfig};
use gaya_core::{
    BaselineStore, Collector, ReadOnlyStore, RunResult, Runner, TableConfig, create_collector,
};
use tracing::{info, warn};

use crate::RunArgs;
use crate::exit_codes;
use crate::report::{RunSummary, render};

/// Runs every table and renders the summary to stdout.
///
/// Per-table problems become errored [`RunResult`]s; only an unusable config
/// stops the run early, with the infrastructure exit code.
pub async fn execute(args: &RunArgs) -> anyhow::Result<i32> {
    let project = match config::load(&args.config) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("\n  ✖  {}\n", e);
            return Ok(exit_codes::INFRASTRUCTURE_ERROR);
        }
    };

    let store: Box<dyn BaselineStore> = if args.dry_run {
        info!("Dry run: baselines will not be updated");
        Box::new(ReadOnlyStore::new(args.store.store()))
    } else {
        Box::new(args.store.store())
    };
    let runner = Runner::new(store);

    let start = Instant::now();
    let results = run_tables(&project, &runner).await;
    let summary = RunSummary::new(results, start.elapsed());

    let mut stdout = std::io::stdout().lock();
    render(&summary, args.output_mode(), &mut stdout)?;
    stdout.flush()?;

    Ok(summary.exit_code())
}

/// Runs tables in config order, building one collector per datasource.
pub async fn run_tables<S: BaselineStore>(
    project: &ProjectConfig,
    runner: &Runner<S>,
) -> Vec<RunResult> {
    let mut collectors: HashMap<&str, Box<dyn Collector>> = HashMap::new();
    let mut results = Vec::with_capacity(project.tables.len());

    for table in &project.tables {
        if !collectors.contains_key(table.source.as_str()) {
            match connect(project, &table.source).await {
                Ok(collector) => {
                    collectors.insert(table.source.as_str(), collector);
                }
                Err(e) => {
                    warn!("Skipping '{}': {}", table.table, e);
                    results.push(RunResult::failed(&table.table, table.layer, e.to_string()));
                    continue;
                }
            }
        }

        let result = match collectors.get(table.source.as_str()) {
            Some(collector) => run_table(collector.as_ref(), runner, table).await,
            None => RunResult::failed(
                &table.table,
                table.layer,
                format!("Datasource '{}' is not available", table.source),
            ),
        };
        results.push(result);
    }
    results
}

async fn connect(project: &ProjectConfig, source: &str) -> gaya_core::Result<Box<dyn Collector>> {
    let datasource = project.datasource(source).ok_or_else(|| {
        gaya_core::GayaError::configuration(format!("Datasource '{}' is not defined", source))
    })?;
    info!("Connecting to datasource '{}' ({})", source, datasource.kind());
    create_collector(datasource).await
}

/// Collects and checks one table. Never fails: errors are folded into the
/// returned result.
pub async fn run_table<S: BaselineStore>(
    collector: &dyn Collector,
    runner: &Runner<S>,
    table: &TableConfig,
) -> RunResult {
    let stats = match collector
        .collect(&table.table, table.layer, &table.composite_keys())
        .await
    {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Collection failed for '{}': {}", table.table, e);
            return RunResult::failed(&table.table, table.layer, e.to_string());
        }
    };

    runner.run(&stats, table).unwrap_or_else(|e| {
        warn!("Baseline update failed for '{}': {}", table.table, e);
        RunResult::failed(&table.table, table.layer, e.to_string())
    })
}
