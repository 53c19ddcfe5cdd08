//! Per-table check orchestration.
//!
//! [`Runner::run`] evaluates a table's rules in a fixed order, loading the
//! baseline once before the drift stage and offering the statistics back to
//! the store once after every stage has run:
//!
//! 1. schema contract (if configured)
//! 2. schema drift (unless disabled)
//! 3. null rate (unless disabled) and required columns (if configured)
//! 4. uniqueness (if configured)
//! 5. row-count bounds (if configured) and volume change (unless disabled)
//! 6. conditional baseline save, regardless of outcomes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::baseline::BaselineStore;
use crate::checks::{
    self, CheckKind, CheckResult, NullRateConfig, RuleConfig, Status, VolumeChangeConfig,
};
use crate::models::{Layer, TableStatistics};

/// Everything configured for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub table: String,
    pub layer: Layer,
    /// Name of the datasource the table is collected from
    pub source: String,
    pub rules: BTreeMap<CheckKind, RuleConfig>,
    pub run_null_check: bool,
    pub run_volume_check: bool,
    pub run_drift_check: bool,
}

impl TableConfig {
    /// Creates a config with no explicit rules and every default check enabled.
    pub fn new(table: impl Into<String>, layer: Layer, source: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            layer,
            source: source.into(),
            rules: BTreeMap::new(),
            run_null_check: true,
            run_volume_check: true,
            run_drift_check: true,
        }
    }

    /// Adds a rule, replacing any rule of the same kind.
    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.rules.insert(rule.kind(), rule);
        self
    }

    pub fn with_null_check(mut self, enabled: bool) -> Self {
        self.run_null_check = enabled;
        self
    }

    pub fn with_volume_check(mut self, enabled: bool) -> Self {
        self.run_volume_check = enabled;
        self
    }

    pub fn with_drift_check(mut self, enabled: bool) -> Self {
        self.run_drift_check = enabled;
        self
    }

    pub fn rule(&self, kind: CheckKind) -> Option<&RuleConfig> {
        self.rules.get(&kind)
    }

    /// Composite uniqueness keys the collector must materialize.
    pub fn composite_keys(&self) -> Vec<Vec<String>> {
        match self.rule(CheckKind::Unique) {
            Some(RuleConfig::Unique(unique)) => {
                unique.composite_keys().map(<[String]>::to_vec).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Outcome of running one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub table: String,
    pub layer: Layer,
    pub results: Vec<CheckResult>,
    pub baseline_updated: bool,
    /// Set when the table could not be checked at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    /// A table-level failure with no check results.
    pub fn failed(table: impl Into<String>, layer: Layer, error: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            layer,
            results: Vec::new(),
            baseline_updated: false,
            error: Some(error.into()),
        }
    }

    pub fn passed(&self) -> usize {
        self.count(Status::Pass)
    }

    pub fn warnings(&self) -> usize {
        self.count(Status::Warn)
    }

    pub fn failures(&self) -> usize {
        self.count(Status::Fail)
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(CheckResult::failed)
    }

    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(CheckResult::warned)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Worst status in the run; an error counts as a failure.
    pub fn overall_status(&self) -> Status {
        if self.has_error() || self.has_failures() {
            Status::Fail
        } else if self.has_warnings() {
            Status::Warn
        } else {
            Status::Pass
        }
    }

    fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Runs configured checks against collected statistics.
#[derive(Debug)]
pub struct Runner<S> {
    store: S,
}

impl<S: BaselineStore> Runner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluates every applicable rule and updates the baseline.
    ///
    /// Check outcomes never produce an error; only a failed baseline write
    /// does.
    pub fn run(&self, stats: &TableStatistics, config: &TableConfig) -> Result<RunResult> {
        tracing::info!("Running checks for '{}'", stats.table_name());
        let mut results = Vec::new();

        if let Some(RuleConfig::Schema(schema)) = config.rule(CheckKind::Schema) {
            tracing::debug!("Stage: schema contract");
            results.extend(checks::check_schema(stats, schema));
        }

        let baseline = self.store.load(stats.table_name());
        tracing::debug!(
            "Baseline for '{}': {}",
            stats.table_name(),
            baseline
                .as_ref()
                .map_or_else(|| "none".to_string(), |b| format!("run {}", b.run_count))
        );

        if config.run_drift_check {
            tracing::debug!("Stage: schema drift");
            results.extend(checks::check_schema_drift(stats, baseline.as_ref()));
        }

        if config.run_null_check {
            tracing::debug!("Stage: null rate");
            let default = NullRateConfig::default();
            let null = match config.rule(CheckKind::NullRate) {
                Some(RuleConfig::NullRate(null)) => null,
                _ => &default,
            };
            results.extend(checks::check_null_rate(stats, null));
        }
        if let Some(RuleConfig::RequiredColumns(required)) =
            config.rule(CheckKind::RequiredColumns)
        {
            tracing::debug!("Stage: required columns");
            results.extend(checks::check_required_columns(stats, required));
        }

        if let Some(RuleConfig::Unique(unique)) = config.rule(CheckKind::Unique) {
            tracing::debug!("Stage: uniqueness");
            results.extend(checks::check_unique(stats, unique));
        }

        if let Some(RuleConfig::RowCount(bounds)) = config.rule(CheckKind::RowCount) {
            tracing::debug!("Stage: row count");
            results.extend(checks::check_row_count(stats, bounds));
        }
        if config.run_volume_check {
            tracing::debug!("Stage: volume change");
            let volume = match config.rule(CheckKind::VolumeChange) {
                Some(RuleConfig::VolumeChange(volume)) => *volume,
                _ => VolumeChangeConfig::default(),
            };
            results.extend(checks::check_volume_change(
                stats,
                &volume,
                baseline.as_ref(),
            ));
        }

        let baseline_updated = self.store.save(stats)?;

        let run = RunResult {
            table: stats.table_name().to_string(),
            layer: stats.layer(),
            results,
            baseline_updated,
            error: None,
        };
        tracing::info!(
            "'{}': {} passed, {} warnings, {} failures{}",
            run.table,
            run.passed(),
            run.warnings(),
            run.failures(),
            if baseline_updated {
                ", baseline updated"
            } else {
                ""
            }
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{MemoryBaselineStore, ReadOnlyStore};
    use crate::checks::{RequiredConfig, RowCountConfig, SchemaConfig, UniqueConfig};
    use crate::models::ColumnStatistics;
    use chrono::Utc;

    fn orders(rows: u64, extra: Option<&str>) -> TableStatistics {
        let mut columns = vec![
            ColumnStatistics::new("order_id", "int", rows, 0, rows),
            ColumnStatistics::new("email", "string", rows, rows / 2, rows / 2),
        ];
        if let Some(name) = extra {
            columns.push(ColumnStatistics::new(name, "string", rows, 0, 1));
        }
        TableStatistics::new("orders", Layer::Staging, rows, columns, Utc::now())
    }

    fn full_config() -> TableConfig {
        TableConfig::new("orders", Layer::Staging, "main")
            .with_rule(RuleConfig::Schema(SchemaConfig::new([("order_id", "int")])))
            .with_rule(RuleConfig::RequiredColumns(RequiredConfig::new(["order_id"])))
            .with_rule(RuleConfig::Unique(UniqueConfig::single("order_id")))
            .with_rule(RuleConfig::RowCount(RowCountConfig {
                min_rows: Some(1),
                max_rows: None,
            }))
    }

    #[test]
    fn test_stage_order() {
        let runner = Runner::new(MemoryBaselineStore::new());
        let run = runner.run(&orders(1000, None), &full_config()).unwrap();

        let kinds: Vec<CheckKind> = run.results.iter().map(|r| r.check).collect();
        assert_eq!(
            kinds,
            vec![
                CheckKind::Schema,
                CheckKind::SchemaDrift,
                CheckKind::NullRate,
                CheckKind::NullRate,
                CheckKind::RequiredColumns,
                CheckKind::Unique,
                CheckKind::RowCount,
                CheckKind::VolumeChange,
            ]
        );
    }

    #[test]
    fn test_first_run_writes_baseline() {
        let runner = Runner::new(MemoryBaselineStore::new());
        let run = runner.run(&orders(1000, None), &full_config()).unwrap();

        assert!(run.baseline_updated);
        // email is 50% null
        assert!(run.has_failures());
        assert_eq!(run.overall_status(), Status::Fail);
        assert_eq!(runner.store().load("orders").unwrap().run_count, 1);
    }

    #[test]
    fn test_failing_run_still_persists_baseline() {
        let runner = Runner::new(MemoryBaselineStore::new());
        runner.run(&orders(1000, None), &full_config()).unwrap();
        let run = runner.run(&orders(100, None), &full_config()).unwrap();

        let volume = run
            .results
            .iter()
            .find(|r| r.check == CheckKind::VolumeChange)
            .unwrap();
        assert_eq!(volume.status, Status::Fail);
        assert!(run.baseline_updated);
        assert_eq!(runner.store().load("orders").unwrap().row_count, 100);
    }

    #[test]
    fn test_unchanged_run_does_not_rewrite() {
        let runner = Runner::new(MemoryBaselineStore::new());
        let config = TableConfig::new("orders", Layer::Staging, "main");
        runner.run(&orders(1000, None), &config).unwrap();
        let run = runner.run(&orders(1000, None), &config).unwrap();

        assert!(!run.baseline_updated);
        assert_eq!(runner.store().load("orders").unwrap().run_count, 1);
    }

    #[test]
    fn test_drift_detected_on_second_run() {
        let runner = Runner::new(MemoryBaselineStore::new());
        let config = TableConfig::new("orders", Layer::Staging, "main").with_null_check(false);
        runner.run(&orders(1000, None), &config).unwrap();
        let run = runner.run(&orders(1000, Some("region")), &config).unwrap();

        let drift: Vec<&CheckResult> = run
            .results
            .iter()
            .filter(|r| r.check == CheckKind::SchemaDrift)
            .collect();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].status, Status::Warn);
        assert!(run.has_warnings());
        assert!(!run.has_failures());
        assert_eq!(run.overall_status(), Status::Warn);
        assert!(run.baseline_updated);
    }

    #[test]
    fn test_toggles_disable_default_checks() {
        let runner = Runner::new(MemoryBaselineStore::new());
        let config = TableConfig::new("orders", Layer::Staging, "main")
            .with_null_check(false)
            .with_volume_check(false)
            .with_drift_check(false);
        let run = runner.run(&orders(1000, None), &config).unwrap();

        assert!(run.results.is_empty());
        // baseline is still maintained
        assert!(run.baseline_updated);
    }

    #[test]
    fn test_configured_null_thresholds_apply() {
        let runner = Runner::new(MemoryBaselineStore::new());
        let config = TableConfig::new("orders", Layer::Staging, "main")
            .with_rule(RuleConfig::NullRate(
                NullRateConfig::new(0.6, 0.9).with_columns(["email"]),
            ))
            .with_drift_check(false)
            .with_volume_check(false);
        let run = runner.run(&orders(1000, None), &config).unwrap();

        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].status, Status::Pass);
    }

    #[test]
    fn test_dry_run_leaves_store_untouched() {
        let runner = Runner::new(ReadOnlyStore::new(MemoryBaselineStore::new()));
        let run = runner
            .run(&orders(10, None), &TableConfig::new("orders", Layer::Staging, "main"))
            .unwrap();

        assert!(!run.baseline_updated);
        assert!(runner.store().load("orders").is_none());
    }

    #[test]
    fn test_failed_result_predicates() {
        let run = RunResult::failed("orders", Layer::Upstream, "connection refused");
        assert!(run.has_error());
        assert!(run.results.is_empty());
        assert!(!run.has_failures());
        assert_eq!(run.overall_status(), Status::Fail);
    }

    #[test]
    fn test_composite_keys_for_collector() {
        let config = TableConfig::new("orders", Layer::Staging, "main").with_rule(
            RuleConfig::Unique(UniqueConfig::single("order_id").with_key(["order_id", "line_no"])),
        );
        assert_eq!(
            config.composite_keys(),
            vec![vec!["order_id".to_string(), "line_no".to_string()]]
        );
    }
}
