//! Null-rate and required-column checks.

use super::config::{NullRateConfig, RequiredConfig};
use super::format::{format_count, format_pct};
use super::models::{CheckKind, CheckResult, CheckValue};
use crate::models::{ColumnStatistics, TableStatistics};

/// Checks the null fraction of each column in scope against thresholds.
///
/// Scope is the configured column list, or every column when none is
/// configured. A configured name that does not resolve yields a FAIL for
/// that name. One result per column, in scope order.
pub fn check_null_rate(stats: &TableStatistics, config: &NullRateConfig) -> Vec<CheckResult> {
    let scope: Vec<(&str, Option<&ColumnStatistics>)> = match &config.columns {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| (name.as_str(), stats.column(name)))
            .collect(),
        _ => stats
            .columns()
            .iter()
            .map(|col| (col.name.as_str(), Some(col)))
            .collect(),
    };

    scope
        .into_iter()
        .map(|(name, column)| match column {
            Some(col) => classify_null_rate(stats, col, config),
            None => CheckResult::fail(
                CheckKind::NullRate,
                stats,
                format!("Column '{}' specified in null check does not exist in table.", name),
            )
            .with_column(name)
            .with_hint("Check your gaya.yml; the column name may be misspelled."),
        })
        .collect()
}

fn classify_null_rate(
    stats: &TableStatistics,
    col: &ColumnStatistics,
    config: &NullRateConfig,
) -> CheckResult {
    let pct = col.null_pct();

    if col.null_count == 0 || col.row_count == 0 {
        return CheckResult::pass(
            CheckKind::NullRate,
            stats,
            format!("'{}' has no nulls.", col.name),
        )
        .with_column(&col.name)
        .with_actual(CheckValue::Ratio(0.0));
    }

    if pct >= config.fail_pct {
        CheckResult::fail(
            CheckKind::NullRate,
            stats,
            format!(
                "'{}' is {} null, exceeding the fail threshold of {}.",
                col.name,
                format_pct(pct),
                format_pct(config.fail_pct)
            ),
        )
        .with_column(&col.name)
        .with_expected(format!("< {}", format_pct(config.fail_pct)))
        .with_actual(CheckValue::Ratio(pct))
    } else if pct >= config.warn_pct {
        CheckResult::warn(
            CheckKind::NullRate,
            stats,
            format!(
                "'{}' is {} null, above the warn threshold of {}.",
                col.name,
                format_pct(pct),
                format_pct(config.warn_pct)
            ),
        )
        .with_column(&col.name)
        .with_expected(format!("< {}", format_pct(config.warn_pct)))
        .with_actual(CheckValue::Ratio(pct))
    } else {
        CheckResult::pass(
            CheckKind::NullRate,
            stats,
            format!(
                "'{}' null rate {} is within threshold.",
                col.name,
                format_pct(pct)
            ),
        )
        .with_column(&col.name)
        .with_actual(CheckValue::Ratio(pct))
    }
}

/// Checks that each required column exists and has no nulls.
pub fn check_required_columns(stats: &TableStatistics, config: &RequiredConfig) -> Vec<CheckResult> {
    config
        .columns
        .iter()
        .map(|name| match stats.column(name) {
            None => CheckResult::fail(
                CheckKind::RequiredColumns,
                stats,
                format!("Required column '{}' is missing from the table entirely.", name),
            )
            .with_column(name)
            .with_hint("Verify the column exists in the source and hasn't been renamed."),
            Some(col) if col.null_count > 0 => CheckResult::fail(
                CheckKind::RequiredColumns,
                stats,
                format!(
                    "Required column '{}' has {} null(s) ({} of {} rows).",
                    name,
                    format_count(col.null_count),
                    format_pct(col.null_pct()),
                    format_count(stats.row_count())
                ),
            )
            .with_column(name)
            .with_expected(CheckValue::Count(0))
            .with_actual(CheckValue::Count(col.null_count))
            .with_hint("This column is marked required; nulls here indicate an upstream issue."),
            Some(_) => CheckResult::pass(
                CheckKind::RequiredColumns,
                stats,
                format!("Required column '{}' is complete.", name),
            )
            .with_column(name),
        })
        .collect()
}
