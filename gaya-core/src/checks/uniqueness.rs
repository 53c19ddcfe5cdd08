//! Uniqueness checks for single columns and composite keys.
//!
//! Duplicates are `row_count - distinct_count` of the column, or of the
//! composite statistics the collector attached for a multi-column key.
//! Uniqueness is binary: any duplicate fails, there is no warn tier.

use super::config::UniqueConfig;
use super::format::format_count;
use super::models::{CheckKind, CheckResult, CheckValue};
use crate::models::{CompositeKey, TableStatistics};

/// Evaluates every configured key in order, one result per key.
pub fn check_unique(stats: &TableStatistics, config: &UniqueConfig) -> Vec<CheckResult> {
    config
        .keys
        .iter()
        .filter_map(|key| match key.as_slice() {
            [] => None,
            [column] => Some(check_single(stats, column)),
            columns => Some(check_composite(stats, columns)),
        })
        .collect()
}

fn check_single(stats: &TableStatistics, name: &str) -> CheckResult {
    let Some(col) = stats.column(name) else {
        return CheckResult::fail(
            CheckKind::Unique,
            stats,
            format!(
                "Column '{}' specified for uniqueness check does not exist.",
                name
            ),
        )
        .with_column(name)
        .with_hint("Check your gaya.yml for a misspelled column name.");
    };

    let duplicates = col.duplicate_count();
    if duplicates > 0 {
        CheckResult::fail(
            CheckKind::Unique,
            stats,
            format!(
                "'{}' has {} duplicate value(s) across {} rows ({} distinct).",
                name,
                format_count(duplicates),
                format_count(col.row_count),
                format_count(col.distinct_count)
            ),
        )
        .with_column(name)
        .with_expected("all distinct")
        .with_actual(CheckValue::Count(duplicates))
        .with_hint(
            "Duplicates in a key column usually indicate a pipeline loading the same records more than once.",
        )
    } else {
        CheckResult::pass(
            CheckKind::Unique,
            stats,
            format!(
                "'{}' is fully unique ({} distinct values).",
                name,
                format_count(col.distinct_count)
            ),
        )
        .with_column(name)
    }
}

fn check_composite(stats: &TableStatistics, columns: &[String]) -> CheckResult {
    let key = CompositeKey::new(columns.iter().cloned());
    let listed = columns.join(", ");

    let Some(col) = stats.composite(columns) else {
        return CheckResult::fail(
            CheckKind::Unique,
            stats,
            format!(
                "Composite key uniqueness check requires columns [{}]; one or more are missing from the table.",
                listed
            ),
        )
        .with_column(key.display_name())
        .with_hint("Verify all composite key columns exist in the table.");
    };

    let duplicates = col.duplicate_count();
    if duplicates > 0 {
        CheckResult::fail(
            CheckKind::Unique,
            stats,
            format!(
                "Composite key [{}] has {} duplicate combination(s) across {} rows.",
                listed,
                format_count(duplicates),
                format_count(col.row_count)
            ),
        )
        .with_column(key.display_name())
        .with_expected("all distinct")
        .with_actual(CheckValue::Count(duplicates))
        .with_hint(
            "Composite key duplicates may indicate a missing deduplication step or an unintended cross-join upstream.",
        )
    } else {
        CheckResult::pass(
            CheckKind::Unique,
            stats,
            format!(
                "Composite key [{}] is fully unique ({} distinct combinations).",
                listed,
                format_count(col.distinct_count)
            ),
        )
        .with_column(key.display_name())
    }
}
