//! Schema contract and schema drift checks.
//!
//! The contract check compares against explicitly configured types. Drift
//! compares the current column set with the baseline's and needs no
//! configuration.

use std::collections::BTreeSet;

use super::config::SchemaConfig;
use super::models::{CheckKind, CheckResult, CheckValue};
use crate::models::{Baseline, TableStatistics};

/// Validates expected columns and types, one result per configured column.
///
/// Type comparison is case-insensitive.
pub fn check_schema(stats: &TableStatistics, config: &SchemaConfig) -> Vec<CheckResult> {
    config
        .expected
        .iter()
        .map(|(name, expected_type)| match stats.schema().get(name) {
            None => CheckResult::fail(
                CheckKind::Schema,
                stats,
                format!(
                    "Expected column '{}' ({}) is missing from the table.",
                    name, expected_type
                ),
            )
            .with_column(name)
            .with_expected(expected_type.as_str())
            .with_hint("Column may have been dropped or renamed upstream."),
            Some(actual_type) if !actual_type.eq_ignore_ascii_case(expected_type) => {
                CheckResult::fail(
                    CheckKind::Schema,
                    stats,
                    format!(
                        "'{}' type mismatch: expected '{}', found '{}'.",
                        name, expected_type, actual_type
                    ),
                )
                .with_column(name)
                .with_expected(expected_type.as_str())
                .with_actual(actual_type.as_str())
                .with_hint(
                    "A type change can silently break downstream queries. Verify this was intentional.",
                )
            }
            Some(actual_type) => CheckResult::pass(
                CheckKind::Schema,
                stats,
                format!("'{}' is '{}' as expected.", name, actual_type),
            )
            .with_column(name)
            .with_expected(expected_type.as_str())
            .with_actual(actual_type.as_str()),
        })
        .collect()
}

/// Detects added and removed columns since the baseline.
///
/// Removed columns fail, added columns warn, and the failure is emitted
/// first when both occur. Without a baseline the check passes.
pub fn check_schema_drift(stats: &TableStatistics, baseline: Option<&Baseline>) -> Vec<CheckResult> {
    let current: BTreeSet<&str> = stats.column_names().collect();

    let Some(baseline) = baseline else {
        return vec![
            CheckResult::pass(
                CheckKind::SchemaDrift,
                stats,
                format!(
                    "No baseline schema found for '{}'. Schema recorded with {} columns. Run again to detect drift.",
                    stats.table_name(),
                    current.len()
                ),
            )
            .with_actual(sorted_names(&current)),
        ];
    };

    let previous = baseline.column_names();
    let removed: BTreeSet<&str> = previous.difference(&current).copied().collect();
    let added: BTreeSet<&str> = current.difference(&previous).copied().collect();

    if removed.is_empty() && added.is_empty() {
        return vec![CheckResult::pass(
            CheckKind::SchemaDrift,
            stats,
            format!(
                "Schema unchanged. {} columns match baseline.",
                current.len()
            ),
        )];
    }

    let mut results = Vec::with_capacity(2);

    if !removed.is_empty() {
        results.push(
            CheckResult::fail(
                CheckKind::SchemaDrift,
                stats,
                format!(
                    "{} column(s) removed since last run: {}.",
                    removed.len(),
                    join(&removed)
                ),
            )
            .with_expected(sorted_names(&previous))
            .with_actual(sorted_names(&current))
            .with_hint(
                "Removed columns break downstream SELECT * queries and any explicit column references. Verify this was intentional.",
            ),
        );
    }

    if !added.is_empty() {
        results.push(
            CheckResult::warn(
                CheckKind::SchemaDrift,
                stats,
                format!(
                    "{} new column(s) detected since last run: {}.",
                    added.len(),
                    join(&added)
                ),
            )
            .with_expected(sorted_names(&previous))
            .with_actual(sorted_names(&current))
            .with_hint("New columns are usually safe, but verify they're intentional and documented."),
        );
    }

    results
}

fn sorted_names(names: &BTreeSet<&str>) -> CheckValue {
    CheckValue::Columns(names.iter().map(|s| (*s).to_string()).collect())
}

fn join(names: &BTreeSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Status;
    use crate::models::{ColumnStatistics, Layer, Schema};
    use chrono::Utc;

    fn table(columns: &[(&str, &str)]) -> TableStatistics {
        TableStatistics::new(
            "events",
            Layer::Upstream,
            100,
            columns
                .iter()
                .map(|(name, ty)| ColumnStatistics::new(*name, *ty, 100, 0, 100))
                .collect(),
            Utc::now(),
        )
    }

    fn baseline(columns: &[&str]) -> Baseline {
        Baseline {
            table_name: "events".to_string(),
            row_count: 100,
            schema: columns
                .iter()
                .map(|c| ((*c).to_string(), "int".to_string()))
                .collect::<Schema>(),
            run_at: Utc::now(),
            run_count: 3,
        }
    }

    #[test]
    fn test_schema_contract() {
        let stats = table(&[("id", "int"), ("name", "STRING"), ("ts", "date")]);
        let config = SchemaConfig::new([
            ("id", "int"),
            ("name", "string"),
            ("ts", "timestamp"),
            ("region", "string"),
        ]);
        let results = check_schema(&stats, &config);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].status, Status::Pass);
        // case-insensitive comparison
        assert_eq!(results[1].status, Status::Pass);
        assert_eq!(results[2].status, Status::Fail);
        assert!(results[2].message.contains("type mismatch"));
        assert_eq!(results[3].status, Status::Fail);
        assert!(results[3].message.contains("missing"));
        assert!(results[3].actual.is_none());
    }

    #[test]
    fn test_drift_first_run_passes() {
        let stats = table(&[("a", "int"), ("b", "int"), ("c", "int")]);
        let results = check_schema_drift(&stats, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Status::Pass);
        assert!(results[0].message.contains("3 columns"));
    }

    #[test]
    fn test_drift_unchanged() {
        let stats = table(&[("a", "int"), ("b", "string")]);
        let results = check_schema_drift(&stats, Some(&baseline(&["b", "a"])));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Status::Pass);
    }

    #[test]
    fn test_drift_removed_before_added() {
        let stats = table(&[("a", "int"), ("b", "int"), ("c", "int")]);
        let results = check_schema_drift(&stats, Some(&baseline(&["a", "d"])));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, Status::Fail);
        assert!(results[0].message.contains("1 column(s) removed"));
        assert!(results[0].message.ends_with("since last run: d."));
        assert_eq!(results[1].status, Status::Warn);
        assert_eq!(
            results[1].message,
            "2 new column(s) detected since last run: b, c."
        );
    }

    #[test]
    fn test_drift_ignores_type_changes() {
        let stats = table(&[("a", "string")]);
        let results = check_schema_drift(&stats, Some(&baseline(&["a"])));
        assert_eq!(results[0].status, Status::Pass);
    }
}
