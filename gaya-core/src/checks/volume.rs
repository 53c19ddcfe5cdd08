//! Row-count bounds and volume change against the baseline.
//!
//! A first run (no baseline) never fails the volume check; it reports that
//! a baseline is being established.

use super::config::{RowCountConfig, VolumeChangeConfig};
use super::format::{format_count, format_delta, format_pct};
use super::models::{CheckKind, CheckResult, CheckValue};
use crate::models::{Baseline, TableStatistics};

/// Validates the row count against absolute bounds. Always one result.
pub fn check_row_count(stats: &TableStatistics, config: &RowCountConfig) -> Vec<CheckResult> {
    let count = stats.row_count();

    let result = match (config.min_rows, config.max_rows) {
        (Some(min), _) if count < min => CheckResult::fail(
            CheckKind::RowCount,
            stats,
            format!(
                "Row count {} is below minimum {}.",
                format_count(count),
                format_count(min)
            ),
        )
        .with_expected(format!(">= {}", format_count(min)))
        .with_actual(CheckValue::Count(count))
        .with_hint("The table may not have loaded correctly or the source is empty."),
        (_, Some(max)) if count > max => CheckResult::fail(
            CheckKind::RowCount,
            stats,
            format!(
                "Row count {} exceeds maximum {}.",
                format_count(count),
                format_count(max)
            ),
        )
        .with_expected(format!("<= {}", format_count(max)))
        .with_actual(CheckValue::Count(count))
        .with_hint("This may indicate duplicate rows or an unintended full reload."),
        _ => CheckResult::pass(
            CheckKind::RowCount,
            stats,
            format!("Row count {} is within expected range.", format_count(count)),
        )
        .with_actual(CheckValue::Count(count)),
    };

    vec![result]
}

/// Compares the row count with the baseline's. Always one result.
pub fn check_volume_change(
    stats: &TableStatistics,
    config: &VolumeChangeConfig,
    baseline: Option<&Baseline>,
) -> Vec<CheckResult> {
    let current = stats.row_count();

    let Some(baseline) = baseline else {
        return vec![
            CheckResult::pass(
                CheckKind::VolumeChange,
                stats,
                format!(
                    "No baseline found for '{}'. Baseline set at {} rows. Run again to detect volume changes.",
                    stats.table_name(),
                    format_count(current)
                ),
            )
            .with_actual(CheckValue::Count(current)),
        ];
    };

    let previous = baseline.row_count;
    let delta = i128::from(current) - i128::from(previous);
    let change_pct = delta.unsigned_abs() as f64 / previous.max(1) as f64;
    let direction = if delta > 0 { "increased" } else { "dropped" };
    let movement = format!(
        "{} → {}, {} rows",
        format_count(previous),
        format_count(current),
        format_delta(delta)
    );

    // An unchanged count passes even with zero thresholds
    let result = if delta == 0 {
        CheckResult::pass(
            CheckKind::VolumeChange,
            stats,
            format!("Row count stable: {} (no change).", movement),
        )
        .with_actual(format!("{} change", format_pct(0.0)))
    } else if change_pct >= config.fail_pct {
        let hint = if delta < 0 {
            "A drop this large usually means a failed upstream load or a filter was applied unintentionally."
        } else {
            "A spike this large may indicate duplicate rows or a full reload."
        };
        CheckResult::fail(
            CheckKind::VolumeChange,
            stats,
            format!(
                "Row count {} {} ({}).",
                direction,
                format_pct(change_pct),
                movement
            ),
        )
        .with_expected(format!("< {} change", format_pct(config.fail_pct)))
        .with_actual(format!("{} {}", format_pct(change_pct), direction))
        .with_hint(hint)
    } else if change_pct >= config.warn_pct {
        CheckResult::warn(
            CheckKind::VolumeChange,
            stats,
            format!(
                "Row count {} {} ({}).",
                direction,
                format_pct(change_pct),
                movement
            ),
        )
        .with_expected(format!("< {} change", format_pct(config.warn_pct)))
        .with_actual(format!("{} {}", format_pct(change_pct), direction))
    } else {
        CheckResult::pass(
            CheckKind::VolumeChange,
            stats,
            format!(
                "Row count stable: {} ({} change).",
                movement,
                format_pct(change_pct)
            ),
        )
        .with_actual(format!("{} change", format_pct(change_pct)))
    };

    vec![result]
}
