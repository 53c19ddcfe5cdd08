//! Run summary rendering.
//!
//! Three modes share one [`RunSummary`]:
//! - human: tables with issues first, then a footer and the clean tables
//! - quiet: one greppable line per failure, warning or table error
//! - JSON: a single document for tooling
//!
//! Renderers only display what the runner returned. Output is deterministic
//! for a given summary.

use std::io::{self, Write};
use std::time::Duration;

use gaya_core::{CheckResult, RunResult, Status};
use serde::Serialize;

use crate::exit_codes;

const RULE_WIDTH: usize = 54;

/// Results for every configured table plus wall-clock duration.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub results: Vec<RunResult>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(results: Vec<RunResult>, duration: Duration) -> Self {
        Self { results, duration }
    }

    pub fn total_checks(&self) -> usize {
        self.results.iter().map(|r| r.results.len()).sum()
    }

    pub fn total_passed(&self) -> usize {
        self.results.iter().map(RunResult::passed).sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.results.iter().map(RunResult::warnings).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.results.iter().map(RunResult::failures).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.results.iter().filter(|r| r.has_error()).count()
    }

    /// Table errors outrank failures, which outrank warnings.
    pub fn exit_code(&self) -> i32 {
        if self.results.iter().any(RunResult::has_error) {
            exit_codes::INFRASTRUCTURE_ERROR
        } else if self.results.iter().any(RunResult::has_failures) {
            exit_codes::FAILURES
        } else if self.results.iter().any(RunResult::has_warnings) {
            exit_codes::WARNINGS
        } else {
            exit_codes::SUCCESS
        }
    }
}

/// Output mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Quiet,
    Json,
}

/// Writes `summary` in the given mode.
///
/// # Errors
/// Returns an I/O error if the writer fails
pub fn render(summary: &RunSummary, mode: OutputMode, out: &mut impl Write) -> io::Result<()> {
    match mode {
        OutputMode::Human => render_human(summary, out),
        OutputMode::Quiet => render_quiet(summary, out),
        OutputMode::Json => render_json(summary, out),
    }
}

fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "  {}", "─".repeat(RULE_WIDTH))
}

fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Pass => "✔",
        Status::Warn => "⚠",
        Status::Fail => "✖",
    }
}

fn needs_attention(result: &RunResult) -> bool {
    result.has_error() || result.has_failures() || result.has_warnings()
}

pub fn render_human(summary: &RunSummary, out: &mut impl Write) -> io::Result<()> {
    rule(out)?;

    let (issues, clean): (Vec<&RunResult>, Vec<&RunResult>) =
        summary.results.iter().partition(|r| needs_attention(r));

    for result in &issues {
        render_table_block(result, out)?;
    }

    rule(out)?;
    if summary.total_failures() == 0 && summary.total_warnings() == 0 && summary.total_errors() == 0
    {
        writeln!(
            out,
            "  All checks passed ({} checks across {} table(s))",
            summary.total_checks(),
            summary.results.len()
        )?;
    } else {
        let mut parts = Vec::new();
        if summary.total_errors() > 0 {
            parts.push(format!("{} errored", summary.total_errors()));
        }
        if summary.total_failures() > 0 {
            parts.push(format!("{} failed", summary.total_failures()));
        }
        if summary.total_warnings() > 0 {
            parts.push(format!("{} warned", summary.total_warnings()));
        }
        if summary.total_passed() > 0 {
            parts.push(format!("{} passed", summary.total_passed()));
        }
        writeln!(
            out,
            "  {} table(s) · {}",
            summary.results.len(),
            parts.join(" · ")
        )?;
    }
    writeln!(out, "  Finished in {:.1}s", summary.duration.as_secs_f64())?;
    rule(out)?;

    if !clean.is_empty() {
        for result in clean {
            writeln!(
                out,
                "  ✔  {}.{}  ({} checks passed)",
                result.layer,
                result.table,
                result.results.len()
            )?;
        }
        rule(out)?;
    }
    Ok(())
}

fn render_table_block(result: &RunResult, out: &mut impl Write) -> io::Result<()> {
    if let Some(error) = &result.error {
        writeln!(out, "\n  ✖  {}.{}  ERROR", result.layer, result.table)?;
        writeln!(out, "     Error: {}", error)?;
        return Ok(());
    }

    let (icon, label) = if result.has_failures() {
        ("✖", "FAILED")
    } else {
        ("⚠", "WARN")
    };
    writeln!(out, "\n  {}  {}.{}  {}", icon, result.layer, result.table, label)?;

    let failures = result.results.iter().filter(|r| r.failed());
    let warnings = result.results.iter().filter(|r| r.warned());
    for check in failures.chain(warnings) {
        let column = check
            .column
            .as_deref()
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default();
        writeln!(
            out,
            "     {}{}  {}",
            status_icon(check.status),
            column,
            check.message
        )?;
        if let Some(hint) = &check.hint {
            writeln!(out, "          → {}", hint)?;
        }
    }
    Ok(())
}

pub fn render_quiet(summary: &RunSummary, out: &mut impl Write) -> io::Result<()> {
    for result in &summary.results {
        if let Some(error) = &result.error {
            writeln!(out, "ERROR {}.{} {}", result.layer, result.table, error)?;
            continue;
        }
        let failures = result.results.iter().filter(|r| r.failed());
        let warnings = result.results.iter().filter(|r| r.warned());
        for check in failures.chain(warnings) {
            let column = check
                .column
                .as_deref()
                .map(|c| format!("[{}] ", c))
                .unwrap_or_default();
            writeln!(
                out,
                "{} {}.{} {}{}",
                check.status, result.layer, result.table, column, check.check
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    exit_code: i32,
    total_checks: usize,
    total_passed: usize,
    total_warnings: usize,
    total_failures: usize,
    duration_secs: f64,
    tables: Vec<JsonTable<'a>>,
}

#[derive(Serialize)]
struct JsonTable<'a> {
    table: &'a str,
    layer: gaya_core::Layer,
    status: Status,
    error: Option<&'a str>,
    baseline_updated: bool,
    checks: Vec<JsonCheck<'a>>,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    check: gaya_core::CheckKind,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<&'a str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

impl<'a> From<&'a CheckResult> for JsonCheck<'a> {
    fn from(check: &'a CheckResult) -> Self {
        Self {
            check: check.check,
            status: check.status,
            column: check.column.as_deref(),
            message: &check.message,
            expected: check.expected.as_ref().map(ToString::to_string),
            actual: check.actual.as_ref().map(ToString::to_string),
            hint: check.hint.as_deref(),
        }
    }
}

pub fn render_json(summary: &RunSummary, out: &mut impl Write) -> io::Result<()> {
    let report = JsonReport {
        exit_code: summary.exit_code(),
        total_checks: summary.total_checks(),
        total_passed: summary.total_passed(),
        total_warnings: summary.total_warnings(),
        total_failures: summary.total_failures(),
        duration_secs: (summary.duration.as_secs_f64() * 100.0).round() / 100.0,
        tables: summary
            .results
            .iter()
            .map(|r| JsonTable {
                table: &r.table,
                layer: r.layer,
                status: r.overall_status(),
                error: r.error.as_deref(),
                baseline_updated: r.baseline_updated,
                checks: r.results.iter().map(JsonCheck::from).collect(),
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)
}
