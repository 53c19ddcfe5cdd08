//! Check outcome models.
//!
//! [`CheckResult`] is the only value that crosses from rule evaluation to
//! rendering. Optional fields that a rule did not populate stay `None` and
//! are omitted from serialized output.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::format::{format_count, format_pct};
use crate::models::{Layer, TableStatistics};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a rule type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    NullRate,
    RequiredColumns,
    Unique,
    RowCount,
    VolumeChange,
    Schema,
    SchemaDrift,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::NullRate => "null_rate",
            CheckKind::RequiredColumns => "required_columns",
            CheckKind::Unique => "unique",
            CheckKind::RowCount => "row_count",
            CheckKind::VolumeChange => "volume_change",
            CheckKind::Schema => "schema",
            CheckKind::SchemaDrift => "schema_drift",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected or actual value attached to a check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    Count(u64),
    Ratio(f64),
    Columns(Vec<String>),
    Text(String),
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckValue::Count(n) => f.write_str(&format_count(*n)),
            CheckValue::Ratio(r) => f.write_str(&format_pct(*r)),
            CheckValue::Columns(names) => f.write_str(&names.join(", ")),
            CheckValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CheckValue {
    fn from(value: &str) -> Self {
        CheckValue::Text(value.to_string())
    }
}

impl From<String> for CheckValue {
    fn from(value: String) -> Self {
        CheckValue::Text(value)
    }
}

/// Immutable result of one rule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: CheckKind,
    pub table: String,
    pub layer: Layer,
    pub status: Status,
    /// Complete, self-contained sentence
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<CheckValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<CheckValue>,
    /// Suggested next action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CheckResult {
    fn new(
        check: CheckKind,
        stats: &TableStatistics,
        status: Status,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check,
            table: stats.table_name().to_string(),
            layer: stats.layer(),
            status,
            message: message.into(),
            column: None,
            expected: None,
            actual: None,
            hint: None,
        }
    }

    pub fn pass(check: CheckKind, stats: &TableStatistics, message: impl Into<String>) -> Self {
        Self::new(check, stats, Status::Pass, message)
    }

    pub fn warn(check: CheckKind, stats: &TableStatistics, message: impl Into<String>) -> Self {
        Self::new(check, stats, Status::Warn, message)
    }

    pub fn fail(check: CheckKind, stats: &TableStatistics, message: impl Into<String>) -> Self {
        Self::new(check, stats, Status::Fail, message)
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<CheckValue>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<CheckValue>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }

    pub fn warned(&self) -> bool {
        self.status == Status::Warn
    }

    pub fn failed(&self) -> bool {
        self.status == Status::Fail
    }
}
