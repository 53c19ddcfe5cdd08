//! Rule configuration.
//!
//! One configuration type per rule, gathered into the closed [`RuleConfig`]
//! enum so a table's rule set can be stored as a map keyed by
//! [`CheckKind`]. Thresholds are fractions in `[0.0, 1.0]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::CheckKind;

/// Validation errors for rule thresholds.
#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("{name} threshold must be between 0.0 and 1.0, got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("{name}: warn threshold ({warn}) must not exceed fail threshold ({fail})")]
    Inverted {
        name: &'static str,
        warn: f64,
        fail: f64,
    },
}

fn validate_pair(name: &'static str, warn: f64, fail: f64) -> Result<(), ThresholdError> {
    for value in [warn, fail] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ThresholdError::OutOfRange { name, value });
        }
    }
    if warn > fail {
        return Err(ThresholdError::Inverted { name, warn, fail });
    }
    Ok(())
}

/// Null-rate thresholds and optional column scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullRateConfig {
    /// Columns to check; `None` checks every column
    pub columns: Option<Vec<String>>,
    pub warn_pct: f64,
    pub fail_pct: f64,
}

impl Default for NullRateConfig {
    fn default() -> Self {
        Self {
            columns: None,
            warn_pct: 0.10,
            fail_pct: 0.25,
        }
    }
}

impl NullRateConfig {
    pub fn new(warn_pct: f64, fail_pct: f64) -> Self {
        Self {
            columns: None,
            warn_pct,
            fail_pct,
        }
    }

    /// Restricts the check to the named columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        validate_pair("null rate", self.warn_pct, self.fail_pct)
    }
}

/// Columns that must exist and contain no nulls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequiredConfig {
    pub columns: Vec<String>,
}

impl RequiredConfig {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Uniqueness constraints, evaluated in order.
///
/// Each key is a list of column names: one name is a single-column check,
/// several names form a composite key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UniqueConfig {
    pub keys: Vec<Vec<String>>,
}

impl UniqueConfig {
    pub fn single(column: impl Into<String>) -> Self {
        Self {
            keys: vec![vec![column.into()]],
        }
    }

    pub fn with_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Keys spanning more than one column.
    pub fn composite_keys(&self) -> impl Iterator<Item = &[String]> {
        self.keys
            .iter()
            .filter(|k| k.len() > 1)
            .map(Vec::as_slice)
    }
}

/// Absolute row-count bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowCountConfig {
    pub min_rows: Option<u64>,
    pub max_rows: Option<u64>,
}

/// Relative row-count change thresholds against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeChangeConfig {
    pub warn_pct: f64,
    pub fail_pct: f64,
}

impl Default for VolumeChangeConfig {
    fn default() -> Self {
        Self {
            warn_pct: 0.20,
            fail_pct: 0.40,
        }
    }
}

impl VolumeChangeConfig {
    pub fn new(warn_pct: f64, fail_pct: f64) -> Self {
        Self { warn_pct, fail_pct }
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        validate_pair("volume change", self.warn_pct, self.fail_pct)
    }
}

/// Expected column types, in configuration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub expected: Vec<(String, String)>,
}

impl SchemaConfig {
    pub fn new<I, K, V>(expected: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            expected: expected
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A configured rule.
///
/// Schema drift has no configuration and is controlled only by the
/// per-table drift toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum RuleConfig {
    NullRate(NullRateConfig),
    RequiredColumns(RequiredConfig),
    Unique(UniqueConfig),
    RowCount(RowCountConfig),
    VolumeChange(VolumeChangeConfig),
    Schema(SchemaConfig),
}

impl RuleConfig {
    pub fn kind(&self) -> CheckKind {
        match self {
            RuleConfig::NullRate(_) => CheckKind::NullRate,
            RuleConfig::RequiredColumns(_) => CheckKind::RequiredColumns,
            RuleConfig::Unique(_) => CheckKind::Unique,
            RuleConfig::RowCount(_) => CheckKind::RowCount,
            RuleConfig::VolumeChange(_) => CheckKind::VolumeChange,
            RuleConfig::Schema(_) => CheckKind::Schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let null = NullRateConfig::default();
        assert_eq!(null.warn_pct, 0.10);
        assert_eq!(null.fail_pct, 0.25);
        assert!(null.columns.is_none());

        let volume = VolumeChangeConfig::default();
        assert_eq!(volume.warn_pct, 0.20);
        assert_eq!(volume.fail_pct, 0.40);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(NullRateConfig::new(0.05, 0.20).validate().is_ok());
        assert!(NullRateConfig::new(0.2, 0.2).validate().is_ok());
        assert_eq!(
            NullRateConfig::new(0.30, 0.20).validate(),
            Err(ThresholdError::Inverted {
                name: "null rate",
                warn: 0.30,
                fail: 0.20
            })
        );
        assert!(matches!(
            VolumeChangeConfig::new(0.2, 1.5).validate(),
            Err(ThresholdError::OutOfRange { value, .. }) if value == 1.5
        ));
        assert!(VolumeChangeConfig::new(-0.1, 0.4).validate().is_err());
    }

    #[test]
    fn test_composite_keys() {
        let config = UniqueConfig::single("order_id").with_key(["order_id", "line_no"]);
        let composites: Vec<&[String]> = config.composite_keys().collect();
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0], ["order_id".to_string(), "line_no".to_string()]);
    }

    #[test]
    fn test_rule_kind() {
        assert_eq!(
            RuleConfig::Unique(UniqueConfig::single("id")).kind(),
            CheckKind::Unique
        );
        assert_eq!(
            RuleConfig::RowCount(RowCountConfig::default()).kind(),
            CheckKind::RowCount
        );
    }
}
