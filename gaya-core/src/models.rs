//! Statistics model: the frozen input to every check.
//!
//! A collector produces one [`TableStatistics`] per table per run. From then
//! on it is read-only; checks, the runner and the baseline store only ever
//! borrow it. [`Baseline`] is the same shape of facts as persisted by an
//! earlier run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GayaError;

/// Column name to normalized type tag.
///
/// Ordered so that equality is structural and serialized baselines are
/// stable across runs.
pub type Schema = BTreeMap<String, String>;

/// Pipeline stage a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Upstream,
    #[default]
    Staging,
    Downstream,
}

impl Layer {
    /// Lowercase tag used in config files and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Upstream => "upstream",
            Layer::Staging => "staging",
            Layer::Downstream => "downstream",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = GayaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upstream" => Ok(Layer::Upstream),
            "staging" => Ok(Layer::Staging),
            "downstream" => Ok(Layer::Downstream),
            other => Err(GayaError::configuration(format!(
                "Unknown layer '{}'. Expected one of: upstream, staging, downstream",
                other
            ))),
        }
    }
}

/// Opaque min/max value reported by a collector.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ColumnValue {
    /// Interprets a textual aggregate according to the column's normalized type.
    pub fn parse_as(raw: &str, normalized_type: &str) -> Self {
        match normalized_type {
            "int" => raw
                .parse::<i64>()
                .map(ColumnValue::Integer)
                .unwrap_or_else(|_| ColumnValue::Text(raw.to_string())),
            "float" | "numeric" => raw
                .parse::<f64>()
                .map(ColumnValue::Float)
                .unwrap_or_else(|_| ColumnValue::Text(raw.to_string())),
            _ => ColumnValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Integer(v) => write!(f, "{}", v),
            ColumnValue::Float(v) => write!(f, "{}", v),
            ColumnValue::Text(v) => f.write_str(v),
        }
    }
}

/// Pre-aggregated statistics for a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub name: String,
    /// Normalized type tag (`int`, `string`, `timestamp`, ...)
    pub data_type: String,
    pub row_count: u64,
    pub null_count: u64,
    pub distinct_count: u64,
    pub min_value: Option<ColumnValue>,
    pub max_value: Option<ColumnValue>,
}

impl ColumnStatistics {
    /// Creates column statistics without min/max.
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        row_count: u64,
        null_count: u64,
        distinct_count: u64,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            row_count,
            null_count,
            distinct_count,
            min_value: None,
            max_value: None,
        }
    }

    /// Sets the observed value range.
    pub fn with_range(mut self, min: Option<ColumnValue>, max: Option<ColumnValue>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    /// Fraction of null values; an empty table has no nulls.
    pub fn null_pct(&self) -> f64 {
        if self.row_count == 0 {
            return 0.0;
        }
        self.null_count as f64 / self.row_count as f64
    }

    /// Rows whose value repeats an earlier one.
    pub fn duplicate_count(&self) -> u64 {
        self.row_count.saturating_sub(self.distinct_count)
    }
}

/// Ordered list of columns forming a composite uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(Vec<String>);

impl CompositeKey {
    /// Delimiter used in the display name of a composite key.
    pub const DELIMITER: char = '|';

    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    /// Name of the synthetic column, e.g. `order_id|customer_id`.
    pub fn display_name(&self) -> String {
        self.0.join(&Self::DELIMITER.to_string())
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Everything a check needs to know about one table at one point in time.
///
/// The schema is derived from the column list at construction, so its keys
/// are always exactly the column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStatistics {
    table_name: String,
    layer: Layer,
    row_count: u64,
    columns: Vec<ColumnStatistics>,
    schema: Schema,
    composites: Vec<(CompositeKey, ColumnStatistics)>,
    collected_at: DateTime<Utc>,
}

impl TableStatistics {
    pub fn new(
        table_name: impl Into<String>,
        layer: Layer,
        row_count: u64,
        columns: Vec<ColumnStatistics>,
        collected_at: DateTime<Utc>,
    ) -> Self {
        let schema = columns
            .iter()
            .map(|c| (c.name.clone(), c.data_type.clone()))
            .collect();
        Self {
            table_name: table_name.into(),
            layer,
            row_count,
            columns,
            schema,
            composites: Vec::new(),
            collected_at,
        }
    }

    /// Attaches the combined statistics of a composite key.
    ///
    /// Composite entries never appear in [`columns`](Self::columns) or the
    /// schema; they are only reachable through [`composite`](Self::composite).
    pub fn with_composite(mut self, key: CompositeKey, stats: ColumnStatistics) -> Self {
        self.composites.retain(|(existing, _)| existing != &key);
        self.composites.push((key, stats));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Columns in source order.
    pub fn columns(&self) -> &[ColumnStatistics] {
        &self.columns
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnStatistics> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up composite statistics by the ordered list of key columns.
    pub fn composite(&self, columns: &[String]) -> Option<&ColumnStatistics> {
        self.composites
            .iter()
            .find(|(key, _)| key.columns() == columns)
            .map(|(_, stats)| stats)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Snapshot of a table as persisted by the last run that changed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub table_name: String,
    pub row_count: u64,
    pub schema: Schema,
    pub run_at: DateTime<Utc>,
    /// Number of persisted snapshots, starting at 1.
    pub run_count: u64,
}

impl Baseline {
    pub fn column_names(&self) -> BTreeSet<&str> {
        self.schema.keys().map(String::as_str).collect()
    }

    /// Whether the statistics differ in row count or schema.
    pub fn differs_from(&self, stats: &TableStatistics) -> bool {
        self.row_count != stats.row_count() || &self.schema != stats.schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> TableStatistics {
        TableStatistics::new(
            "orders",
            Layer::Staging,
            1000,
            vec![
                ColumnStatistics::new("order_id", "int", 1000, 0, 1000),
                ColumnStatistics::new("email", "string", 1000, 120, 880),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn test_null_pct() {
        let col = ColumnStatistics::new("email", "string", 1000, 120, 880);
        assert!((col.null_pct() - 0.12).abs() < f64::EPSILON);
    }

    #[test]
    fn test_null_pct_empty_table() {
        let col = ColumnStatistics::new("email", "string", 0, 0, 0);
        assert_eq!(col.null_pct(), 0.0);
    }

    #[test]
    fn test_duplicate_count_saturates() {
        let col = ColumnStatistics::new("id", "int", 10, 0, 12);
        assert_eq!(col.duplicate_count(), 0);
        let col = ColumnStatistics::new("id", "int", 1000, 0, 980);
        assert_eq!(col.duplicate_count(), 20);
    }

    #[test]
    fn test_schema_derived_from_columns() {
        let stats = orders();
        let keys: Vec<&str> = stats.schema().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["email", "order_id"]);
        assert_eq!(stats.schema()["order_id"], "int");
        assert_eq!(
            stats.column_names().collect::<Vec<_>>(),
            vec!["order_id", "email"]
        );
    }

    #[test]
    fn test_column_lookup() {
        let stats = orders();
        assert_eq!(stats.column("email").map(|c| c.null_count), Some(120));
        assert!(stats.column("missing").is_none());
    }

    #[test]
    fn test_composite_lookup_is_order_sensitive() {
        let key = CompositeKey::new(["order_id", "email"]);
        let stats = orders().with_composite(
            key.clone(),
            ColumnStatistics::new(key.display_name(), "composite", 1000, 0, 990),
        );

        let forward = vec!["order_id".to_string(), "email".to_string()];
        let reverse = vec!["email".to_string(), "order_id".to_string()];
        assert_eq!(stats.composite(&forward).map(|c| c.distinct_count), Some(990));
        assert!(stats.composite(&reverse).is_none());
        // Composite entries stay out of the schema
        assert!(!stats.schema().contains_key("order_id|email"));
        assert!(stats.column("order_id|email").is_none());
    }

    #[test]
    fn test_composite_display_name() {
        let key = CompositeKey::new(["order_id", "customer_id"]);
        assert_eq!(key.display_name(), "order_id|customer_id");
        assert_eq!(key.to_string(), "order_id|customer_id");
    }

    #[test]
    fn test_layer_parsing() {
        assert_eq!("upstream".parse::<Layer>().unwrap(), Layer::Upstream);
        assert_eq!("Downstream".parse::<Layer>().unwrap(), Layer::Downstream);
        assert!("bronze".parse::<Layer>().is_err());
        assert_eq!(Layer::default(), Layer::Staging);
    }

    #[test]
    fn test_column_value_parsing() {
        assert_eq!(ColumnValue::parse_as("42", "int"), ColumnValue::Integer(42));
        assert_eq!(ColumnValue::parse_as("1.5", "float"), ColumnValue::Float(1.5));
        assert_eq!(
            ColumnValue::parse_as("2026-01-01", "date"),
            ColumnValue::Text("2026-01-01".to_string())
        );
        assert_eq!(
            ColumnValue::parse_as("not-a-number", "int"),
            ColumnValue::Text("not-a-number".to_string())
        );
    }

    #[test]
    fn test_baseline_differs_from() {
        let stats = orders();
        let baseline = Baseline {
            table_name: "orders".to_string(),
            row_count: 1000,
            schema: stats.schema().clone(),
            run_at: Utc::now(),
            run_count: 1,
        };
        assert!(!baseline.differs_from(&stats));

        let moved = Baseline {
            row_count: 999,
            ..baseline.clone()
        };
        assert!(moved.differs_from(&stats));

        let mut schema = baseline.schema.clone();
        schema.insert("name".to_string(), "string".to_string());
        let widened = Baseline { schema, ..baseline };
        assert!(widened.differs_from(&stats));
    }
}
