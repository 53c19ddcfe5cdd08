//! Project configuration from `gaya.yml`.
//!
//! The file declares datasources, default thresholds (in percent) and the
//! tables to check. Tables keep their file order. Nothing else in gaya
//! reads the config file directly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::Result;
use crate::checks::{
    NullRateConfig, RequiredConfig, RowCountConfig, RuleConfig, SchemaConfig, UniqueConfig,
    VolumeChangeConfig,
};
use crate::collectors::DatasourceConfig;
use crate::error::GayaError;
use crate::models::Layer;
use crate::runner::TableConfig;

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "gaya.yml";

/// Datasource name used by tables without a `source` key.
pub const DEFAULT_SOURCE: &str = "default";

/// Starter configuration written by `gaya init`.
pub const STARTER_CONFIG: &str = r#"# gaya.yml: data quality configuration
# Run `gaya run` to execute all checks.

datasources:
  main_db:
    type: postgres
    host: localhost
    port: 5432
    database: your_database
    user: your_user
    password: env:DB_PASSWORD     # export DB_PASSWORD=...

tables:
  orders:
    source: main_db
    layer: staging
    primary_key: order_id
    not_null:
      - order_id
      - customer_id
      - order_date

  customers:
    source: main_db
    layer: staging
    primary_key: customer_id

# Global defaults (override per table if needed)
defaults:
  volume_warn_pct: 20
  volume_fail_pct: 40
  null_warn_pct:   10
  null_fail_pct:   25
"#;

/// Parsed project configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub datasources: BTreeMap<String, DatasourceConfig>,
    /// Tables in file order
    pub tables: Vec<TableConfig>,
}

impl ProjectConfig {
    pub fn datasource(&self, name: &str) -> Option<&DatasourceConfig> {
        self.datasources.get(name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    datasources: BTreeMap<String, DatasourceConfig>,
    #[serde(default)]
    defaults: Defaults,
    #[serde(default)]
    tables: serde_yaml::Mapping,
}

/// Project-wide thresholds, in percent.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Defaults {
    null_warn_pct: f64,
    null_fail_pct: f64,
    volume_warn_pct: f64,
    volume_fail_pct: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            null_warn_pct: 10.0,
            null_fail_pct: 25.0,
            volume_warn_pct: 20.0,
            volume_fail_pct: 40.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    source: Option<String>,
    layer: Option<String>,
    primary_key: Option<KeySpec>,
    #[serde(default)]
    unique: Vec<KeySpec>,
    #[serde(default)]
    not_null: Vec<String>,
    null_columns: Option<Vec<String>>,
    min_rows: Option<u64>,
    max_rows: Option<u64>,
    schema: Option<serde_yaml::Mapping>,
    null_warn_pct: Option<f64>,
    null_fail_pct: Option<f64>,
    volume_warn_pct: Option<f64>,
    volume_fail_pct: Option<f64>,
    #[serde(default)]
    checks: Toggles,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeySpec {
    Single(String),
    Composite(Vec<String>),
}

impl KeySpec {
    fn into_columns(self) -> Vec<String> {
        match self {
            KeySpec::Single(column) => vec![column],
            KeySpec::Composite(columns) => columns,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Toggles {
    null: bool,
    volume: bool,
    drift: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            null: true,
            volume: true,
            drift: true,
        }
    }
}

/// Loads and validates a config file.
///
/// # Errors
/// Returns a configuration error if the file is missing or invalid, and a
/// YAML error if it does not parse
pub fn load(path: impl AsRef<Path>) -> Result<ProjectConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(GayaError::configuration(format!(
            "'{}' not found. Run `gaya init` to create one.",
            path.display()
        )));
    }
    let content = fs::read_to_string(path).map_err(|e| GayaError::Io {
        context: format!("Failed to read {}", path.display()),
        source: e,
    })?;
    parse_named(&content, &path.display().to_string())
}

/// Parses and validates config text.
///
/// # Errors
/// See [`load`]
pub fn parse(content: &str) -> Result<ProjectConfig> {
    parse_named(content, DEFAULT_CONFIG_FILE)
}

fn parse_named(content: &str, origin: &str) -> Result<ProjectConfig> {
    let yaml_error = |source| GayaError::Yaml {
        path: origin.to_string(),
        source,
    };

    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(yaml_error)?;
    let raw: RawConfig = if value.is_null() {
        RawConfig {
            datasources: BTreeMap::new(),
            defaults: Defaults::default(),
            tables: serde_yaml::Mapping::new(),
        }
    } else {
        serde_yaml::from_value(value).map_err(yaml_error)?
    };

    if raw.tables.is_empty() {
        return Err(GayaError::configuration(format!(
            "No tables defined in {}. Add at least one table under the 'tables:' key.",
            origin
        )));
    }

    let mut tables = Vec::with_capacity(raw.tables.len());
    for (key, value) in raw.tables {
        let name = match key {
            serde_yaml::Value::String(name) => name,
            other => {
                return Err(GayaError::configuration(format!(
                    "Table names must be strings, got {:?}",
                    other
                )));
            }
        };
        let table: RawTable = if value.is_null() {
            RawTable::default()
        } else {
            serde_yaml::from_value(value).map_err(yaml_error)?
        };
        tables.push(build_table(name, table, &raw.defaults)?);
    }

    for table in &tables {
        if !raw.datasources.contains_key(&table.source) {
            return Err(GayaError::configuration(format!(
                "Table '{}' references undefined datasource '{}'",
                table.table, table.source
            )));
        }
    }

    tracing::debug!(
        "Loaded {} tables and {} datasources from {}",
        tables.len(),
        raw.datasources.len(),
        origin
    );
    Ok(ProjectConfig {
        datasources: raw.datasources,
        tables,
    })
}

fn percent(table: &str, key: &str, value: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&value) {
        return Err(GayaError::configuration(format!(
            "Table '{}': {} must be between 0 and 100, got {}",
            table, key, value
        )));
    }
    Ok(value / 100.0)
}

fn build_table(name: String, raw: RawTable, defaults: &Defaults) -> Result<TableConfig> {
    let layer: Layer = match raw.layer.as_deref() {
        Some(layer) => layer.parse().map_err(|_| {
            GayaError::configuration(format!(
                "Table '{}': unknown layer '{}'. Expected one of: upstream, staging, downstream",
                name, layer
            ))
        })?,
        None => Layer::default(),
    };
    let source = raw.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let threshold_error =
        |e: crate::checks::ThresholdError| GayaError::configuration(format!("Table '{}': {}", name, e));

    let mut null = NullRateConfig::new(
        percent(&name, "null_warn_pct", raw.null_warn_pct.unwrap_or(defaults.null_warn_pct))?,
        percent(&name, "null_fail_pct", raw.null_fail_pct.unwrap_or(defaults.null_fail_pct))?,
    );
    if let Some(columns) = raw.null_columns {
        null = null.with_columns(columns);
    }
    null.validate().map_err(threshold_error)?;

    let volume = VolumeChangeConfig::new(
        percent(
            &name,
            "volume_warn_pct",
            raw.volume_warn_pct.unwrap_or(defaults.volume_warn_pct),
        )?,
        percent(
            &name,
            "volume_fail_pct",
            raw.volume_fail_pct.unwrap_or(defaults.volume_fail_pct),
        )?,
    );
    volume.validate().map_err(threshold_error)?;

    let mut config = TableConfig::new(name.as_str(), layer, source)
        .with_rule(RuleConfig::NullRate(null))
        .with_rule(RuleConfig::VolumeChange(volume))
        .with_null_check(raw.checks.null)
        .with_volume_check(raw.checks.volume)
        .with_drift_check(raw.checks.drift);

    if !raw.not_null.is_empty() {
        config = config.with_rule(RuleConfig::RequiredColumns(RequiredConfig::new(
            raw.not_null,
        )));
    }

    let keys: Vec<Vec<String>> = raw
        .primary_key
        .into_iter()
        .chain(raw.unique)
        .map(KeySpec::into_columns)
        .collect();
    if keys.iter().any(Vec::is_empty) {
        return Err(GayaError::configuration(format!(
            "Table '{}': uniqueness keys must name at least one column",
            name
        )));
    }
    if !keys.is_empty() {
        config = config.with_rule(RuleConfig::Unique(UniqueConfig { keys }));
    }

    if raw.min_rows.is_some() || raw.max_rows.is_some() {
        if let (Some(min), Some(max)) = (raw.min_rows, raw.max_rows)
            && min > max
        {
            return Err(GayaError::configuration(format!(
                "Table '{}': min_rows ({}) exceeds max_rows ({})",
                name, min, max
            )));
        }
        config = config.with_rule(RuleConfig::RowCount(RowCountConfig {
            min_rows: raw.min_rows,
            max_rows: raw.max_rows,
        }));
    }

    if let Some(schema) = raw.schema {
        let mut expected = Vec::with_capacity(schema.len());
        for (column, ty) in schema {
            match (column, ty) {
                (serde_yaml::Value::String(column), serde_yaml::Value::String(ty)) => {
                    expected.push((column, ty));
                }
                (column, _) => {
                    return Err(GayaError::configuration(format!(
                        "Table '{}': schema entry {:?} must map a column name to a type name",
                        name, column
                    )));
                }
            }
        }
        config = config.with_rule(RuleConfig::Schema(SchemaConfig { expected }));
    }

    Ok(config)
}

/// Writes the starter config to `path` unless a file already exists.
///
/// Returns whether the file was written.
///
/// # Errors
/// Returns an I/O error if the file cannot be written
pub fn init(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, STARTER_CONFIG).map_err(|e| GayaError::Io {
        context: format!("Failed to write {}", path.display()),
        source: e,
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckKind;

    const SAMPLE: &str = r#"
datasources:
  main_db:
    type: postgres
    url: env:DATABASE_URL
  local:
    type: sqlite
    path: ./warehouse.db

defaults:
  null_warn_pct: 5
  null_fail_pct: 20

tables:
  zeta_orders:
    source: main_db
    layer: downstream
    primary_key: [order_id, line_no]
    unique:
      - sku
      - [customer_id, order_date]
    not_null: [order_id]
    null_columns: [email]
    min_rows: 100
    max_rows: 100000
    schema:
      order_id: int
      email: string
    volume_warn_pct: 30
    volume_fail_pct: 60
    checks:
      drift: false
  alpha_events:
    source: local
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.datasources.len(), 2);

        // file order, not alphabetical
        let names: Vec<&str> = config.tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec!["zeta_orders", "alpha_events"]);

        let orders = &config.tables[0];
        assert_eq!(orders.layer, Layer::Downstream);
        assert_eq!(orders.source, "main_db");
        assert!(!orders.run_drift_check);
        assert!(orders.run_null_check);

        match orders.rule(CheckKind::NullRate) {
            Some(RuleConfig::NullRate(null)) => {
                assert_eq!(null.warn_pct, 0.05);
                assert_eq!(null.fail_pct, 0.20);
                assert_eq!(null.columns, Some(vec!["email".to_string()]));
            }
            other => panic!("unexpected null rule: {:?}", other),
        }
        match orders.rule(CheckKind::VolumeChange) {
            Some(RuleConfig::VolumeChange(volume)) => {
                assert_eq!(volume.warn_pct, 0.30);
                assert_eq!(volume.fail_pct, 0.60);
            }
            other => panic!("unexpected volume rule: {:?}", other),
        }
        match orders.rule(CheckKind::Unique) {
            Some(RuleConfig::Unique(unique)) => assert_eq!(
                unique.keys,
                vec![
                    vec!["order_id".to_string(), "line_no".to_string()],
                    vec!["sku".to_string()],
                    vec!["customer_id".to_string(), "order_date".to_string()],
                ]
            ),
            other => panic!("unexpected unique rule: {:?}", other),
        }
        assert_eq!(orders.composite_keys().len(), 2);
        match orders.rule(CheckKind::Schema) {
            Some(RuleConfig::Schema(schema)) => assert_eq!(
                schema.expected,
                vec![
                    ("order_id".to_string(), "int".to_string()),
                    ("email".to_string(), "string".to_string()),
                ]
            ),
            other => panic!("unexpected schema rule: {:?}", other),
        }
        assert!(orders.rule(CheckKind::RowCount).is_some());
        assert!(orders.rule(CheckKind::RequiredColumns).is_some());
    }

    #[test]
    fn test_table_defaults() {
        let config = parse(SAMPLE).unwrap();
        let events = &config.tables[1];
        assert_eq!(events.layer, Layer::Staging);
        assert!(events.run_null_check && events.run_volume_check && events.run_drift_check);
        assert!(events.rule(CheckKind::Unique).is_none());
        assert!(events.rule(CheckKind::RowCount).is_none());
        match events.rule(CheckKind::VolumeChange) {
            Some(RuleConfig::VolumeChange(volume)) => assert_eq!(volume.fail_pct, 0.40),
            other => panic!("unexpected volume rule: {:?}", other),
        }
    }

    #[test]
    fn test_starter_config_parses() {
        let config = parse(STARTER_CONFIG).unwrap();
        assert_eq!(config.tables.len(), 2);
        assert_eq!(config.tables[0].table, "orders");
    }

    #[test]
    fn test_no_tables_is_error() {
        for content in ["", "datasources: {}\n", "tables: {}\n"] {
            let err = parse(content).unwrap_err();
            assert!(err.to_string().contains("No tables defined"), "{}", content);
        }
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            (
                "datasources: {d: {type: sqlite, path: x}}\ntables: {t: {source: d, layer: bronze}}",
                "unknown layer 'bronze'",
            ),
            (
                "datasources: {d: {type: sqlite, path: x}}\ntables: {t: {source: d, null_warn_pct: 150}}",
                "between 0 and 100",
            ),
            (
                "datasources: {d: {type: sqlite, path: x}}\ntables: {t: {source: d, volume_warn_pct: 50, volume_fail_pct: 10}}",
                "must not exceed",
            ),
            (
                "datasources: {d: {type: sqlite, path: x}}\ntables: {t: {source: nope}}",
                "undefined datasource 'nope'",
            ),
            (
                "datasources: {d: {type: sqlite, path: x}}\ntables: {t: {source: d, min_rows: 10, max_rows: 5}}",
                "exceeds max_rows",
            ),
        ];
        for (content, expected) in cases {
            let err = parse(content).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "expected '{}' in '{}'",
                expected,
                err
            );
        }
    }

    #[test]
    fn test_unknown_key_is_yaml_error() {
        let content = "datasources: {d: {type: sqlite, path: x}}\ntables: {t: {source: d, primary_kye: id}}";
        assert!(matches!(parse(content), Err(GayaError::Yaml { .. })));
    }

    #[test]
    fn test_empty_table_entry_uses_defaults() {
        let content = "datasources: {default: {type: sqlite, path: x}}\ntables:\n  events:\n";
        let config = parse(content).unwrap();
        assert_eq!(config.tables[0].source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("gaya.yml")).unwrap_err();
        assert!(err.to_string().contains("gaya init"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaya.yml");
        assert!(init(&path).unwrap());
        assert!(!init(&path).unwrap());
        assert!(load(&path).is_ok());
    }
}
