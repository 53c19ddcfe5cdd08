//! Statistics collectors.
//!
//! A collector turns a table name into a [`TableStatistics`] using a small,
//! fixed number of read-only aggregate queries: one metadata query for the
//! column list, one aggregate pass for counts and ranges, and (SQLite only)
//! one query per composite key. No rows are ever fetched.
//!
//! Drivers are feature-gated the same way as the data sources they reach:
//! `postgresql` and `sqlite`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::GayaError;
use crate::models::{ColumnStatistics, ColumnValue, CompositeKey, Layer, TableStatistics};

pub mod type_mapping;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use type_mapping::{normalize_postgres_type, normalize_sqlite_type, supports_min_max};

/// Default per-statement timeout applied to collector sessions.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of table statistics.
///
/// # Object Safety
/// This trait is object-safe so the CLI can hold one
/// `Box<dyn Collector>` per configured datasource.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Verifies the datasource is reachable.
    ///
    /// # Errors
    /// Returns a connection error if the datasource cannot be reached
    async fn test_connection(&self) -> Result<()>;

    /// Collects statistics for `table`.
    ///
    /// Each entry in `composite_keys` lists the columns of one composite
    /// uniqueness key. Keys referencing unknown columns are skipped, which
    /// the uniqueness check then reports as missing.
    ///
    /// # Errors
    /// Returns a query error if the table does not exist or a statistics
    /// query fails
    async fn collect(
        &self,
        table: &str,
        layer: Layer,
        composite_keys: &[Vec<String>],
    ) -> Result<TableStatistics>;

    /// Short name of the datasource kind, e.g. `postgres`
    fn datasource_type(&self) -> &'static str;
}

/// A configured datasource, tagged by `type` in `gaya.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatasourceConfig {
    #[serde(alias = "postgresql")]
    Postgres(PostgresSource),
    Sqlite(SqliteSource),
}

impl DatasourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            DatasourceConfig::Postgres(_) => "postgres",
            DatasourceConfig::Sqlite(_) => "sqlite",
        }
    }
}

/// PostgreSQL connection settings.
///
/// Either `url` or `database` + `user` must be given. Any string value may be
/// an `env:VAR` reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresSource {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Per-statement timeout in seconds
    pub statement_timeout_secs: Option<u64>,
}

impl PostgresSource {
    /// Builds the connection URL, resolving `env:` references.
    ///
    /// # Errors
    /// Returns a configuration error if required fields are missing or an
    /// environment variable is unset
    pub fn connection_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return resolve_env(url);
        }

        let database = self.database.as_deref().ok_or_else(|| {
            GayaError::configuration("postgres datasource requires 'url' or 'database'")
        })?;
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| GayaError::configuration("postgres datasource requires 'user'"))?;
        let host = match &self.host {
            Some(host) => resolve_env(host)?,
            None => "localhost".to_string(),
        };

        let mut url = url::Url::parse(&format!("postgres://{}", host)).map_err(|e| {
            GayaError::configuration(format!("Invalid postgres host '{}': {}", host, e))
        })?;
        let invalid = |field: &str| GayaError::configuration(format!("Invalid postgres {}", field));
        url.set_port(Some(self.port.unwrap_or(5432)))
            .map_err(|()| invalid("port"))?;
        url.set_username(&resolve_env(user)?)
            .map_err(|()| invalid("user"))?;
        if let Some(password) = &self.password {
            url.set_password(Some(&resolve_env(password)?))
                .map_err(|()| invalid("password"))?;
        }
        url.set_path(&resolve_env(database)?);

        Ok(url.to_string())
    }

    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout_secs
            .map_or(DEFAULT_STATEMENT_TIMEOUT, Duration::from_secs)
    }
}

/// SQLite database file. `:memory:` opens an empty in-memory database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteSource {
    pub path: String,
}

/// Resolves an `env:VAR` reference; other values are returned unchanged.
///
/// # Errors
/// Returns a configuration error if the referenced variable is not set
pub fn resolve_env(value: &str) -> Result<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var).map_err(|_| {
            GayaError::configuration(format!(
                "Environment variable '{}' is not set. Set it before running gaya: export {}=...",
                var, var
            ))
        }),
        None => Ok(value.to_string()),
    }
}

/// Creates a collector for the given datasource.
///
/// # Errors
/// Returns an error if the driver is not compiled in, the configuration is
/// incomplete, or the connection settings are invalid
pub async fn create_collector(config: &DatasourceConfig) -> Result<Box<dyn Collector>> {
    match config {
        #[cfg(feature = "postgresql")]
        DatasourceConfig::Postgres(source) => {
            let collector = postgres::PostgresCollector::new(source).await?;
            Ok(Box::new(collector))
        }
        #[cfg(not(feature = "postgresql"))]
        DatasourceConfig::Postgres(_) => Err(GayaError::unsupported_feature(
            "PostgreSQL collector",
            "this build (rebuild with --features postgresql)",
        )),
        #[cfg(feature = "sqlite")]
        DatasourceConfig::Sqlite(source) => {
            let collector = sqlite::SqliteCollector::new(source).await?;
            Ok(Box::new(collector))
        }
        #[cfg(not(feature = "sqlite"))]
        DatasourceConfig::Sqlite(_) => Err(GayaError::unsupported_feature(
            "SQLite collector",
            "this build (rebuild with --features sqlite)",
        )),
    }
}

/// Column name and normalized type, from the metadata query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnMeta {
    pub(crate) name: String,
    pub(crate) data_type: String,
}

/// Raw aggregates for one column.
#[derive(Debug, Clone, Default)]
pub(crate) struct ColumnAggregate {
    pub(crate) null_count: i64,
    pub(crate) distinct_count: i64,
    pub(crate) min: Option<String>,
    pub(crate) max: Option<String>,
}

/// Double-quotes an identifier, escaping embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds the single-pass aggregate query.
///
/// Aliases are positional (`n0`, `d0`, `lo0`, `hi0`, `k0`) so column names
/// never need escaping twice. `composite_exprs` are complete distinct-count
/// expressions, one per composite key, aliased `k{i}`.
pub(crate) fn aggregate_sql(
    qualified_table: &str,
    columns: &[ColumnMeta],
    composite_exprs: &[String],
) -> String {
    let mut exprs = vec!["COUNT(*) AS row_count".to_string()];
    for (i, col) in columns.iter().enumerate() {
        let ident = quote_ident(&col.name);
        exprs.push(format!("COUNT(*) - COUNT({ident}) AS n{i}"));
        exprs.push(format!("COUNT(DISTINCT {ident}) AS d{i}"));
        if supports_min_max(&col.data_type) {
            exprs.push(format!("CAST(MIN({ident}) AS TEXT) AS lo{i}"));
            exprs.push(format!("CAST(MAX({ident}) AS TEXT) AS hi{i}"));
        }
    }
    for (i, expr) in composite_exprs.iter().enumerate() {
        exprs.push(format!("{expr} AS k{i}"));
    }
    format!("SELECT {} FROM {}", exprs.join(", "), qualified_table)
}

/// Keeps only composite keys whose columns all exist.
pub(crate) fn resolvable_keys<'a>(
    columns: &[ColumnMeta],
    composite_keys: &'a [Vec<String>],
) -> Vec<&'a [String]> {
    composite_keys
        .iter()
        .filter(|key| key.len() > 1)
        .filter(|key| {
            let resolvable = key.iter().all(|k| columns.iter().any(|c| &c.name == k));
            if !resolvable {
                tracing::debug!("Skipping composite key [{}]: unknown column", key.join(", "));
            }
            resolvable
        })
        .map(Vec::as_slice)
        .collect()
}

/// Converts a driver count to `u64`; counts are never negative.
pub(crate) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Assembles statistics from metadata and raw aggregates.
pub(crate) fn build_statistics(
    table: &str,
    layer: Layer,
    row_count: i64,
    columns: Vec<ColumnMeta>,
    aggregates: Vec<ColumnAggregate>,
    composites: Vec<(&[String], i64)>,
) -> TableStatistics {
    let row_count = count(row_count);
    let column_stats = columns
        .into_iter()
        .zip(aggregates)
        .map(|(meta, agg)| {
            let min = agg
                .min
                .as_deref()
                .map(|raw| ColumnValue::parse_as(raw, &meta.data_type));
            let max = agg
                .max
                .as_deref()
                .map(|raw| ColumnValue::parse_as(raw, &meta.data_type));
            ColumnStatistics::new(
                meta.name,
                meta.data_type,
                row_count,
                count(agg.null_count),
                count(agg.distinct_count),
            )
            .with_range(min, max)
        })
        .collect();

    let mut stats = TableStatistics::new(table, layer, row_count, column_stats, chrono::Utc::now());
    for (columns, distinct) in composites {
        let key = CompositeKey::new(columns.iter().cloned());
        let composite = ColumnStatistics::new(
            key.display_name(),
            "composite",
            row_count,
            0,
            count(distinct),
        );
        stats = stats.with_composite(key, composite);
    }
    stats
}
