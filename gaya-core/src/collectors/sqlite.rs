//! SQLite statistics collector.
//!
//! Column metadata comes from `pragma_table_info`, then one aggregate pass.
//! SQLite has no row-value `COUNT(DISTINCT ...)`, so each composite key
//! costs one extra `SELECT COUNT(*) FROM (SELECT DISTINCT ...)` query.
//! File databases are opened read-only.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::{
    Collector, ColumnAggregate, ColumnMeta, SqliteSource, aggregate_sql, build_statistics,
    normalize_sqlite_type, quote_ident, resolve_env, resolvable_keys, supports_min_max,
};
use crate::Result;
use crate::error::GayaError;
use crate::models::{Layer, TableStatistics};

const COLUMNS_QUERY: &str = "SELECT name, type FROM pragma_table_info(?) ORDER BY cid";

/// Collector for SQLite tables.
#[derive(Debug, Clone)]
pub struct SqliteCollector {
    pool: SqlitePool,
}

impl SqliteCollector {
    /// Opens the database file named by `source`.
    ///
    /// # Errors
    /// Returns an error if the path cannot be resolved or the database
    /// cannot be opened
    pub async fn new(source: &SqliteSource) -> Result<Self> {
        let path = resolve_env(&source.path)?;
        let options = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
                GayaError::configuration(format!("Invalid SQLite path '{}': {}", path, e))
            })?
        } else {
            SqliteConnectOptions::new().filename(&path).read_only(true)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| GayaError::Connection {
                context: format!("Failed to open SQLite database '{}'", path),
                source: Box::new(e),
            })?;

        tracing::debug!("Opened SQLite database {}", path);
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnMeta>> {
        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                GayaError::query_failed(format!(
                    "Failed to read column metadata for '{}': {}",
                    table, e
                ))
            })?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get("name").map_err(|e| {
                    GayaError::query_failed(format!("Invalid column metadata: {}", e))
                })?;
                let declared: String = row.try_get("type").map_err(|e| {
                    GayaError::query_failed(format!("Invalid column metadata: {}", e))
                })?;
                Ok(ColumnMeta {
                    name,
                    data_type: normalize_sqlite_type(&declared),
                })
            })
            .collect()
    }

    async fn count_distinct(&self, table: &str, key: &[String]) -> Result<i64> {
        let idents: Vec<String> = key.iter().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "SELECT COUNT(*) FROM (SELECT DISTINCT {} FROM {})",
            idents.join(", "),
            quote_ident(table)
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                GayaError::query_failed(format!(
                    "Failed to count composite key [{}] on '{}': {}",
                    key.join(", "),
                    table,
                    e
                ))
            })
    }
}

#[async_trait]
impl Collector for SqliteCollector {
    async fn test_connection(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(GayaError::connection)?;
        Ok(())
    }

    async fn collect(
        &self,
        table: &str,
        layer: Layer,
        composite_keys: &[Vec<String>],
    ) -> Result<TableStatistics> {
        let columns = self.fetch_columns(table).await?;
        if columns.is_empty() {
            return Err(GayaError::query_failed(format!(
                "Table '{}' not found or has no columns. Check the table name in gaya.yml.",
                table
            )));
        }

        let sql = aggregate_sql(&quote_ident(table), &columns, &[]);
        tracing::trace!("Aggregate query for '{}': {}", table, sql);
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                GayaError::query_failed(format!("Failed to collect statistics for '{}': {}", table, e))
            })?;

        let decode = |e: sqlx::Error| {
            GayaError::query_failed(format!("Unexpected aggregate result for '{}': {}", table, e))
        };
        let row_count: i64 = row.try_get("row_count").map_err(decode)?;

        let mut aggregates = Vec::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            let mut agg = ColumnAggregate {
                null_count: row.try_get(format!("n{i}").as_str()).map_err(decode)?,
                distinct_count: row.try_get(format!("d{i}").as_str()).map_err(decode)?,
                ..Default::default()
            };
            if supports_min_max(&col.data_type) {
                agg.min = row.try_get(format!("lo{i}").as_str()).map_err(decode)?;
                agg.max = row.try_get(format!("hi{i}").as_str()).map_err(decode)?;
            }
            aggregates.push(agg);
        }

        let mut composites = Vec::new();
        for key in resolvable_keys(&columns, composite_keys) {
            let distinct = self.count_distinct(table, key).await?;
            composites.push((key, distinct));
        }

        tracing::debug!(
            "Collected '{}': {} rows, {} columns",
            table,
            row_count,
            columns.len()
        );
        Ok(build_statistics(
            table, layer, row_count, columns, aggregates, composites,
        ))
    }

    fn datasource_type(&self) -> &'static str {
        "sqlite"
    }
}
