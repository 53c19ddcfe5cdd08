//! Baseline persistence.
//!
//! A baseline is the last persisted snapshot of a table's row count and
//! schema. Volume and drift checks compare against it, and the runner offers
//! every run's statistics back to the store exactly once.
//!
//! # Contract
//! - `load` never fails: a missing, unreadable or incompatible record is
//!   reported as `None`, the same as a first run.
//! - `save` writes only when no baseline exists or when the row count or
//!   schema changed. `run_count` increments by one per actual write.
//! - Storage keys are sanitized table names, so `public.orders` is stored as
//!   a flat key rather than a nested path.

mod file;
mod memory;


pub use file::{DEFAULT_BASELINE_DIR, JsonFileStore};
pub use memory::MemoryBaselineStore;

use crate::Result;
use crate::models::{Baseline, TableStatistics};

/// Keyed store of per-table baselines.
pub trait BaselineStore: Send + Sync {
    /// Returns the stored baseline, or `None` when absent or unreadable.
    fn load(&self, table_name: &str) -> Option<Baseline>;

    /// Persists the statistics if they differ from the stored baseline.
    ///
    /// Returns whether a write happened.
    fn save(&self, stats: &TableStatistics) -> Result<bool>;

    fn exists(&self, table_name: &str) -> bool;

    /// Removes a stored baseline. Returns whether one existed.
    fn delete(&self, table_name: &str) -> Result<bool>;

    /// Names of all tables with a stored baseline, sorted.
    fn list_tables(&self) -> Result<Vec<String>>;
}

impl<S: BaselineStore + ?Sized> BaselineStore for Box<S> {
    fn load(&self, table_name: &str) -> Option<Baseline> {
        (**self).load(table_name)
    }

    fn save(&self, stats: &TableStatistics) -> Result<bool> {
        (**self).save(stats)
    }

    fn exists(&self, table_name: &str) -> bool {
        (**self).exists(table_name)
    }

    fn delete(&self, table_name: &str) -> Result<bool> {
        (**self).delete(table_name)
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        (**self).list_tables()
    }
}

/// Replaces path separators and dots so a table name is a flat storage key.
///
/// ```rust
/// use gaya_core::baseline::sanitize_table_name;
///
/// assert_eq!(sanitize_table_name("public.orders"), "public_orders");
/// assert_eq!(sanitize_table_name("raw/events"), "raw_events");
/// ```
pub fn sanitize_table_name(table_name: &str) -> String {
    table_name
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

/// Computes the baseline to write for `stats`, if any.
///
/// Returns `None` when `previous` already records the same row count and
/// schema.
pub fn next_baseline(stats: &TableStatistics, previous: Option<&Baseline>) -> Option<Baseline> {
    match previous {
        Some(prev) if !prev.differs_from(stats) => None,
        _ => Some(Baseline {
            table_name: stats.table_name().to_string(),
            row_count: stats.row_count(),
            schema: stats.schema().clone(),
            run_at: stats.collected_at(),
            run_count: previous.map_or(1, |prev| prev.run_count.saturating_add(1)),
        }),
    }
}

/// Store wrapper that reads through and never writes.
///
/// Used for dry runs: checks still see the real baseline, but `save` and
/// `delete` leave the underlying store untouched and report `false`.
#[derive(Debug, Clone)]
pub struct ReadOnlyStore<S> {
    inner: S,
}

impl<S: BaselineStore> ReadOnlyStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BaselineStore> BaselineStore for ReadOnlyStore<S> {
    fn load(&self, table_name: &str) -> Option<Baseline> {
        self.inner.load(table_name)
    }

    fn save(&self, stats: &TableStatistics) -> Result<bool> {
        tracing::debug!(
            "Dry run: not persisting baseline for '{}'",
            stats.table_name()
        );
        Ok(false)
    }

    fn exists(&self, table_name: &str) -> bool {
        self.inner.exists(table_name)
    }

    fn delete(&self, table_name: &str) -> Result<bool> {
        tracing::debug!("Dry run: not deleting baseline for '{}'", table_name);
        Ok(false)
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        self.inner.list_tables()
    }
}
