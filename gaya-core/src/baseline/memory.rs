//! In-process baseline store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BaselineStore, next_baseline};
use crate::Result;
use crate::models::{Baseline, TableStatistics};

/// Baseline store held in memory, for tests and embedding.
///
/// Records are keyed by the exact table name, so names that only collide
/// once sanitized for the file store stay independent here.
#[derive(Debug, Default)]
pub struct MemoryBaselineStore {
    records: Mutex<HashMap<String, Baseline>>,
}

impl MemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an existing baseline.
    pub fn with_baseline(self, baseline: Baseline) -> Self {
        self.lock().insert(baseline.table_name.clone(), baseline);
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Baseline>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn load(&self, table_name: &str) -> Option<Baseline> {
        self.lock().get(table_name).cloned()
    }

    fn save(&self, stats: &TableStatistics) -> Result<bool> {
        let mut records = self.lock();
        match next_baseline(stats, records.get(stats.table_name())) {
            Some(baseline) => {
                records.insert(baseline.table_name.clone(), baseline);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn exists(&self, table_name: &str) -> bool {
        self.lock().contains_key(table_name)
    }

    fn delete(&self, table_name: &str) -> Result<bool> {
        Ok(self.lock().remove(table_name).is_some())
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables: Vec<String> = self
            .lock()
            .values()
            .map(|b| b.table_name.clone())
            .collect();
        tables.sort();
        Ok(tables)
    }
}
