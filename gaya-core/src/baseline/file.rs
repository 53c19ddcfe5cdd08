//! JSON-file baseline store.
//!
//! One pretty-printed JSON record per table under `.gaya/baselines/`, named
//! after the sanitized table name. Records carry a format version; a record
//! with any other version is treated as absent.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BaselineStore, next_baseline, sanitize_table_name};
use crate::error::GayaError;
use crate::models::{Baseline, Schema, TableStatistics};
use crate::Result;

/// Default baseline directory relative to the project root.
pub const DEFAULT_BASELINE_DIR: &str = ".gaya/baselines";

/// Version tag written into every record.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BaselineRecord {
    table_name: String,
    row_count: u64,
    schema: Schema,
    run_at: DateTime<Utc>,
    run_count: u64,
    format_version: u32,
    #[serde(default)]
    gaya_version: String,
}

impl From<&Baseline> for BaselineRecord {
    fn from(baseline: &Baseline) -> Self {
        Self {
            table_name: baseline.table_name.clone(),
            row_count: baseline.row_count,
            schema: baseline.schema.clone(),
            run_at: baseline.run_at,
            run_count: baseline.run_count,
            format_version: FORMAT_VERSION,
            gaya_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl From<BaselineRecord> for Baseline {
    fn from(record: BaselineRecord) -> Self {
        Self {
            table_name: record.table_name,
            row_count: record.row_count,
            schema: record.schema,
            run_at: record.run_at,
            run_count: record.run_count,
        }
    }
}

/// Baseline store backed by one JSON file per table.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at the default location under `project_root`.
    pub fn in_project(project_root: impl AsRef<Path>) -> Self {
        Self::new(project_root.as_ref().join(DEFAULT_BASELINE_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, table_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", sanitize_table_name(table_name)))
    }

    /// Reads and validates a record, logging why an unusable one is skipped.
    fn read_record(path: &Path) -> Option<BaselineRecord> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable baseline {}: {}", path.display(), e);
                return None;
            }
        };

        let record: BaselineRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Ignoring corrupt baseline {}: {}", path.display(), e);
                return None;
            }
        };

        if record.format_version != FORMAT_VERSION {
            tracing::warn!(
                "Ignoring baseline {} with format version {} (expected {})",
                path.display(),
                record.format_version,
                FORMAT_VERSION
            );
            return None;
        }

        Some(record)
    }

    fn write_record(&self, path: &Path, record: &BaselineRecord) -> Result<()> {
        let data = serde_json::to_vec_pretty(record).map_err(|e| GayaError::Serialization {
            context: format!("Failed to serialize baseline for '{}'", record.table_name),
            source: e,
        })?;

        write_atomic(path, &data).map_err(|e| {
            GayaError::baseline(format!("Failed to write {}", path.display()), e)
        })
    }
}

impl BaselineStore for JsonFileStore {
    fn load(&self, table_name: &str) -> Option<Baseline> {
        let path = self.path_for(table_name);
        let record = Self::read_record(&path)?;

        // Distinct names can sanitize to the same key
        if record.table_name != table_name {
            tracing::warn!(
                "Baseline {} belongs to '{}', not '{}'; ignoring",
                path.display(),
                record.table_name,
                table_name
            );
            return None;
        }

        Some(record.into())
    }

    fn save(&self, stats: &TableStatistics) -> Result<bool> {
        let previous = self.load(stats.table_name());
        let Some(baseline) = next_baseline(stats, previous.as_ref()) else {
            tracing::debug!(
                "Baseline for '{}' unchanged, skipping write",
                stats.table_name()
            );
            return Ok(false);
        };

        let path = self.path_for(stats.table_name());
        self.write_record(&path, &BaselineRecord::from(&baseline))?;
        tracing::debug!(
            "Wrote baseline for '{}' (run {}) to {}",
            baseline.table_name,
            baseline.run_count,
            path.display()
        );
        Ok(true)
    }

    fn exists(&self, table_name: &str) -> bool {
        self.path_for(table_name).is_file()
    }

    fn delete(&self, table_name: &str) -> Result<bool> {
        let path = self.path_for(table_name);
        // Unreadable records are removed; another table's record is kept
        if let Some(record) = Self::read_record(&path)
            && record.table_name != table_name
        {
            tracing::warn!(
                "Baseline {} belongs to '{}', not '{}'; leaving it in place",
                path.display(),
                record.table_name,
                table_name
            );
            return Ok(false);
        }

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GayaError::baseline(
                format!("Failed to delete {}", path.display()),
                e,
            )),
        }
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GayaError::baseline(
                    format!("Failed to list {}", self.dir.display()),
                    e,
                ));
            }
        };

        let mut tables = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    GayaError::baseline(format!("Failed to list {}", self.dir.display()), e)
                })?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let name = match Self::read_record(&path) {
                Some(record) => record.table_name,
                None => match path.file_stem().and_then(|stem| stem.to_str()) {
                    Some(stem) => stem.to_string(),
                    None => continue,
                },
            };
            tables.push(name);
        }

        tables.sort();
        tables.dedup();
        Ok(tables)
    }
}

/// Writes `data` to a sibling temp file, then renames it over `path`.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "invalid path for atomic write")
    })?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}
