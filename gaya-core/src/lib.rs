//! Core check engine for Gaya.
//!
//! This crate provides the statistics model, the seven rule functions, the
//! baseline store and the per-table runner shared by the `gaya` binary, plus
//! the collectors and config loader that feed them.
//!
//! # Guarantees
//! - Only aggregate, read-only queries reach the data source
//! - Data-quality findings are values ([`CheckResult`]), never errors
//! - Baselines are local, human-readable JSON files
//! - Connection strings are redacted before they reach logs or errors
//!
//! # Example
//! ```rust
//! use chrono::Utc;
//! use gaya_core::baseline::MemoryBaselineStore;
//! use gaya_core::{ColumnStatistics, Layer, Runner, TableConfig, TableStatistics};
//!
//! let stats = TableStatistics::new(
//!     "orders",
//!     Layer::Staging,
//!     1000,
//!     vec![ColumnStatistics::new("order_id", "int", 1000, 0, 1000)],
//!     Utc::now(),
//! );
//! let config = TableConfig::new("orders", Layer::Staging, "main_db");
//!
//! let runner = Runner::new(MemoryBaselineStore::new());
//! let result = runner.run(&stats, &config)?;
//! assert!(!result.has_failures());
//! assert!(result.baseline_updated);
//! # Ok::<(), gaya_core::GayaError>(())
//! ```

pub mod baseline;
pub mod checks;
pub mod collectors;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod runner;

// Re-export commonly used types
pub use baseline::{BaselineStore, JsonFileStore, MemoryBaselineStore, ReadOnlyStore};
pub use checks::{CheckKind, CheckResult, CheckValue, RuleConfig, Status};
pub use collectors::{Collector, DatasourceConfig, create_collector};
pub use config::ProjectConfig;
pub use error::{GayaError, Result};
pub use models::{
    Baseline, ColumnStatistics, ColumnValue, CompositeKey, Layer, Schema, TableStatistics,
};
pub use runner::{RunResult, Runner, TableConfig};
