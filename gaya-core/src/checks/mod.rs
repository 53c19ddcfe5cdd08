//! Data quality checks.
//!
//! Seven pure rule functions map a [`TableStatistics`](crate::TableStatistics)
//! (and, for volume and drift, an optional [`Baseline`](crate::Baseline)) to
//! an ordered list of [`CheckResult`] values:
//! - **Completeness**: null rate and required columns
//! - **Uniqueness**: single-column and composite keys
//! - **Volume**: absolute row-count bounds and change against the baseline
//! - **Schema**: type contract and drift against the baseline
//!
//! Rule functions perform no I/O and never fail. A configured column that
//! does not exist is reported as a FAIL result.
//!
//! # Example
//! ```rust
//! use chrono::Utc;
//! use gaya_core::checks::{check_unique, Status, UniqueConfig};
//! use gaya_core::{ColumnStatistics, Layer, TableStatistics};
//!
//! let stats = TableStatistics::new(
//!     "orders",
//!     Layer::Staging,
//!     1000,
//!     vec![ColumnStatistics::new("order_id", "int", 1000, 0, 980)],
//!     Utc::now(),
//! );
//! let results = check_unique(&stats, &UniqueConfig::single("order_id"));
//! assert_eq!(results[0].status, Status::Fail);
//! ```

mod completeness;
mod config;
mod format;
mod models;
mod schema;
mod uniqueness;
mod volume;

pub use completeness::{check_null_rate, check_required_columns};
pub use config::{
    NullRateConfig, RequiredConfig, RowCountConfig, RuleConfig, SchemaConfig, ThresholdError,
    UniqueConfig, VolumeChangeConfig,
};
pub use format::{format_count, format_delta, format_pct};
pub use models::{CheckKind, CheckResult, CheckValue, Status};
pub use schema::{check_schema, check_schema_drift};
pub use uniqueness::check_unique;
pub use volume::{check_row_count, check_volume_change};
