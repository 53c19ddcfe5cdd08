//! Process exit codes.
//!
//! CI pipelines gate on these, so they are part of the public contract.

/// Every check passed
pub const SUCCESS: i32 = 0;

/// At least one warning, no failures
pub const WARNINGS: i32 = 1;

/// At least one check failed
pub const FAILURES: i32 = 2;

/// Infrastructure error: config, connection, collection or baseline I/O
pub const INFRASTRUCTURE_ERROR: i32 = 3;
