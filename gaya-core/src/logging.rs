//! Log setup for the gaya binary.
//!
//! Logs go to stderr. Stdout belongs to the report, and JSON output must
//! stay machine-parseable. `GAYA_LOG` accepts `tracing` filter directives
//! on top of the flag-derived level, e.g. `GAYA_LOG=gaya_core::baseline=trace`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

use crate::Result;
use crate::error::GayaError;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "GAYA_LOG";

/// Maps CLI verbosity flags to a level. `quiet` wins over any count.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Builds the filter for the given flags.
///
/// Without `GAYA_LOG`, driver internals stay at WARN until `-vv` so
/// per-statement sqlx logs do not drown the check stages.
pub fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    let level = LevelFilter::from_level(level_for(verbose, quiet));
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    if verbose < 2
        && !quiet
        && std::env::var_os(LOG_ENV).is_none()
        && let Ok(directive) = "sqlx=warn".parse::<Directive>()
    {
        filter = filter.add_directive(directive);
    }
    filter
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns a configuration error if a subscriber is already installed
///
/// # Example
/// ```rust,no_run
/// use gaya_core::logging::init_logging;
///
/// init_logging(1, false)?;
/// # Ok::<(), gaya_core::GayaError>(())
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init()
        .map_err(|e| GayaError::configuration(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A subscriber can be installed once per process, so only the level and
    // filter mapping are exercised here.
    #[test]
    fn test_verbosity_levels() {
        let cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 5), tracing::Level::ERROR),
            ((false, 0), tracing::Level::INFO),
            ((false, 1), tracing::Level::DEBUG),
            ((false, 2), tracing::Level::TRACE),
            ((false, 10), tracing::Level::TRACE),
        ];

        for ((quiet, verbose), expected) in cases {
            assert_eq!(
                level_for(verbose, quiet),
                expected,
                "quiet={}, verbose={}",
                quiet,
                verbose
            );
        }
    }

    #[test]
    fn test_filter_quiets_driver_logs() {
        temp_env::with_var_unset(LOG_ENV, || {
            let filter = filter_for(0, false).to_string();
            assert!(filter.contains("sqlx=warn"));
            assert!(filter.contains("info"));

            let filter = filter_for(2, false).to_string();
            assert!(!filter.contains("sqlx"));
            assert!(filter.contains("trace"));
        });
    }

    #[test]
    fn test_env_directives_apply() {
        temp_env::with_var(LOG_ENV, Some("gaya_core::baseline=trace"), || {
            let filter = filter_for(0, false).to_string();
            assert!(filter.contains("gaya_core::baseline=trace"));
        });
    }
}
