//! Error kinds shared across the configuration, checker, and reporting layers.
//!
//! Every fallible operation in this crate returns `Result<T, WarningsError>`. The binary
//! crate (`main.rs`) is the only place that matches on the variant to pick a process exit
//! code; library code just propagates.

use thiserror::Error;

/// The closed set of error kinds this crate can raise.
#[derive(Debug, Error)]
pub enum WarningsError {
    /// Invalid option, missing env-var, Polyspace combined with other checkers, unknown
    /// classification referenced in limits, or `min > max`.
    #[error("{0}")]
    Config(String),

    /// A logfile or config file could not be found or read.
    #[error("{0}")]
    Input(String),

    /// A requested Robot suite does not exist in the result file.
    #[error("No suite with name '{0}' found")]
    SuiteNotFound(String),

    /// The `--command` subprocess could not be spawned, or exited non-zero without
    /// `--ignore-retval`.
    #[error("{0}")]
    Subprocess(String),

    /// A finding's path could not be made relative to the base directory when writing the
    /// Code-Quality report.
    #[error("{0}")]
    Report(String),
}

impl WarningsError {
    /// Polyspace was activated alongside another checker.
    pub fn polyspace_exclusive() -> Self {
        WarningsError::Config(
            "Polyspace checker cannot be combined with other warnings checkers".to_string(),
        )
    }
}
