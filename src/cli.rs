//! Command-line interface.
//!
//! Flat, not subcommand-based: every flag applies to the single run this invocation performs.
//! Checkers are activated either by a `--config` file or by passing one or more of the
//! per-checker flags directly. `--command` and positional `logfile` arguments are mutually
//! exclusive; passing both is a parse-time rejection (clap's usual exit code `2`), not a
//! silent "one wins" fallback.

use clap::Parser;
use std::path::PathBuf;

/// Scans build, test, and static-analysis output for diagnostics and gates a CI job on
/// configurable count thresholds.
#[derive(Debug, Parser)]
#[command(
    name = "warngate",
    version,
    about = "Scans build, test, and static-analysis output for diagnostics and gates a CI job on configurable count thresholds"
)]
pub struct Cli {
    /// Log files or result files to scan. Supports shell-style glob patterns. Exclusive with
    /// `--command`.
    pub logfile: Vec<String>,

    /// Run this command and scan its combined stdout/stderr instead of reading `logfile`.
    #[arg(long, conflicts_with = "logfile")]
    pub command: Option<String>,

    /// Treat a nonzero exit code from `--command` as success.
    #[arg(long)]
    pub ignore_retval: bool,

    /// YAML or JSON configuration file naming the active checkers and their limits.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a GitLab Code Quality JSON report to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Base directory paths in the Code Quality report are made relative to. Defaults to the
    /// current directory.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Activate the Sphinx checker (ignored when `--config` is given).
    #[arg(short, long)]
    pub sphinx: bool,

    /// Activate the Doxygen checker (ignored when `--config` is given).
    #[arg(short, long)]
    pub doxygen: bool,

    /// Activate the JUnit/XmlRunner checker (ignored when `--config` is given).
    #[arg(short, long)]
    pub junit: bool,

    /// Activate the Coverity checker (ignored when `--config` is given).
    #[arg(long)]
    pub coverity: bool,

    /// Activate the Robot Framework checker (ignored when `--config` is given).
    #[arg(long)]
    pub robot: bool,

    /// Restrict `--robot` to this suite name. Ignored without `--robot`.
    #[arg(long, value_name = "SUITE")]
    pub name: Option<String>,

    /// Activate the generic regex checker with this pattern (ignored when `--config` is
    /// given).
    #[arg(short, long, value_name = "PATTERN")]
    pub regex: Option<String>,

    /// Count Sphinx `RemovedInSphinx*` deprecation warnings instead of suppressing them.
    /// Ignored without `--sphinx`.
    #[arg(long)]
    pub include_sphinx_deprecation: bool,

    /// Minimum number of warnings allowed, for a checker activated via flags.
    #[arg(long, visible_alias = "min-warnings", default_value_t = 0)]
    pub minwarnings: i64,

    /// Maximum number of warnings allowed, for a checker activated via flags. `-1` means
    /// unbounded.
    #[arg(short = 'm', long, visible_alias = "max-warnings", default_value_t = 0)]
    pub maxwarnings: i64,

    /// Sets `--minwarnings` and `--maxwarnings` to the same value. Exclusive with both.
    #[arg(long, value_name = "N", conflicts_with_all = ["minwarnings", "maxwarnings"])]
    pub exact_warnings: Option<i64>,

    /// Regex patterns that must match for a line to be counted, for a checker activated via
    /// flags.
    #[arg(long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Regex patterns that exclude an otherwise-matching line, for a checker activated via
    /// flags.
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Increase log verbosity. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
