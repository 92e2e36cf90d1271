//! # warngate
//!
//! Scans build logs, test result files, and static-analysis reports for diagnostics and gates
//! a CI job on configurable count thresholds.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use warngate::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["warngate", "--sphinx", "build.log"]);
//! let outcome = warngate::driver::run(&cli).expect("run failed");
//! std::process::exit(outcome.exit_code as i32);
//! ```
//!
//! ## Architecture
//!
//! The crate is organized around a pipeline:
//!
//! 1. **[`config`]** — load and validate configuration from YAML or JSON files.
//! 2. **[`checkers`]** — pluggable [`checkers::Checker`] trait with seven built-in
//!    implementations (sphinx, doxygen, xmlrunner, coverity, polyspace, robot, regex).
//! 3. **[`registry`]** — activates the configured checkers and drives them sequentially.
//! 4. **[`driver`]** — acquires input (files, globs, or a subprocess) and runs one full cycle.
//! 5. **[`finding`]** — core data types ([`finding::Finding`], [`finding::CodeQualityEntry`]).
//! 6. **[`fingerprint`]** and **[`template`]** — fingerprint derivation and environment
//!    variable substitution shared by every checker.
//!
//! ## Checkers
//!
//! | Checker | Input | Description |
//! |---------|-------|-------------|
//! | `sphinx` | build log | Sphinx `DEBUG`/`INFO`/`WARNING`/`ERROR`/`SEVERE` lines |
//! | `doxygen` | build log | Doxygen warnings, folding multi-line continuations |
//! | `xmlrunner` | JUnit XML | `<failure>`/`<error>` elements per test case |
//! | `coverity` | Coverity build log | defects grouped by classification, deduped by CID |
//! | `polyspace` | Polyspace CSV | findings grouped by (family, color) |
//! | `robot` | Robot Framework XML | failures grouped by suite |
//! | `regex` | any text | lines matching a user-supplied pattern |

pub mod checkers;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod finding;
pub mod fingerprint;
pub mod registry;
pub mod template;
