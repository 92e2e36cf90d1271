//! The seven concrete checkers and the shared pieces every one of them builds on.
//!
//! A checker accumulates [`Finding`]s across one or more calls to [`Checker::check`], then
//! [`Checker::return_check_limits`] evaluates the accumulated count (or, for the aggregating
//! checkers, several independent counts) against configured [`Limits`] and logs the summary
//! line a CI log reader actually looks for.

pub mod coverity;
pub mod doxygen;
pub mod polyspace;
pub mod regex_checker;
pub mod robot;
pub mod sphinx;
pub mod xmlrunner;

use crate::config::ConfigValue;
use crate::error::WarningsError;
use crate::finding::Finding;
use crate::fingerprint::FingerprintRegistry;
use regex::Regex;

/// A lower/upper bound on a warning count, with `-1` meaning "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: i64,
    pub max: i64,
}

impl Limits {
    pub fn new(min: i64, max: i64) -> Result<Self, WarningsError> {
        if max != -1 && min > max {
            return Err(WarningsError::Config(format!(
                "Invalid limits: minimum ({min}) is higher than maximum ({max})"
            )));
        }
        Ok(Limits { min, max })
    }

    pub fn max_is_unbounded(&self) -> bool {
        self.max == -1
    }

    /// This bound's contribution to the overall exit code for the given count. Zero means
    /// "within bounds"; a nonzero failure is never itself zero, so a zero count that still
    /// falls outside the bounds (e.g. `min: 1`) is reported as `1`.
    pub fn exit_code(&self, count: i64) -> i64 {
        if count < self.min {
            return if count == 0 { 1 } else { count };
        }
        if !self.max_is_unbounded() && count > self.max {
            return if count == 0 { 1 } else { count };
        }
        0
    }

    /// The human-readable summary line for `count` against these bounds (no checker-name
    /// prefix, no "Returning error code" suffix — callers append those as needed).
    pub fn summary_line(&self, count: i64) -> String {
        if self.min == self.max && count == self.min {
            return format!("Number of warnings ({count}) is exactly as expected. Well done.");
        }
        if count < self.min {
            format!(
                "Number of warnings ({count}) is lower than the minimum limit ({}).",
                self.min
            )
        } else if !self.max_is_unbounded() && count > self.max {
            format!(
                "Number of warnings ({count}) is higher than the maximum limit ({}).",
                self.max
            )
        } else {
            format!(
                "Number of warnings ({count}) is between limits {} and {}. Well done.",
                self.min, self.max
            )
        }
    }
}

/// Resolves a checker's `min`/`max` configuration values (defaulting to `0`/unbounded when
/// absent) into [`Limits`].
pub fn resolve_limits(
    min: Option<&ConfigValue>,
    max: Option<&ConfigValue>,
    key_context: &str,
) -> Result<Limits, WarningsError> {
    let min = match min {
        Some(v) => v.resolve(&format!("{key_context}.min"))?,
        None => 0,
    };
    let max = match max {
        Some(v) => v.resolve(&format!("{key_context}.max"))?,
        None => -1,
    };
    Limits::new(min, max)
}

/// Include/exclude regex filtering for a checker's findings. Inclusion dominates exclusion:
/// once any include pattern is configured, only lines matching one of them survive, and
/// exclude patterns are not consulted at all.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PatternSet {
    pub fn compile(include: &[String], exclude: &[String], key_context: &str) -> Result<Self, WarningsError> {
        let compile_all = |pats: &[String]| -> Result<Vec<Regex>, WarningsError> {
            pats.iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        WarningsError::Config(format!("Invalid pattern in '{key_context}': {e}"))
                    })
                })
                .collect()
        };
        Ok(PatternSet {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    pub fn allows(&self, line: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|r| r.is_match(line));
        }
        !self.exclude.iter().any(|r| r.is_match(line))
    }
}

/// Common behaviour across all seven checkers.
///
/// A single checker instance is fed every input blob in turn via [`check`](Checker::check),
/// then asked once for its contribution to the run's overall exit code.
pub trait Checker {
    /// Stable identifier, used as the `checker_name` in log lines.
    fn name(&self) -> &'static str;

    /// Scans one input blob (the full text of a log file, command output, or result file) for
    /// findings, recording them against `fingerprints`.
    fn check(
        &mut self,
        content: &str,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError>;

    /// Total number of findings recorded across every call to `check` so far.
    fn return_count(&self) -> i64;

    /// Evaluates accumulated findings against configured limits, logs the relevant summary
    /// line(s), and returns this checker's contribution to the overall exit code.
    fn return_check_limits(&self) -> Result<i64, WarningsError>;

    /// Every finding recorded so far, for Code Quality report rendering.
    fn findings(&self) -> &[Finding];

    /// Fallback path for findings with no meaningful file location, when configured.
    fn cq_default_path(&self) -> Option<&str> {
        None
    }

    /// Env-var-substituted `cq_description_template`, defaulting to a bare `$description`.
    fn cq_description_template(&self) -> &str {
        "$description"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_reject_min_greater_than_max() {
        assert!(Limits::new(5, 2).is_err());
    }

    #[test]
    fn limits_allow_min_greater_than_max_when_max_unbounded() {
        assert!(Limits::new(5, -1).is_ok());
    }

    #[test]
    fn exit_code_remaps_zero_to_one_on_failure() {
        let limits = Limits::new(1, -1).unwrap();
        assert_eq!(limits.exit_code(0), 1);
        assert_eq!(limits.exit_code(1), 0);
    }

    #[test]
    fn exit_code_uses_count_when_over_max() {
        let limits = Limits::new(0, 2).unwrap();
        assert_eq!(limits.exit_code(5), 5);
        assert_eq!(limits.exit_code(2), 0);
    }

    #[test]
    fn summary_line_exact_match_phrasing() {
        let limits = Limits::new(3, 3).unwrap();
        assert_eq!(
            limits.summary_line(3),
            "Number of warnings (3) is exactly as expected. Well done."
        );
    }

    #[test]
    fn pattern_set_inclusion_dominates_exclusion() {
        let patterns = PatternSet::compile(
            &["important".to_string()],
            &["important".to_string()],
            "exclude",
        )
        .unwrap();
        assert!(patterns.allows("this is important"));
        assert!(!patterns.allows("this is not"));
    }

    #[test]
    fn pattern_set_exclusion_without_inclusion() {
        let patterns = PatternSet::compile(&[], &["noise".to_string()], "exclude").unwrap();
        assert!(!patterns.allows("some noise here"));
        assert!(patterns.allows("a real warning"));
    }
}
