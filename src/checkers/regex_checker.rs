//! Generic line-oriented regex checker.
//!
//! A catch-all for log formats none of the other six checkers understand: every line matching
//! a single user-supplied pattern is one finding. Mirrors the other checkers' shape so it can
//! sit in the same [`PluginRegistry`](crate::registry::PluginRegistry) uniformly.

use super::{resolve_limits, Checker, Limits, PatternSet};
use crate::config::RawCheckerConfig;
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;
use regex::Regex;

pub struct RegexChecker {
    pattern: Regex,
    limits: Limits,
    patterns: PatternSet,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
}

impl RegexChecker {
    pub fn from_raw_config(cfg: &RawCheckerConfig) -> Result<Self, WarningsError> {
        let Some(pattern_src) = cfg.pattern.as_deref() else {
            return Err(WarningsError::Config(
                "Generic regex checker requires a 'pattern' to match against".to_string(),
            ));
        };
        let pattern = Regex::new(pattern_src)
            .map_err(|e| WarningsError::Config(format!("Invalid regex pattern '{pattern_src}': {e}")))?;
        let limits = resolve_limits(cfg.min.as_ref(), cfg.max.as_ref(), "regex")?;
        let patterns = PatternSet::compile(&cfg.include, &cfg.exclude, "regex")?;
        Ok(RegexChecker {
            pattern,
            limits,
            patterns,
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "regex.cq_description_template",
            )?,
            findings: Vec::new(),
        })
    }
}

impl Checker for RegexChecker {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn check(
        &mut self,
        content: &str,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        for (idx, line) in content.lines().enumerate() {
            if !self.pattern.is_match(line) {
                continue;
            }
            if !self.patterns.allows(line) {
                continue;
            }
            self.findings.push(Finding::new(
                source.to_string(),
                (idx + 1) as u32,
                None,
                Severity::Minor,
                "regex",
                line.to_string(),
                None,
                fingerprints,
            ));
        }
        Ok(())
    }

    fn return_count(&self) -> i64 {
        self.findings.len() as i64
    }

    fn return_check_limits(&self) -> Result<i64, WarningsError> {
        let count = self.return_count();
        let exit_code = self.limits.exit_code(count);
        let mut message = format!("regex: {}", self.limits.summary_line(count));
        if exit_code != 0 {
            message.push_str(&format!(" Returning error code {exit_code}."));
        }
        tracing::warn!(checker = "regex", "{message}");
        Ok(exit_code)
    }

    fn findings(&self) -> &[Finding] {
        &self.findings
    }

    fn cq_default_path(&self) -> Option<&str> {
        self.cq_default_path.as_deref()
    }

    fn cq_description_template(&self) -> &str {
        &self.cq_description_template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(pattern: &str, min: i64, max: i64) -> RegexChecker {
        let mut cfg = RawCheckerConfig::from_cli(min, max, vec![], vec![]);
        cfg.pattern = Some(pattern.to_string());
        RegexChecker::from_raw_config(&cfg).unwrap()
    }

    #[test]
    fn missing_pattern_is_a_config_error() {
        let cfg = RawCheckerConfig::from_cli(0, 0, vec![], vec![]);
        assert!(RegexChecker::from_raw_config(&cfg).is_err());
    }

    #[test]
    fn matches_lines_against_pattern() {
        let mut c = checker(r"TODO\(.+\)", 0, 0);
        let mut fp = FingerprintRegistry::new();
        c.check("normal line\nTODO(jane): fix this\n", "notes.log", &mut fp).unwrap();
        assert_eq!(c.return_count(), 1);
        assert_eq!(c.findings()[0].line, 2);
    }
}
