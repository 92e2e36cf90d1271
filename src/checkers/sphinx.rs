//! Sphinx build log checker.
//!
//! Grounded on `SPHINX_WARNING_REGEX` in `warnings.py`:
//! `^(.+?:(?:\d+|None)): (DEBUG|INFO|WARNING|ERROR|SEVERE): (.+)\n?$` — one finding per
//! matching line, path and line split out of the leading `path:line:` group (`None` means no
//! line number was available and is recorded as `0`).

use super::{resolve_limits, Checker, Limits, PatternSet};
use crate::config::RawCheckerConfig;
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;
use regex::Regex;
use std::sync::OnceLock;

fn warning_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?):(\d+|None): (DEBUG|INFO|WARNING|ERROR|SEVERE): (.+)$").unwrap())
}

const DEPRECATION_MARKER: &str = "RemovedInSphinx";

fn severity_for(level: &str) -> Severity {
    match level {
        "DEBUG" | "INFO" => Severity::Info,
        "WARNING" => Severity::Minor,
        "ERROR" => Severity::Major,
        "SEVERE" => Severity::Critical,
        _ => Severity::Minor,
    }
}

#[derive(Debug)]
pub struct SphinxChecker {
    limits: Limits,
    patterns: PatternSet,
    include_deprecation: bool,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
}

impl SphinxChecker {
    pub fn from_raw_config(cfg: &RawCheckerConfig) -> Result<Self, WarningsError> {
        let limits = resolve_limits(cfg.min.as_ref(), cfg.max.as_ref(), "sphinx")?;
        let patterns = PatternSet::compile(&cfg.include, &cfg.exclude, "sphinx")?;
        Ok(SphinxChecker {
            limits,
            patterns,
            include_deprecation: cfg.include_sphinx_deprecation.unwrap_or(false),
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "sphinx.cq_description_template",
            )?,
            findings: Vec::new(),
        })
    }

    fn is_deprecation(line: &str) -> bool {
        line.contains(DEPRECATION_MARKER)
    }
}

impl Checker for SphinxChecker {
    fn name(&self) -> &'static str {
        "sphinx"
    }

    fn check(
        &mut self,
        content: &str,
        _source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        for line in content.lines() {
            let Some(caps) = warning_line_regex().captures(line) else {
                continue;
            };
            if !self.patterns.allows(line) {
                continue;
            }
            if !self.include_deprecation && Self::is_deprecation(line) {
                continue;
            }

            let path = caps[1].to_string();
            let line_no: u32 = caps[2].parse().unwrap_or(0);
            let level = &caps[3];
            let message = caps[4].to_string();

            self.findings.push(Finding::new(
                path,
                line_no,
                None,
                severity_for(level),
                "sphinx",
                message,
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
        let mut message = format!("sphinx: {}", self.limits.summary_line(count));
        if exit_code != 0 {
            message.push_str(&format!(" Returning error code {exit_code}."));
        }
        tracing::warn!(checker = "sphinx", "{message}");
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

    fn checker(min: i64, max: i64) -> SphinxChecker {
        let cfg = RawCheckerConfig::from_cli(min, max, vec![], vec![]);
        SphinxChecker::from_raw_config(&cfg).unwrap()
    }

    #[test]
    fn matches_warning_and_error_lines() {
        let mut c = checker(0, 0);
        let mut fp = FingerprintRegistry::new();
        c.check(
            "docs/index.rst:12: WARNING: unknown document\ndocs/api.rst:None: ERROR: broken toctree\n",
            "sphinx.log",
            &mut fp,
        )
        .unwrap();
        assert_eq!(c.return_count(), 2);
        assert_eq!(c.findings()[0].line, 12);
        assert_eq!(c.findings()[1].line, 0);
        assert_eq!(c.findings()[1].severity, Severity::Major);
    }

    #[test]
    fn ignores_unrelated_lines() {
        let mut c = checker(0, 0);
        let mut fp = FingerprintRegistry::new();
        c.check("building documentation...\n", "sphinx.log", &mut fp).unwrap();
        assert_eq!(c.return_count(), 0);
    }

    #[test]
    fn suppresses_deprecation_warnings_by_default() {
        let mut c = checker(0, 0);
        let mut fp = FingerprintRegistry::new();
        c.check(
            "docs/conf.py:1: WARNING: RemovedInSphinx80Warning: foo is deprecated\n",
            "sphinx.log",
            &mut fp,
        )
        .unwrap();
        assert_eq!(c.return_count(), 0);
    }

    #[test]
    fn exit_code_nonzero_over_max() {
        let mut c = checker(0, 0);
        let mut fp = FingerprintRegistry::new();
        c.check("docs/index.rst:1: WARNING: oops\n", "sphinx.log", &mut fp).unwrap();
        assert_eq!(c.return_check_limits().unwrap(), 1);
    }

    #[test]
    fn cq_description_template_substitutes_environment_variables() {
        std::env::set_var("WG_SPHINX_TEAM", "docs-team");
        let mut cfg = RawCheckerConfig::from_cli(0, 0, vec![], vec![]);
        cfg.cq_description_template = Some("[$WG_SPHINX_TEAM] $description".to_string());
        let c = SphinxChecker::from_raw_config(&cfg).unwrap();
        assert_eq!(c.cq_description_template(), "[docs-team] $description");
        std::env::remove_var("WG_SPHINX_TEAM");
    }

    #[test]
    fn cq_description_template_with_undefined_variable_is_rejected() {
        let mut cfg = RawCheckerConfig::from_cli(0, 0, vec![], vec![]);
        cfg.cq_description_template = Some("$DOES_NOT_EXIST_WG_SPHINX".to_string());
        let err = SphinxChecker::from_raw_config(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cq_description_template"));
        assert!(msg.contains("DOES_NOT_EXIST_WG_SPHINX"));
    }
}
