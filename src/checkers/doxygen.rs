//! Doxygen build log checker.
//!
//! The original `DOXYGEN_WARNING_REGEX` relies on a negative lookahead to fold continuation
//! lines into the preceding diagnostic; Rust's `regex` crate has no lookaround, so this is a
//! hand-written line-oriented scanner instead of one regex. Three line shapes are recognised:
//!
//! 1. `path:line: warning|error: message` (or `<text>:line:` with no level, or `<text>:line: warning|error:`).
//! 2. A bare `warning:`/`notice:`/`error:` with no location.
//! 3. Any subsequent line that doesn't itself start a new diagnostic and doesn't start with
//!    `/` or `<` is folded into the previous diagnostic's message as a continuation line.
//!
//! Lines referencing git notes (`notes ref refs/notes/...`) are not warnings even though they
//! contain the word "warning" — grounded on `test_git_warning`.

use super::{resolve_limits, Checker, Limits, PatternSet};
use crate::config::RawCheckerConfig;
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;
use regex::Regex;
use std::sync::OnceLock;

fn located_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((?:[/.]|[A-Za-z]:).+?):(-?\d+):\s*([Ww]arning|[Ee]rror): (.+)$").unwrap()
    })
}

fn bracketed_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<.+>:-?\d+(?::\s*([Ww]arning|[Ee]rror))?: (.+)$").unwrap())
}

fn bare_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([Nn]otice|[Ww]arning|[Ee]rror): (.+)$").unwrap())
}

fn is_git_noise(message: &str) -> bool {
    message.contains("notes ref refs/notes/")
}

fn severity_for(level: &str) -> Severity {
    if level.eq_ignore_ascii_case("error") {
        Severity::Major
    } else {
        Severity::Minor
    }
}

struct PendingDiagnostic {
    path: String,
    line: u32,
    severity: Severity,
    message: String,
}

pub struct DoxygenChecker {
    limits: Limits,
    patterns: PatternSet,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
}

impl DoxygenChecker {
    pub fn from_raw_config(cfg: &RawCheckerConfig) -> Result<Self, WarningsError> {
        let limits = resolve_limits(cfg.min.as_ref(), cfg.max.as_ref(), "doxygen")?;
        let patterns = PatternSet::compile(&cfg.include, &cfg.exclude, "doxygen")?;
        Ok(DoxygenChecker {
            limits,
            patterns,
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "doxygen.cq_description_template",
            )?,
            findings: Vec::new(),
        })
    }

    fn flush(
        &mut self,
        pending: Option<PendingDiagnostic>,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) {
        let Some(diag) = pending else { return };
        if is_git_noise(&diag.message) || !self.patterns.allows(&diag.message) {
            return;
        }
        self.findings.push(Finding::new(
            if diag.path.is_empty() { source.to_string() } else { diag.path },
            diag.line,
            None,
            diag.severity,
            "doxygen",
            diag.message,
            None,
            fingerprints,
        ));
    }
}

impl Checker for DoxygenChecker {
    fn name(&self) -> &'static str {
        "doxygen"
    }

    fn check(
        &mut self,
        content: &str,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        let mut pending: Option<PendingDiagnostic> = None;

        for line in content.lines() {
            if let Some(caps) = located_line_regex().captures(line) {
                self.flush(pending.take(), source, fingerprints);
                pending = Some(PendingDiagnostic {
                    path: caps[1].to_string(),
                    line: caps[2].parse().unwrap_or(0),
                    severity: severity_for(&caps[3]),
                    message: caps[4].to_string(),
                });
                continue;
            }
            if let Some(caps) = bracketed_line_regex().captures(line) {
                self.flush(pending.take(), source, fingerprints);
                let severity = caps
                    .get(1)
                    .map(|m| severity_for(m.as_str()))
                    .unwrap_or(Severity::Minor);
                pending = Some(PendingDiagnostic {
                    path: String::new(),
                    line: 0,
                    severity,
                    message: caps[2].to_string(),
                });
                continue;
            }
            if let Some(caps) = bare_line_regex().captures(line) {
                self.flush(pending.take(), source, fingerprints);
                let severity = if caps[1].eq_ignore_ascii_case("error") {
                    Severity::Major
                } else if caps[1].eq_ignore_ascii_case("notice") {
                    Severity::Info
                } else {
                    Severity::Minor
                };
                pending = Some(PendingDiagnostic {
                    path: String::new(),
                    line: 0,
                    severity,
                    message: caps[2].to_string(),
                });
                continue;
            }

            // Continuation line: folded into the pending diagnostic unless it looks like the
            // start of unrelated output.
            if let Some(diag) = pending.as_mut() {
                let looks_like_new_section = line.starts_with('/') || line.starts_with('<') || line.trim().is_empty();
                if !looks_like_new_section {
                    diag.message.push('\n');
                    diag.message.push_str(line);
                    continue;
                }
            }
            self.flush(pending.take(), source, fingerprints);
        }
        self.flush(pending.take(), source, fingerprints);
        Ok(())
    }

    fn return_count(&self) -> i64 {
        self.findings.len() as i64
    }

    fn return_check_limits(&self) -> Result<i64, WarningsError> {
        let count = self.return_count();
        let exit_code = self.limits.exit_code(count);
        let mut message = format!("doxygen: {}", self.limits.summary_line(count));
        if exit_code != 0 {
            message.push_str(&format!(" Returning error code {exit_code}."));
        }
        tracing::warn!(checker = "doxygen", "{message}");
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

    fn checker() -> DoxygenChecker {
        let cfg = RawCheckerConfig::from_cli(0, 0, vec![], vec![]);
        DoxygenChecker::from_raw_config(&cfg).unwrap()
    }

    #[test]
    fn matches_located_warning() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        c.check(
            "/src/foo.h:42: warning: Member bar not documented\n",
            "doxygen.log",
            &mut fp,
        )
        .unwrap();
        assert_eq!(c.return_count(), 1);
        assert_eq!(c.findings()[0].line, 42);
        assert_eq!(c.findings()[0].path, "/src/foo.h");
    }

    #[test]
    fn folds_continuation_lines() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        c.check(
            "/src/foo.h:42: warning: ambiguous link\nsee also bar()\nand baz()\n",
            "doxygen.log",
            &mut fp,
        )
        .unwrap();
        assert_eq!(c.return_count(), 1);
        assert!(c.findings()[0].description.contains("see also bar()"));
        assert!(c.findings()[0].description.contains("and baz()"));
    }

    #[test]
    fn ignores_git_notes_noise() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        c.check(
            "warning: notes ref refs/notes/review is invalid\n",
            "doxygen.log",
            &mut fp,
        )
        .unwrap();
        assert_eq!(c.return_count(), 0);
    }

    #[test]
    fn matches_bare_warning_with_no_location() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        c.check("warning: Tag 'FOO' at line 3 of file bar.cfg is invalid\n", "doxygen.log", &mut fp)
            .unwrap();
        assert_eq!(c.return_count(), 1);
    }
}
