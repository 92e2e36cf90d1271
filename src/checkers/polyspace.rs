//! Polyspace CSV result checker.
//!
//! Polyspace exports its results as tab-delimited text with `Family`, `Color`, `File`, `Line`,
//! `Check`, `Justified`, and `Information` columns (among others). Each configured
//! `(family, color)` pair in [`PolyspaceCheckConfig`] is evaluated independently, like
//! Coverity's classifications, except a pair's `action` decides whether exceeding its limits
//! contributes to the overall exit code (`fail`) or is only logged (`warn`). A surviving row's
//! include/exclude patterns are matched against `Check`, not the free-text `Information`
//! message, and only rows whose `Justified` column reads `Unjustified` count towards a pair's
//! total — a reviewed/accepted finding doesn't gate the build. Mutual exclusion with the other
//! checkers is enforced by the registry at activation time, not here.

use super::{Checker, Limits, PatternSet};
use crate::config::{PolyspaceAction, PolyspaceSection};
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;

struct CheckGroup {
    family: String,
    color: String,
    limits: Limits,
    patterns: PatternSet,
    action: PolyspaceAction,
}

pub struct PolyspaceChecker {
    groups: Vec<CheckGroup>,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
}

impl PolyspaceChecker {
    pub fn from_section(cfg: &PolyspaceSection) -> Result<Self, WarningsError> {
        let mut groups = Vec::with_capacity(cfg.checks.len());
        for check in &cfg.checks {
            let key = format!("polyspace.{}.{}", check.family, check.color);
            let min = check.min.resolve(&format!("{key}.min"))?;
            let max = check.max.resolve(&format!("{key}.max"))?;
            let limits = Limits::new(min, max)?;
            let patterns = PatternSet::compile(&check.include, &check.exclude, &key)?;
            groups.push(CheckGroup {
                family: check.family.clone(),
                color: check.color.clone(),
                limits,
                patterns,
                action: check.action,
            });
        }
        Ok(PolyspaceChecker {
            groups,
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "polyspace.cq_description_template",
            )?,
            findings: Vec::new(),
        })
    }

    fn count_for(&self, family: &str, color: &str) -> i64 {
        self.findings
            .iter()
            .filter(|f| {
                f.classification.as_deref() == Some(&format!("{family}/{color}"))
            })
            .count() as i64
    }
}

fn column<'a>(headers: &csv::StringRecord, record: &'a csv::StringRecord, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .and_then(|idx| record.get(idx))
}

impl Checker for PolyspaceChecker {
    fn name(&self) -> &'static str {
        "polyspace"
    }

    fn check(
        &mut self,
        content: &str,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| WarningsError::Input(format!("Failed to read Polyspace CSV {source}: {e}")))?
            .clone();

        for record in reader.records() {
            let record = record
                .map_err(|e| WarningsError::Input(format!("Failed to read Polyspace CSV {source}: {e}")))?;

            let family = column(&headers, &record, "Family").unwrap_or("").to_string();
            let color = column(&headers, &record, "Color").unwrap_or("").to_string();
            let file = column(&headers, &record, "File").unwrap_or(source).to_string();
            let line: u32 = column(&headers, &record, "Line").and_then(|v| v.parse().ok()).unwrap_or(0);
            let check = column(&headers, &record, "Check").unwrap_or("").to_string();
            let message = column(&headers, &record, "Information").unwrap_or("polyspace finding").to_string();
            let justified = column(&headers, &record, "Justified").unwrap_or("Unjustified");

            let Some(group) = self
                .groups
                .iter()
                .find(|g| g.family.eq_ignore_ascii_case(&family) && g.color.eq_ignore_ascii_case(&color))
            else {
                continue;
            };
            if !group.patterns.allows(&check) {
                continue;
            }
            if justified != "Unjustified" {
                continue;
            }

            let severity = match color.to_ascii_lowercase().as_str() {
                "red" => Severity::Critical,
                "orange" => Severity::Major,
                "gray" | "grey" => Severity::Info,
                _ => Severity::Minor,
            };

            let classification = format!("{}/{}", group.family, group.color);
            self.findings.push(Finding::new(
                file,
                line,
                None,
                severity,
                classification.clone(),
                message,
                Some(classification),
                fingerprints,
            ));
        }
        Ok(())
    }

    fn return_count(&self) -> i64 {
        self.findings.len() as i64
    }

    fn return_check_limits(&self) -> Result<i64, WarningsError> {
        let mut total = 0;
        for group in &self.groups {
            let count = self.count_for(&group.family, &group.color);
            let exit_code = group.limits.exit_code(count);
            let message = format!("{}/{}: {}", group.family, group.color, group.limits.summary_line(count));
            tracing::warn!(checker = "polyspace", family = %group.family, color = %group.color, "{message}");
            if group.action == PolyspaceAction::Fail {
                total += exit_code;
            }
        }
        Ok(total)
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
    use crate::config::{ConfigValue, PolyspaceCheckConfig};

    fn section(action: PolyspaceAction) -> PolyspaceSection {
        PolyspaceSection {
            enabled: true,
            checks: vec![PolyspaceCheckConfig {
                family: "Run-time Checks".to_string(),
                color: "Red".to_string(),
                min: ConfigValue::Int(0),
                max: ConfigValue::Int(0),
                exclude: vec![],
                include: vec![],
                action,
            }],
            cq_default_path: None,
            cq_description_template: None,
        }
    }

    const SAMPLE: &str = "Family\tColor\tFile\tLine\tCheck\tJustified\tInformation\n\
        Run-time Checks\tRed\tsrc/a.c\t10\tOBAI\tUnjustified\tout of bounds array access\n\
        Run-time Checks\tRed\tsrc/b.c\t12\tOBAI\tJustified\treviewed, not an issue\n\
        Run-time Checks\tGreen\tsrc/c.c\t11\tOBAI\tUnjustified\tno issue\n";

    #[test]
    fn counts_only_matching_family_and_color() {
        let mut c = PolyspaceChecker::from_section(&section(PolyspaceAction::Fail)).unwrap();
        let mut fp = FingerprintRegistry::new();
        c.check(SAMPLE, "results.csv", &mut fp).unwrap();
        assert_eq!(c.return_count(), 1);
        assert_eq!(c.findings()[0].severity, Severity::Critical);
    }

    #[test]
    fn justified_rows_are_excluded_from_the_count() {
        let mut c = PolyspaceChecker::from_section(&section(PolyspaceAction::Fail)).unwrap();
        let mut fp = FingerprintRegistry::new();
        c.check(SAMPLE, "results.csv", &mut fp).unwrap();
        assert_eq!(c.return_check_limits().unwrap(), 1);
        assert!(c.findings().iter().all(|f| f.line != 12));
    }

    #[test]
    fn include_exclude_patterns_match_against_the_check_column() {
        let mut section = section(PolyspaceAction::Fail);
        section.checks[0].exclude = vec!["OBAI".to_string()];
        let mut c = PolyspaceChecker::from_section(&section).unwrap();
        let mut fp = FingerprintRegistry::new();
        c.check(SAMPLE, "results.csv", &mut fp).unwrap();
        assert_eq!(c.return_count(), 0);
    }

    #[test]
    fn warn_action_does_not_affect_exit_code() {
        let mut c = PolyspaceChecker::from_section(&section(PolyspaceAction::Warn)).unwrap();
        let mut fp = FingerprintRegistry::new();
        c.check(SAMPLE, "results.csv", &mut fp).unwrap();
        assert_eq!(c.return_check_limits().unwrap(), 0);
    }

    #[test]
    fn fail_action_contributes_to_exit_code() {
        let mut c = PolyspaceChecker::from_section(&section(PolyspaceAction::Fail)).unwrap();
        let mut fp = FingerprintRegistry::new();
        c.check(SAMPLE, "results.csv", &mut fp).unwrap();
        assert_eq!(c.return_check_limits().unwrap(), 1);
    }
}
