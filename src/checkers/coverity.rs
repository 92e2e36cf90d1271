//! Coverity text-log checker.
//!
//! Coverity's command-line report emits one line per event of the shape:
//! `<path>:<line>: CID <n> (#<k> of <total>): <violation> (<category>): <classification>,
//! <action>, <comment>, owner is <owner>, first detected on <date>.` — grounded on
//! `examples/original_source/tests/test_coverity.py`. A CID can appear more than once (one
//! line per event in its chain); only the *last* line for a given CID is kept, matching
//! `test_single_warning_count_one`'s expectation that a two-event CID counts once and logs the
//! later line.
//!
//! Findings are grouped by their `classification` field (`Unclassified`, `Pending`, `Bug`,
//! `Intentional`, `False Positive`, matched case-insensitively and canonicalized to this form)
//! and each group is evaluated against its own configured `min`/`max` independently — a
//! classification with no explicit limits defaults to `0`/unbounded, so by default any number
//! of (say) `Intentional` issues is fine but a single unclassified one fails the build. A log
//! line naming any other classification is logged and discarded; referencing an unrecognized
//! name in configuration is instead a parse-time [`WarningsError::Config`].

use super::{Checker, Limits, PatternSet};
use crate::config::CoveritySection;
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const CLASSIFICATIONS: [&str; 5] = ["Unclassified", "Pending", "Bug", "Intentional", "False Positive"];

fn cid_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(.+?):(-?\d+): CID (\d+) \(#(\d+) of (\d+)\): (?:.+?) \(.+?\): ([^,]+), (?:.+?), (?:.+?), owner is (?:.+?), first detected on (?:.+)\.$",
        )
        .unwrap()
    })
}

fn severity_for(classification: &str) -> Severity {
    match classification {
        "Bug" => Severity::Critical,
        "Unclassified" => Severity::Major,
        "Pending" => Severity::Major,
        _ => Severity::Info,
    }
}

pub struct CoverityChecker {
    limits: HashMap<String, Limits>,
    patterns: PatternSet,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
    cid_index: HashMap<u64, usize>,
}

impl CoverityChecker {
    pub fn from_section(cfg: &CoveritySection) -> Result<Self, WarningsError> {
        let mut limits = HashMap::new();
        for (name, bound) in &cfg.classification {
            if !CLASSIFICATIONS.contains(&name.as_str()) {
                return Err(WarningsError::Config(format!(
                    "Unknown Coverity classification '{name}' in configuration"
                )));
            }
            let min = bound.min.resolve(&format!("coverity.classification.{name}.min"))?;
            let max = bound.max.resolve(&format!("coverity.classification.{name}.max"))?;
            limits.insert(name.clone(), Limits::new(min, max)?);
        }
        let patterns = PatternSet::compile(&cfg.include, &cfg.exclude, "coverity")?;
        Ok(CoverityChecker {
            limits,
            patterns,
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "coverity.cq_description_template",
            )?,
            findings: Vec::new(),
            cid_index: HashMap::new(),
        })
    }

    fn limits_for(&self, classification: &str) -> Limits {
        self.limits
            .get(classification)
            .copied()
            .unwrap_or(Limits { min: 0, max: -1 })
    }

    fn count_for(&self, classification: &str) -> i64 {
        self.findings
            .iter()
            .filter(|f| f.classification.as_deref() == Some(classification))
            .count() as i64
    }
}

impl Checker for CoverityChecker {
    fn name(&self) -> &'static str {
        "coverity"
    }

    fn check(
        &mut self,
        content: &str,
        _source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        for line in content.lines() {
            let Some(caps) = cid_line_regex().captures(line) else {
                continue;
            };
            if !self.patterns.allows(line) {
                continue;
            }

            let path = caps[1].to_string();
            let line_no: u32 = caps[2].parse().unwrap_or(0);
            let cid: u64 = caps[3].parse().unwrap_or(0);
            let raw_classification = caps[6].to_string();

            let Some(classification) = CLASSIFICATIONS
                .iter()
                .find(|c| c.eq_ignore_ascii_case(&raw_classification))
                .map(|c| c.to_string())
            else {
                tracing::warn!(
                    checker = "coverity",
                    "Unrecognized classification '{raw_classification}'"
                );
                continue;
            };

            let finding = Finding::new(
                path,
                line_no,
                None,
                severity_for(&classification),
                format!("CID {cid}"),
                line.trim().to_string(),
                Some(classification),
                fingerprints,
            );

            if let Some(&idx) = self.cid_index.get(&cid) {
                self.findings[idx] = finding;
            } else {
                self.cid_index.insert(cid, self.findings.len());
                self.findings.push(finding);
            }
        }
        Ok(())
    }

    fn return_count(&self) -> i64 {
        self.findings.len() as i64
    }

    fn return_check_limits(&self) -> Result<i64, WarningsError> {
        let mut total = 0;
        for classification in CLASSIFICATIONS {
            let count = self.count_for(classification);
            if count == 0 && !self.limits.contains_key(classification) {
                continue;
            }
            let limits = self.limits_for(classification);
            let exit_code = limits.exit_code(count);
            total += exit_code;
            let message = format!("{classification}: {}", limits.summary_line(count));
            tracing::warn!(checker = "coverity", classification, "{message}");
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
