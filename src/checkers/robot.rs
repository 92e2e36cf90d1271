//! Robot Framework `output.xml` checker.
//!
//! Like Coverity and Polyspace, Robot evaluates several independent groups — one per
//! configured suite — against their own `min`/`max`. An empty suite name means "all suites
//! combined". Referencing a suite name that does not appear anywhere in the result file is a
//! [`WarningsError::SuiteNotFound`], not a silent zero.

use super::{Checker, Limits};
use crate::config::RobotSection;
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashSet;

struct SuiteGroup {
    name: String,
    limits: Limits,
}

struct TestResult {
    suite_path: Vec<String>,
    failed: bool,
}

pub struct RobotChecker {
    groups: Vec<SuiteGroup>,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
    known_suites: HashSet<String>,
    results: Vec<TestResult>,
}

impl RobotChecker {
    pub fn from_section(cfg: &RobotSection) -> Result<Self, WarningsError> {
        let mut groups = Vec::with_capacity(cfg.suites.len());
        for suite in &cfg.suites {
            let key = format!("robot.suites.{}", suite.name);
            let min = suite.min.resolve(&format!("{key}.min"))?;
            let max = suite.max.resolve(&format!("{key}.max"))?;
            groups.push(SuiteGroup {
                name: suite.name.clone(),
                limits: Limits::new(min, max)?,
            });
        }
        Ok(RobotChecker {
            groups,
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "robot.cq_description_template",
            )?,
            findings: Vec::new(),
            known_suites: HashSet::new(),
            results: Vec::new(),
        })
    }

    fn count_for(&self, suite_name: &str) -> i64 {
        if suite_name.is_empty() {
            return self.results.iter().filter(|r| r.failed).count() as i64;
        }
        self.results
            .iter()
            .filter(|r| r.failed && r.suite_path.iter().any(|s| s == suite_name))
            .count() as i64
    }
}

fn attr<'a>(tag: &'a quick_xml::events::BytesStart, key: &[u8]) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

impl Checker for RobotChecker {
    fn name(&self) -> &'static str {
        "robot"
    }

    fn check(
        &mut self,
        content: &str,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut suite_stack: Vec<String> = Vec::new();
        let mut in_test = false;
        let mut current_test_name = String::new();
        let mut current_status = String::new();
        let mut current_message = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Start(tag)) => {
                    let name = String::from_utf8_lossy(tag.name().as_ref()).to_string();
                    match name.as_str() {
                        "suite" => {
                            let suite_name = attr(&tag, b"name").unwrap_or_default();
                            if !suite_name.is_empty() {
                                self.known_suites.insert(suite_name.clone());
                            }
                            suite_stack.push(suite_name);
                        }
                        "test" => {
                            in_test = true;
                            current_test_name = attr(&tag, b"name").unwrap_or_default();
                            current_status.clear();
                            current_message.clear();
                        }
                        "status" if in_test => {
                            current_status = attr(&tag, b"status").unwrap_or_default();
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(tag)) => {
                    let name = String::from_utf8_lossy(tag.name().as_ref()).to_string();
                    if name == "status" && in_test {
                        current_status = attr(&tag, b"status").unwrap_or_default();
                    }
                }
                Ok(Event::Text(text)) => {
                    if in_test && current_status == "FAIL" {
                        current_message.push_str(&text.unescape().unwrap_or_default());
                    }
                }
                Ok(Event::End(tag)) => {
                    let name = String::from_utf8_lossy(tag.name().as_ref()).to_string();
                    match name.as_str() {
                        "suite" => {
                            suite_stack.pop();
                        }
                        "test" => {
                            in_test = false;
                            let failed = current_status == "FAIL";
                            if failed {
                                let message = if current_message.trim().is_empty() {
                                    format!("Test '{current_test_name}' failed")
                                } else {
                                    current_message.trim().to_string()
                                };
                                self.findings.push(Finding::new(
                                    source.to_string(),
                                    0,
                                    None,
                                    Severity::Major,
                                    current_test_name.clone(),
                                    message.clone(),
                                    suite_stack.last().cloned(),
                                    fingerprints,
                                ));
                                self.results.push(TestResult {
                                    suite_path: suite_stack.clone(),
                                    failed: true,
                                });
                            } else {
                                self.results.push(TestResult {
                                    suite_path: suite_stack.clone(),
                                    failed: false,
                                });
                            }
                        }
                        _ => {}
                    }
                }
                Err(e) => {
                    return Err(WarningsError::Input(format!(
                        "Failed to parse Robot result file {source}: {e}"
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn return_count(&self) -> i64 {
        self.results.iter().filter(|r| r.failed).count() as i64
    }

    fn return_check_limits(&self) -> Result<i64, WarningsError> {
        for group in &self.groups {
            if !group.name.is_empty() && !self.known_suites.contains(&group.name) {
                return Err(WarningsError::SuiteNotFound(group.name.clone()));
            }
        }

        let mut total = 0;
        for group in &self.groups {
            let count = self.count_for(&group.name);
            let exit_code = group.limits.exit_code(count);
            total += exit_code;
            let label = if group.name.is_empty() { "all suites" } else { group.name.as_str() };
            let message = format!("{label}: {}", group.limits.summary_line(count));
            tracing::warn!(checker = "robot", suite = label, "{message}");
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
