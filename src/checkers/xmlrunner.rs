//! JUnit/XmlRunner result checker.
//!
//! The original regex-based implementation just counted `<failure message` substrings; this
//! checker instead parses the JUnit XML structurally with `quick-xml`, building one finding per
//! `<failure>`/`<error>` child of a `<testcase>`, with `check_name` set to `classname.name` and
//! the description taken from the element's `message` attribute (falling back to its inner
//! text). Malformed XML is not fatal: it is logged and treated as zero findings for that blob,
//! since a build step producing no usable result file is a different failure than a broken
//! test.

use super::{resolve_limits, Checker, Limits, PatternSet};
use crate::config::RawCheckerConfig;
use crate::error::WarningsError;
use crate::finding::{Finding, Severity};
use crate::fingerprint::FingerprintRegistry;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

pub struct XmlRunnerChecker {
    limits: Limits,
    patterns: PatternSet,
    cq_default_path: Option<String>,
    cq_description_template: String,
    findings: Vec<Finding>,
}

struct PendingFailure {
    is_error: bool,
    message: Option<String>,
    inner_text: String,
    check_name: String,
}

fn check_name_for(classname: &str, case_name: &str) -> String {
    if classname.is_empty() {
        case_name.to_string()
    } else {
        format!("{classname}.{case_name}")
    }
}

impl XmlRunnerChecker {
    pub fn from_raw_config(cfg: &RawCheckerConfig) -> Result<Self, WarningsError> {
        let limits = resolve_limits(cfg.min.as_ref(), cfg.max.as_ref(), "xmlrunner")?;
        let patterns = PatternSet::compile(&cfg.include, &cfg.exclude, "xmlrunner")?;
        Ok(XmlRunnerChecker {
            limits,
            patterns,
            cq_default_path: cfg.cq_default_path.clone(),
            cq_description_template: crate::template::resolve_cq_description_template(
                cfg.cq_description_template.as_deref(),
                "xmlrunner.cq_description_template",
            )?,
            findings: Vec::new(),
        })
    }

    fn push_finding(
        &mut self,
        source: &str,
        is_error: bool,
        check_name: String,
        message: String,
        fingerprints: &mut FingerprintRegistry,
    ) {
        if !self.patterns.allows(&message) {
            return;
        }
        let severity = if is_error { Severity::Critical } else { Severity::Major };
        self.findings.push(Finding::new(
            source.to_string(),
            0,
            None,
            severity,
            check_name,
            message,
            None,
            fingerprints,
        ));
    }
}

impl Checker for XmlRunnerChecker {
    fn name(&self) -> &'static str {
        "xmlrunner"
    }

    fn check(
        &mut self,
        content: &str,
        source: &str,
        fingerprints: &mut FingerprintRegistry,
    ) -> Result<(), WarningsError> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut classname = String::new();
        let mut case_name = String::new();
        let mut pending: Option<PendingFailure> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Start(tag)) => {
                    let local = tag.name();
                    let local = String::from_utf8_lossy(local.as_ref()).to_string();
                    match local.as_str() {
                        "testcase" => {
                            classname = attr_value(&tag, b"classname").unwrap_or_default();
                            case_name = attr_value(&tag, b"name").unwrap_or_default();
                        }
                        "failure" | "error" => {
                            pending = Some(PendingFailure {
                                is_error: local == "error",
                                message: attr_value(&tag, b"message"),
                                inner_text: String::new(),
                                check_name: check_name_for(&classname, &case_name),
                            });
                        }
                        _ => {}
                    }
                }
                Ok(Event::Empty(tag)) => {
                    let local = tag.name();
                    let local = String::from_utf8_lossy(local.as_ref()).to_string();
                    match local.as_str() {
                        "testcase" => {
                            classname = attr_value(&tag, b"classname").unwrap_or_default();
                            case_name = attr_value(&tag, b"name").unwrap_or_default();
                        }
                        "failure" | "error" => {
                            let is_error = local == "error";
                            let message =
                                attr_value(&tag, b"message").unwrap_or_else(|| format!("{local} in test case"));
                            self.push_finding(source, is_error, check_name_for(&classname, &case_name), message, fingerprints);
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(pending) = &mut pending {
                        pending.inner_text.push_str(&text.unescape().unwrap_or_default());
                    }
                }
                Ok(Event::End(tag)) => {
                    let local = tag.name();
                    let local = String::from_utf8_lossy(local.as_ref()).to_string();
                    if (local == "failure" || local == "error") && pending.is_some() {
                        let p = pending.take().unwrap();
                        let message = p.message.unwrap_or_else(|| {
                            let trimmed = p.inner_text.trim();
                            if trimmed.is_empty() {
                                format!("{local} in test case")
                            } else {
                                trimmed.to_string()
                            }
                        });
                        self.push_finding(source, p.is_error, p.check_name, message, fingerprints);
                    }
                }
                Err(e) => {
                    tracing::warn!(checker = "xmlrunner", source, error = %e, "malformed XML, skipping remainder");
                    break;
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn return_count(&self) -> i64 {
        self.findings.len() as i64
    }

    fn return_check_limits(&self) -> Result<i64, WarningsError> {
        let count = self.return_count();
        let exit_code = self.limits.exit_code(count);
        let mut message = format!("xmlrunner: {}", self.limits.summary_line(count));
        if exit_code != 0 {
            message.push_str(&format!(" Returning error code {exit_code}."));
        }
        tracing::warn!(checker = "xmlrunner", "{message}");
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

fn attr_value(tag: &quick_xml::events::BytesStart, key: &[u8]) -> Option<String> {
    tag.attributes().flatten().find(|a| a.key.as_ref() == key).map(|a| {
        String::from_utf8_lossy(&a.value).to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> XmlRunnerChecker {
        let cfg = RawCheckerConfig::from_cli(0, 0, vec![], vec![]);
        XmlRunnerChecker::from_raw_config(&cfg).unwrap()
    }

    const SAMPLE: &str = r#"<testsuite>
        <testcase classname="tests.test_foo" name="test_bar">
            <failure message="assertion failed">AssertionError</failure>
        </testcase>
        <testcase classname="tests.test_foo" name="test_ok"/>
    </testsuite>"#;

    #[test]
    fn counts_one_failure() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        c.check(SAMPLE, "results.xml", &mut fp).unwrap();
        assert_eq!(c.return_count(), 1);
        assert_eq!(c.findings()[0].check_name, "tests.test_foo.test_bar");
    }

    #[test]
    fn falls_back_to_inner_text_when_message_attribute_is_absent() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        c.check(
            r#"<testsuite><testcase classname="tests.test_foo" name="test_bar">
                <failure>AssertionError: expected 1, got 2</failure>
            </testcase></testsuite>"#,
            "results.xml",
            &mut fp,
        )
        .unwrap();
        assert_eq!(c.return_count(), 1);
        assert_eq!(c.findings()[0].description, "AssertionError: expected 1, got 2");
    }

    #[test]
    fn malformed_xml_is_non_fatal() {
        let mut c = checker();
        let mut fp = FingerprintRegistry::new();
        let result = c.check("<testsuite><testcase", "results.xml", &mut fp);
        assert!(result.is_ok());
        assert_eq!(c.return_count(), 0);
    }
}
