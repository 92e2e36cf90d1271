//! Builds and drives the active set of checkers for one run.
//!
//! [`PluginRegistry::from_file_config`] decides which checkers are active (honoring each
//! section's `enabled` flag and, for Polyspace, refusing to combine with anything else), then
//! every input blob handed to [`PluginRegistry::feed`] is dispatched to each active checker in
//! turn — sequentially, never in parallel, so two checkers never race over the shared
//! [`FingerprintRegistry`].

use crate::checkers::coverity::CoverityChecker;
use crate::checkers::doxygen::DoxygenChecker;
use crate::checkers::polyspace::PolyspaceChecker;
use crate::checkers::regex_checker::RegexChecker;
use crate::checkers::robot::RobotChecker;
use crate::checkers::sphinx::SphinxChecker;
use crate::checkers::xmlrunner::XmlRunnerChecker;
use crate::checkers::Checker;
use crate::config::FileConfig;
use crate::error::WarningsError;
use crate::finding::CodeQualityEntry;
use crate::fingerprint::FingerprintRegistry;
use std::path::Path;

pub struct PluginRegistry {
    checkers: Vec<Box<dyn Checker>>,
    fingerprints: FingerprintRegistry,
}

impl PluginRegistry {
    /// Builds the active checker set from a parsed configuration file.
    pub fn from_file_config(cfg: &FileConfig) -> Result<Self, WarningsError> {
        let polyspace_active = cfg.polyspace.as_ref().is_some_and(|s| s.enabled);
        let any_other_active = cfg.sphinx.as_ref().is_some_and(|s| s.enabled)
            || cfg.doxygen.as_ref().is_some_and(|s| s.enabled)
            || cfg.xmlrunner.as_ref().is_some_and(|s| s.enabled)
            || cfg.regex.as_ref().is_some_and(|s| s.enabled)
            || cfg.coverity.as_ref().is_some_and(|s| s.enabled)
            || cfg.robot.as_ref().is_some_and(|s| s.enabled);

        if polyspace_active && any_other_active {
            return Err(WarningsError::polyspace_exclusive());
        }

        let mut checkers: Vec<Box<dyn Checker>> = Vec::new();

        if polyspace_active {
            let section = cfg.polyspace.as_ref().expect("checked above");
            checkers.push(Box::new(PolyspaceChecker::from_section(section)?));
            return Ok(PluginRegistry {
                checkers,
                fingerprints: FingerprintRegistry::new(),
            });
        }

        if let Some(section) = &cfg.sphinx {
            if section.enabled {
                checkers.push(Box::new(SphinxChecker::from_raw_config(section)?));
            }
        }
        if let Some(section) = &cfg.doxygen {
            if section.enabled {
                checkers.push(Box::new(DoxygenChecker::from_raw_config(section)?));
            }
        }
        if let Some(section) = &cfg.xmlrunner {
            if section.enabled {
                checkers.push(Box::new(XmlRunnerChecker::from_raw_config(section)?));
            }
        }
        if let Some(section) = &cfg.regex {
            if section.enabled {
                checkers.push(Box::new(RegexChecker::from_raw_config(section)?));
            }
        }
        if let Some(section) = &cfg.coverity {
            if section.enabled {
                checkers.push(Box::new(CoverityChecker::from_section(section)?));
            }
        }
        if let Some(section) = &cfg.robot {
            if section.enabled {
                checkers.push(Box::new(RobotChecker::from_section(section)?));
            }
        }

        Ok(PluginRegistry {
            checkers,
            fingerprints: FingerprintRegistry::new(),
        })
    }

    /// True when no checker is active; the driver treats this as a configuration error.
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Feeds one input blob to every active checker, in registration order.
    pub fn feed(&mut self, content: &str, source: &str) -> Result<(), WarningsError> {
        let PluginRegistry { checkers, fingerprints } = self;
        for checker in checkers.iter_mut() {
            checker.check(content, source, fingerprints)?;
        }
        Ok(())
    }

    /// Evaluates every checker's accumulated findings, logs their summary lines, and returns
    /// the run's overall exit code — the sum of every checker's own contribution, with one
    /// final unconditional "Returning error code" line.
    pub fn finish(&self) -> Result<i64, WarningsError> {
        let mut total = 0;
        for checker in &self.checkers {
            total += checker.return_check_limits()?;
        }
        tracing::warn!("Returning error code {total}.");
        Ok(total)
    }

    /// Renders every checker's findings into GitLab Code Quality entries, sorted by
    /// `(path, line, fingerprint)`.
    pub fn code_quality_report(&self, base_dir: &Path) -> Result<Vec<CodeQualityEntry>, WarningsError> {
        let mut entries = Vec::new();
        for checker in &self.checkers {
            let template = checker.cq_description_template();
            for finding in checker.findings() {
                entries.push(finding.to_code_quality_entry(base_dir, template)?);
            }
        }
        entries.sort_by(|a, b| {
            (&a.location.path, a.location.positions.begin.line, &a.fingerprint).cmp(&(
                &b.location.path,
                b.location.positions.begin.line,
                &b.fingerprint,
            ))
        });
        Ok(entries)
    }

    pub fn active_checker_names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoveritySection, RawCheckerConfig};

    #[test]
    fn polyspace_rejects_combination_with_other_checkers() {
        let cfg = FileConfig {
            sphinx: Some(RawCheckerConfig::from_cli(0, 0, vec![], vec![])),
            polyspace: Some(crate::config::PolyspaceSection {
                enabled: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(PluginRegistry::from_file_config(&cfg).is_err());
    }

    #[test]
    fn disabled_sections_are_not_activated() {
        let mut sphinx = RawCheckerConfig::from_cli(0, 0, vec![], vec![]);
        sphinx.enabled = false;
        let cfg = FileConfig {
            sphinx: Some(sphinx),
            ..Default::default()
        };
        let registry = PluginRegistry::from_file_config(&cfg).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn empty_config_activates_nothing() {
        let cfg = FileConfig::default();
        let registry = PluginRegistry::from_file_config(&cfg).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn feed_dispatches_to_every_active_checker() {
        let cfg = FileConfig {
            sphinx: Some(RawCheckerConfig::from_cli(0, 0, vec![], vec![])),
            coverity: Some(CoveritySection::default()),
            ..Default::default()
        };
        let mut registry = PluginRegistry::from_file_config(&cfg).unwrap();
        registry
            .feed("docs/index.rst:1: WARNING: oops\n", "sphinx.log")
            .unwrap();
        assert_eq!(registry.active_checker_names().len(), 2);
    }
}
