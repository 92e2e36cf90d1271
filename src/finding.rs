//! Core data types for diagnostic findings and their Code-Quality rendering.
//!
//! - [`Finding`] — one diagnostic record produced by a checker.
//! - [`Severity`] — classification used both in findings and in the CQ report.
//! - [`CodeQualityEntry`] — the GitLab-style report entry a [`Finding`] renders into.

use crate::error::WarningsError;
use crate::template;
use std::fmt;
use std::path::Path;

/// Severity level for a diagnostic finding.
///
/// Serializes to lowercase strings (`"info"`, `"minor"`, `"major"`, `"critical"`, `"blocker"`),
/// matching the GitLab Code Quality severity vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Minor => write!(f, "minor"),
            Severity::Major => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
            Severity::Blocker => write!(f, "blocker"),
        }
    }
}

/// A single diagnostic record produced by a checker.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Finding {
    /// Path to the source file; relative to a base directory when one is known.
    pub path: String,
    /// 1-based line number, or `0` when the producer did not report one.
    pub line: u32,
    /// 1-based column number, when known.
    pub column: Option<u32>,
    pub severity: Severity,
    /// Rule identifier or, for Coverity, the CID.
    pub check_name: String,
    /// Message body; may be multi-line.
    pub description: String,
    /// Classification label, set only by the Coverity and Polyspace checkers.
    pub classification: Option<String>,
    /// 16-hex-digit fingerprint, stable across runs for identical
    /// `(path, line, check_name, description)`.
    pub fingerprint: String,
}

impl Finding {
    /// Builds a new Finding, deriving its fingerprint from the given registry.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: impl Into<String>,
        line: u32,
        column: Option<u32>,
        severity: Severity,
        check_name: impl Into<String>,
        description: impl Into<String>,
        classification: Option<String>,
        fingerprints: &mut crate::fingerprint::FingerprintRegistry,
    ) -> Self {
        let path = path.into();
        let check_name = check_name.into();
        let description = description.into();
        let fingerprint = fingerprints.register(&path, line, &check_name, &description);
        Finding {
            path,
            line,
            column,
            severity,
            check_name,
            description,
            classification,
            fingerprint,
        }
    }

    /// Renders this Finding into a [`CodeQualityEntry`], relativizing its path against
    /// `base_dir` and rendering `description_template` against the Finding's own description.
    ///
    /// Fails with [`WarningsError::Report`] when the path is absolute and cannot be expressed
    /// relative to `base_dir`.
    pub fn to_code_quality_entry(
        &self,
        base_dir: &Path,
        description_template: &str,
    ) -> Result<CodeQualityEntry, WarningsError> {
        let source = Path::new(&self.path);
        let relative = if source.is_absolute() {
            source
                .strip_prefix(base_dir)
                .map_err(|_| {
                    WarningsError::Report(format!(
                        "Failed to convert absolute path to relative path for Code Quality report: {}",
                        self.path
                    ))
                })?
                .to_string_lossy()
                .to_string()
        } else {
            self.path.clone()
        };

        Ok(CodeQualityEntry {
            description: template::render_description(description_template, &self.description),
            check_name: self.check_name.clone(),
            fingerprint: self.fingerprint.clone(),
            severity: self.severity,
            location: CqLocation {
                path: relative,
                positions: CqPositions {
                    begin: CqBegin { line: self.line },
                },
            },
        })
    }
}

/// One entry in the GitLab-style Code Quality JSON report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CodeQualityEntry {
    pub description: String,
    pub check_name: String,
    pub fingerprint: String,
    pub severity: Severity,
    pub location: CqLocation,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CqLocation {
    pub path: String,
    pub positions: CqPositions,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CqPositions {
    pub begin: CqBegin,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CqBegin {
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintRegistry;

    #[test]
    fn relativizes_absolute_path_against_base_dir() {
        let mut registry = FingerprintRegistry::new();
        let finding = Finding::new(
            "/repo/src/lib.rs",
            12,
            None,
            Severity::Major,
            "doxygen",
            "bad doc comment",
            None,
            &mut registry,
        );
        let entry = finding
            .to_code_quality_entry(Path::new("/repo"), "$description")
            .unwrap();
        assert_eq!(entry.location.path, "src/lib.rs");
        assert_eq!(entry.description, "bad doc comment");
    }

    #[test]
    fn absolute_path_outside_base_dir_is_a_report_error() {
        let mut registry = FingerprintRegistry::new();
        let finding = Finding::new(
            "/other/src/lib.rs",
            12,
            None,
            Severity::Major,
            "doxygen",
            "bad doc comment",
            None,
            &mut registry,
        );
        let err = finding
            .to_code_quality_entry(Path::new("/repo"), "$description")
            .unwrap_err();
        assert!(matches!(err, WarningsError::Report(_)));
    }
}
