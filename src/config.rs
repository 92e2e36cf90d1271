//! Configuration file loading.
//!
//! The configuration file (YAML or JSON, see SPEC_FULL.md §6) is a top-level object keyed by
//! checker name. [`load_config_file`] resolves the format from the file extension, falling
//! back to try-JSON-then-YAML for anything else — the same "try a concrete thing, then fall
//! back" shape as the teacher's `Config::load`.
//!
//! `min`/`max` values may be a literal integer or an environment-variable-templated string
//! (see [`ConfigValue::resolve`]); every other string field in a checker's section undergoes
//! the same substitution inside that checker's `parse_config` (not here — this module only
//! parses structure, checkers own their own `parse_config` per SPEC_FULL.md §4.1).

use crate::error::WarningsError;
use crate::template;
use std::collections::HashMap;
use std::path::Path;

/// Either a literal integer or a string requiring environment-variable substitution before
/// it can be parsed as one.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i64),
    Str(String),
}

impl ConfigValue {
    /// Resolves this value to an integer, substituting environment variables first when it
    /// is a string.
    pub fn resolve(&self, key_context: &str) -> Result<i64, WarningsError> {
        match self {
            ConfigValue::Int(v) => Ok(*v),
            ConfigValue::Str(s) => {
                let resolved = template::substitute(s, key_context, &[])?;
                resolved.trim().parse::<i64>().map_err(|_| {
                    WarningsError::Config(format!(
                        "Invalid integer value for '{key_context}': '{resolved}'"
                    ))
                })
            }
        }
    }
}

/// Raw, pre-substitution configuration for one of the simple checkers (Sphinx, Doxygen,
/// XmlRunner, generic regex) or the common fields shared by the aggregating checkers.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct RawCheckerConfig {
    pub enabled: bool,
    pub min: Option<ConfigValue>,
    pub max: Option<ConfigValue>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub cq_default_path: Option<String>,
    pub cq_description_template: Option<String>,
    pub include_sphinx_deprecation: Option<bool>,
    /// Generic-regex checker's pattern (`-r/--regex` / `"pattern"` in config).
    pub pattern: Option<String>,
}

impl Default for RawCheckerConfig {
    fn default() -> Self {
        RawCheckerConfig {
            enabled: true,
            min: None,
            max: None,
            exclude: Vec::new(),
            include: Vec::new(),
            cq_default_path: None,
            cq_description_template: None,
            include_sphinx_deprecation: None,
            pattern: None,
        }
    }
}

impl RawCheckerConfig {
    /// Builds a section directly from CLI-level flags (bypassing the config file).
    pub fn from_cli(min: i64, max: i64, exclude: Vec<String>, include: Vec<String>) -> Self {
        RawCheckerConfig {
            min: Some(ConfigValue::Int(min)),
            max: Some(ConfigValue::Int(max)),
            exclude,
            include,
            ..Default::default()
        }
    }
}

/// Per-classification `min`/`max` bound for the Coverity checker.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ClassificationLimits {
    pub min: ConfigValue,
    pub max: ConfigValue,
}

/// Coverity's configuration section: per-classification limits plus the common fields.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct CoveritySection {
    pub enabled: bool,
    pub classification: HashMap<String, ClassificationLimits>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub cq_default_path: Option<String>,
    pub cq_description_template: Option<String>,
}

impl Default for CoveritySection {
    fn default() -> Self {
        CoveritySection {
            enabled: true,
            classification: HashMap::new(),
            exclude: Vec::new(),
            include: Vec::new(),
            cq_default_path: None,
            cq_description_template: None,
        }
    }
}

/// One configured Robot suite bound.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SuiteConfig {
    /// Suite name; empty string means "all suites".
    #[serde(default)]
    pub name: String,
    pub min: ConfigValue,
    pub max: ConfigValue,
}

/// Robot's configuration section.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct RobotSection {
    pub enabled: bool,
    pub suites: Vec<SuiteConfig>,
    pub cq_default_path: Option<String>,
    pub cq_description_template: Option<String>,
}

impl Default for RobotSection {
    fn default() -> Self {
        RobotSection {
            enabled: true,
            suites: Vec::new(),
            cq_default_path: None,
            cq_description_template: None,
        }
    }
}

/// Action taken when a Polyspace (family, color) pair's limits are exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolyspaceAction {
    Warn,
    Fail,
}

/// One configured (family, color) pair for the Polyspace checker.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PolyspaceCheckConfig {
    pub family: String,
    pub color: String,
    pub min: ConfigValue,
    pub max: ConfigValue,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub include: Vec<String>,
    pub action: PolyspaceAction,
}

/// Polyspace's configuration section.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct PolyspaceSection {
    pub enabled: bool,
    pub checks: Vec<PolyspaceCheckConfig>,
    pub cq_default_path: Option<String>,
    pub cq_description_template: Option<String>,
}

impl Default for PolyspaceSection {
    fn default() -> Self {
        PolyspaceSection {
            enabled: true,
            checks: Vec::new(),
            cq_default_path: None,
            cq_description_template: None,
        }
    }
}

/// Top-level shape of the YAML/JSON configuration file (SPEC_FULL.md §6).
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub sphinx: Option<RawCheckerConfig>,
    pub doxygen: Option<RawCheckerConfig>,
    pub xmlrunner: Option<RawCheckerConfig>,
    pub regex: Option<RawCheckerConfig>,
    pub coverity: Option<CoveritySection>,
    pub polyspace: Option<PolyspaceSection>,
    pub robot: Option<RobotSection>,
}

/// Loads and parses a configuration file, detecting YAML vs. JSON by extension and falling
/// back to try-JSON-then-YAML for anything else.
pub fn load_config_file(path: &Path) -> Result<FileConfig, WarningsError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| WarningsError::Input(format!("Failed to read config {}: {}", path.display(), e)))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "json" => serde_json::from_str(&content)
            .map_err(|e| WarningsError::Config(format!("Failed to parse config {}: {}", path.display(), e)))?,
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .map_err(|e| WarningsError::Config(format!("Failed to parse config {}: {}", path.display(), e)))?,
        _ => serde_json::from_str(&content).or_else(|_| serde_yaml::from_str(&content)).map_err(|e| {
            WarningsError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?,
    };

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_literal_integer() {
        let v = ConfigValue::Int(7);
        assert_eq!(v.resolve("min").unwrap(), 7);
    }

    #[test]
    fn resolves_templated_string() {
        std::env::set_var("WG_CFG_TEST", "3");
        let v = ConfigValue::Str("$WG_CFG_TEST".to_string());
        assert_eq!(v.resolve("min").unwrap(), 3);
        std::env::remove_var("WG_CFG_TEST");
    }

    #[test]
    fn parses_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warngate.json");
        std::fs::write(
            &path,
            r#"{"sphinx": {"min": 0, "max": 0}, "coverity": {"classification": {"Bug": {"min": 0, "max": 1}}}}"#,
        )
        .unwrap();
        let cfg = load_config_file(&path).unwrap();
        assert!(cfg.sphinx.is_some());
        assert!(cfg.coverity.is_some());
        assert_eq!(cfg.coverity.unwrap().classification.len(), 1);
    }

    #[test]
    fn parses_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warngate.yaml");
        std::fs::write(&path, "sphinx:\n  min: 0\n  max: 2\n").unwrap();
        let cfg = load_config_file(&path).unwrap();
        let sphinx = cfg.sphinx.unwrap();
        assert_eq!(sphinx.max.unwrap().resolve("max").unwrap(), 2);
    }
}
