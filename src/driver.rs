//! End-to-end run orchestration: resolve configuration, acquire input, feed the registry, and
//! report the outcome.
//!
//! Mirrors the shape of the teacher's `audit::run_audit`, minus the parallel dispatch — checker
//! execution here is intentionally sequential (see SPEC_FULL.md §5).

use crate::cli::Cli;
use crate::config::{
    self, ClassificationLimits, ConfigValue, CoveritySection, FileConfig, RawCheckerConfig, RobotSection,
    SuiteConfig,
};
use crate::error::WarningsError;
use crate::registry::PluginRegistry;
use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Outcome of a complete run, used by `main.rs` to pick an exit code and print a summary.
pub struct RunOutcome {
    pub exit_code: i64,
    pub active_checkers: Vec<&'static str>,
}

/// Runs one full scan-and-gate cycle for the given CLI invocation.
pub fn run(cli: &Cli) -> Result<RunOutcome, WarningsError> {
    let file_config = resolve_config(cli)?;
    let mut registry = PluginRegistry::from_file_config(&file_config)?;
    if registry.is_empty() {
        return Err(WarningsError::Config(
            "No checker is active; pass --config or one of --sphinx/--doxygen/--junit/--coverity/--robot/--regex"
                .to_string(),
        ));
    }

    let input_errors = if let Some(command) = &cli.command {
        feed_command_output(&mut registry, command, cli.ignore_retval)?;
        0
    } else {
        feed_logfiles(&mut registry, &cli.logfile)?
    };

    let exit_code = registry.finish()? + input_errors;

    if let Some(output_path) = &cli.output {
        write_code_quality_report(&registry, output_path, cli.base_dir.as_deref())?;
    }

    Ok(RunOutcome {
        exit_code,
        active_checkers: registry.active_checker_names(),
    })
}

fn resolve_config(cli: &Cli) -> Result<FileConfig, WarningsError> {
    if let Some(path) = &cli.config {
        return config::load_config_file(path);
    }

    let mut file_config = FileConfig::default();
    let exclude = cli.exclude.clone();
    let include = cli.include.clone();
    let (min, max) = match cli.exact_warnings {
        Some(exact) => (exact, exact),
        None => (cli.minwarnings, cli.maxwarnings),
    };

    if cli.sphinx {
        let mut cfg = RawCheckerConfig::from_cli(min, max, exclude.clone(), include.clone());
        cfg.include_sphinx_deprecation = Some(cli.include_sphinx_deprecation);
        file_config.sphinx = Some(cfg);
    }
    if cli.doxygen {
        file_config.doxygen = Some(RawCheckerConfig::from_cli(min, max, exclude.clone(), include.clone()));
    }
    if cli.junit {
        file_config.xmlrunner = Some(RawCheckerConfig::from_cli(min, max, exclude.clone(), include.clone()));
    }
    if let Some(pattern) = &cli.regex {
        let mut cfg = RawCheckerConfig::from_cli(min, max, exclude.clone(), include.clone());
        cfg.pattern = Some(pattern.clone());
        file_config.regex = Some(cfg);
    }
    if cli.coverity {
        let mut classification = HashMap::new();
        for name in ["Unclassified", "Pending", "Bug", "Intentional", "False Positive"] {
            classification.insert(
                name.to_string(),
                ClassificationLimits {
                    min: ConfigValue::Int(min),
                    max: ConfigValue::Int(max),
                },
            );
        }
        file_config.coverity = Some(CoveritySection {
            enabled: true,
            classification,
            exclude: exclude.clone(),
            include: include.clone(),
            cq_default_path: None,
            cq_description_template: None,
        });
    }
    if cli.robot {
        file_config.robot = Some(RobotSection {
            enabled: true,
            suites: vec![SuiteConfig {
                name: cli.name.clone().unwrap_or_default(),
                min: ConfigValue::Int(min),
                max: ConfigValue::Int(max),
            }],
            cq_default_path: None,
            cq_description_template: None,
        });
    }

    Ok(file_config)
}

/// Feeds every matched logfile to the registry, tolerating unreadable files individually: a
/// missing or unreadable one is logged and contributes `1` to the returned count rather than
/// aborting the rest of the run.
fn feed_logfiles(registry: &mut PluginRegistry, patterns: &[String]) -> Result<i64, WarningsError> {
    if patterns.is_empty() {
        return Err(WarningsError::Input(
            "No logfile given and no --command specified".to_string(),
        ));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|e| WarningsError::Input(format!("Invalid glob pattern '{pattern}': {e}")))?
            .filter_map(|r| r.ok())
            .collect();
        if matches.is_empty() {
            paths.push(PathBuf::from(pattern));
        } else {
            paths.extend(matches);
        }
    }
    paths.sort();

    let mut input_errors = 0;
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(content) => registry.feed(&content, &path.to_string_lossy())?,
            Err(e) => {
                tracing::warn!(checker = "input", "Failed to read {}: {}", path.display(), e);
                input_errors += 1;
            }
        }
    }
    Ok(input_errors)
}

fn feed_command_output(
    registry: &mut PluginRegistry,
    command: &str,
    ignore_retval: bool,
) -> Result<(), WarningsError> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(WarningsError::Config(
            "--command must name a program to run".to_string(),
        ));
    };

    let output = Command::new(program)
        .args(parts)
        .output()
        .map_err(|e| WarningsError::Subprocess(format!("Failed to run '{command}': {e}")))?;

    if !output.status.success() && !ignore_retval {
        return Err(WarningsError::Subprocess(format!(
            "Command '{command}' exited with status {}",
            output.status
        )));
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    registry.feed(&combined, command)
}

fn write_code_quality_report(
    registry: &PluginRegistry,
    output_path: &Path,
    base_dir: Option<&Path>,
) -> Result<(), WarningsError> {
    let cwd = std::env::current_dir()
        .map_err(|e| WarningsError::Report(format!("Failed to resolve working directory: {e}")))?;
    let base_dir = base_dir.unwrap_or(&cwd);

    let entries = registry.code_quality_report(base_dir)?;
    let json = serde_json::to_string_pretty(&entries)
        .map_err(|e| WarningsError::Report(format!("Failed to serialize Code Quality report: {e}")))?;

    let mut file = std::fs::File::create(output_path)
        .map_err(|e| WarningsError::Report(format!("Failed to write {}: {}", output_path.display(), e)))?;
    file.write_all(json.as_bytes())
        .map_err(|e| WarningsError::Report(format!("Failed to write {}: {}", output_path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            logfile: vec![],
            command: None,
            ignore_retval: false,
            config: None,
            output: None,
            base_dir: None,
            sphinx: false,
            doxygen: false,
            junit: false,
            coverity: false,
            robot: false,
            name: None,
            regex: None,
            include_sphinx_deprecation: false,
            minwarnings: 0,
            maxwarnings: 0,
            exact_warnings: None,
            include: vec![],
            exclude: vec![],
            verbose: 0,
        }
    }

    #[test]
    fn no_checker_active_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("build.log");
        std::fs::write(&log, "nothing interesting\n").unwrap();
        let mut cli = base_cli();
        cli.logfile = vec![log.to_string_lossy().into_owned()];
        assert!(run(&cli).is_err());
    }

    #[test]
    fn flag_activated_sphinx_scans_logfile() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("sphinx.log");
        std::fs::write(&log, "docs/index.rst:3: WARNING: broken reference\n").unwrap();
        let mut cli = base_cli();
        cli.sphinx = true;
        cli.logfile = vec![log.to_string_lossy().into_owned()];
        let outcome = run(&cli).unwrap();
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.active_checkers, vec!["sphinx"]);
    }

    #[test]
    fn missing_logfile_and_command_is_an_error() {
        let mut cli = base_cli();
        cli.sphinx = true;
        assert!(run(&cli).is_err());
    }

    #[test]
    fn flag_activated_coverity_covers_every_classification() {
        let mut cli = base_cli();
        cli.coverity = true;
        let cfg = resolve_config(&cli).unwrap();
        assert_eq!(cfg.coverity.unwrap().classification.len(), 5);
    }

    #[test]
    fn flag_activated_robot_restricts_to_named_suite() {
        let mut cli = base_cli();
        cli.robot = true;
        cli.name = Some("Login Tests".to_string());
        let cfg = resolve_config(&cli).unwrap();
        let robot = cfg.robot.unwrap();
        assert_eq!(robot.suites.len(), 1);
        assert_eq!(robot.suites[0].name, "Login Tests");
    }

    #[test]
    fn missing_logfile_among_several_contributes_one_and_others_still_process() {
        let dir = tempfile::tempdir().unwrap();
        let ok_log = dir.path().join("ok.log");
        std::fs::write(&ok_log, "docs/index.rst:3: WARNING: broken reference\n").unwrap();
        let missing_log = dir.path().join("missing.log");

        let mut cli = base_cli();
        cli.sphinx = true;
        cli.logfile = vec![
            ok_log.to_string_lossy().into_owned(),
            missing_log.to_string_lossy().into_owned(),
        ];
        let outcome = run(&cli).unwrap();
        assert_eq!(outcome.exit_code, 2);
    }

    #[test]
    fn exact_warnings_sets_min_and_max_together() {
        let mut cli = base_cli();
        cli.sphinx = true;
        cli.exact_warnings = Some(3);
        let cfg = resolve_config(&cli).unwrap();
        let sphinx = cfg.sphinx.unwrap();
        assert_eq!(sphinx.min.unwrap().resolve("min").unwrap(), 3);
        assert_eq!(sphinx.max.unwrap().resolve("max").unwrap(), 3);
    }
}
