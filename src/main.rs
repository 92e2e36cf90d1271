use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use warngate::cli::Cli;
use warngate::driver;
use warngate::error::WarningsError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match driver::run(&cli) {
        Ok(outcome) => {
            if outcome.exit_code == 0 {
                println!("{}", "All checks passed.".green().bold());
            } else {
                eprintln!(
                    "{}",
                    format!(
                        "{} active checker(s), exit code {}.",
                        outcome.active_checkers.len(),
                        outcome.exit_code
                    )
                    .red()
                    .bold()
                );
            }
            std::process::exit(clamp_exit_code(outcome.exit_code));
        }
        Err(e) => {
            eprintln!("{}", format!("Error: {e}").red().bold());
            std::process::exit(exit_code_for_error(&e));
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn clamp_exit_code(code: i64) -> i32 {
    code.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn exit_code_for_error(error: &WarningsError) -> i32 {
    match error {
        WarningsError::SuiteNotFound(_) => -1,
        _ => 1,
    }
}
