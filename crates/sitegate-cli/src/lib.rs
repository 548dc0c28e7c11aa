//! The `sitegate` command.
//!
//! Parses flags, resolves configuration, drives one orchestrated run,
//! prints the report and maps the outcome to the process exit code. Fatal
//! errors are printed as `sitegate: [CODE] message` on stderr.

#![forbid(unsafe_code)]

mod args;

use std::ffi::OsString;
use std::path::Path;

use clap::error::ErrorKind;
use clap::Parser;
use sitegate_analysis::reporters::{self, ReportView, Reporter};
use sitegate_analysis::{Orchestrator, RunResult};
use sitegate_core::config::{RunConfiguration, SiteGateConfig};
use sitegate_core::errors::{ConfigError, ErrorCode, ReportError, SiteGateError};
use sitegate_core::types::{ExitStatus, RunMode};

pub use args::Cli;

/// Run the command over `args` (program name first) and return the exit code.
pub fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return ExitStatus::Clean.code();
            }
            _ => {
                let err: SiteGateError = ConfigError::InvalidArguments(clap_message(&err)).into();
                return fail(&err);
            }
        },
    };

    match execute(&cli) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn execute(cli: &Cli) -> Result<i32, SiteGateError> {
    let cwd = std::env::current_dir().map_err(|e| {
        ConfigError::InvalidArguments(format!("cannot read the working directory: {e}"))
    })?;
    let settings = SiteGateConfig::load(cli.config.as_deref(), &cwd, Some(&cli.overrides()))?;
    let config = RunConfiguration::from_flags(cli.flags(), settings)?;
    let reporter = reporters::create_reporter(&cli.format).ok_or_else(|| {
        tracing::debug!(formats = ?reporters::available_formats(), "unknown report format");
        ReportError::UnknownFormat(cli.format.clone())
    })?;

    let mut orchestrator = Orchestrator::new(config);
    let result = orchestrator.run()?;
    emit(&result, reporter.as_ref(), cli.output.as_deref())?;
    orchestrator.mark_reported();

    tracing::info!(exit = result.exit_code(), status = %result.exit_status, "run finished");
    Ok(result.exit_code())
}

/// Print the report for the run mode and optionally write the full report to a file.
fn emit(result: &RunResult, reporter: &dyn Reporter, output: Option<&Path>) -> Result<(), ReportError> {
    if let Some(path) = output {
        let full = reporter.generate(result, ReportView::Full)?;
        std::fs::write(path, full).map_err(|source| ReportError::Write {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "report written");
    }

    if result.mode == RunMode::Quiet {
        println!("{}", reporters::status_line(result));
        return Ok(());
    }
    let body = reporter.generate(result, ReportView::for_mode(result.mode))?;
    if body.ends_with('\n') {
        print!("{body}");
    } else {
        println!("{body}");
    }
    Ok(())
}

fn fail(err: &SiteGateError) -> i32 {
    let message = err.to_string();
    let line = message.split_whitespace().collect::<Vec<_>>().join(" ");
    eprintln!("sitegate: [{}] {line}", err.error_code());
    err.exit_status().code()
}

/// First line of a clap error without its `error:` prefix.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("invalid arguments");
    first.strip_prefix("error:").unwrap_or(first).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_errors_collapse_to_one_line() {
        let err = Cli::try_parse_from(["sitegate", "--bogus"]).unwrap_err();
        let message = clap_message(&err);
        assert!(message.contains("--bogus"), "{message}");
        assert!(!message.contains('\n'));
        assert!(!message.starts_with("error"));
    }

    #[test]
    fn usage_errors_exit_three() {
        assert_eq!(run(["sitegate", "--bogus"]), 3);
        assert_eq!(run(["sitegate", "site", "--timeout", "soon"]), 3);
    }

    #[test]
    fn help_and_version_exit_zero() {
        assert_eq!(run(["sitegate", "--help"]), 0);
        assert_eq!(run(["sitegate", "--version"]), 0);
    }
}
