//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;
use sitegate_core::config::{CliOverrides, RunFlags};

#[derive(Debug, Parser)]
#[command(name = "sitegate", version)]
#[command(about = "Layered site diagnostics and pre-deploy validation")]
#[command(
    after_help = "Exit codes: 0 clean, 1 critical or warning budget exceeded, 2 high findings, \
                  3 invalid configuration, 4 target unreachable, 5 fact sheet missing"
)]
pub struct Cli {
    /// Site root: a directory, a single page file, or an http(s) base URL.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Strict mode: any critical finding or too many warnings blocks the deploy.
    #[arg(long)]
    pub pre_deploy: bool,

    /// Print a single status line.
    #[arg(long)]
    pub quiet: bool,

    /// Print aggregate counts only.
    #[arg(long)]
    pub summary: bool,

    /// Report only critical findings; high findings do not fail the run.
    #[arg(long)]
    pub critical_only: bool,

    /// Skip the link integrity layer.
    #[arg(long)]
    pub no_links: bool,

    /// Skip the fact consistency layer.
    #[arg(long)]
    pub no_facts: bool,

    /// Do not probe links that leave the site.
    #[arg(long)]
    pub no_external: bool,

    /// Reference fact sheet to check figures against.
    #[arg(long, value_name = "PATH")]
    pub fact_sheet: Option<PathBuf>,

    /// Warning budget for --pre-deploy.
    #[arg(long, value_name = "N")]
    pub max_warnings: Option<usize>,

    /// Wall-clock budget for the whole run, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Size of the link-check pool.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Upper bound on pages fetched.
    #[arg(long, value_name = "N")]
    pub max_pages: Option<usize>,

    /// Report format: text or json.
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: String,

    /// Also write the full report to this file.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Project config file; defaults to sitegate.toml in the working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Values that override every config file and environment variable.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            timeout_secs: self.timeout,
            max_warnings: self.max_warnings,
            workers: self.workers,
            max_pages: self.max_pages,
            check_external: self.no_external.then_some(false),
            fact_sheet: self.fact_sheet.clone(),
        }
    }

    pub fn flags(&self) -> RunFlags {
        RunFlags {
            target: self.target.clone(),
            pre_deploy: self.pre_deploy,
            quiet: self.quiet,
            summary: self.summary,
            critical_only: self.critical_only,
            no_links: self.no_links,
            no_facts: self.no_facts,
        }
    }
}
