//! The `stagecheck` command-line interface.
//!
//! Parses arguments, resolves the selected suite against the configuration,
//! runs it, and maps the outcome onto the process exit status:
//! `0` when no case failed, `1` when any case failed, `2` for usage errors and
//! run-aborting conditions.

use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use termcolor::ColorChoice;
use tracing::{info, warn};

use crate::config::{HarnessConfig, SuiteConfig};
use crate::diagnostics::{HarnessError, HarnessResult};
use crate::executor::LocalProcess;
use crate::report::Reporter;
use crate::runner::run_suite;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "stagecheck",
    version,
    about = "Runs golden-file conformance suites against compiler stage executables."
)]
pub struct StagecheckArgs {
    /// Suite to run, e.g. `scanner` or `parser-normal`.
    #[arg(required_unless_present = "list")]
    pub suite: Option<String>,

    /// YAML file replacing the built-in suite table.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the fixture root of the selected suite.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Override the subject executable of the selected suite.
    #[arg(long = "exec", value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Number of cases to run concurrently.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<NonZeroUsize>,

    /// Per-case time limit in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<NonZeroU64>,

    /// When to colorize output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// List the configured suites and exit.
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for ColorChoice {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = StagecheckArgs::parse();
    let code = match execute(args) {
        Ok(code) => code,
        Err(HarnessError::UnknownSuite { name, available }) => {
            StagecheckArgs::command()
                .error(
                    ErrorKind::InvalidValue,
                    format!("unknown suite '{name}' (available: {available})"),
                )
                .exit();
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            EXIT_FATAL
        }
    };
    process::exit(code);
}

/// Runs the command described by `args` and returns the exit status.
pub fn execute(args: StagecheckArgs) -> HarnessResult<i32> {
    let config = load_config(&args)?;

    if args.list {
        print_suites(&config);
        return Ok(EXIT_OK);
    }

    let name = args.suite.as_deref().unwrap_or_default();
    let suite = select_suite(&config, name, &args)?;
    let subject = LocalProcess::new(&suite.executable).with_timeout(config.timeout());
    info!(
        suite = %suite.name,
        executable = %suite.executable.display(),
        root = %suite.root.display(),
        jobs = config.jobs,
        "starting run"
    );

    let mut reporter = Reporter::stdout(args.color.into());
    if let Err(e) = reporter.suite_started(&suite.name, suite.strategy.as_str()) {
        warn!(error = %e, "failed to write to stdout");
    }
    let report = run_suite(&suite, &subject, config.jobs, |id, verdict| {
        if let Err(e) = reporter.case_finished(id, verdict) {
            warn!(error = %e, "failed to write to stdout");
        }
    })?;
    if let Err(e) = reporter.summary(&report) {
        warn!(error = %e, "failed to write to stdout");
    }

    let tally = report.tally();
    info!(
        passed = tally.passed,
        failed = tally.failed,
        skipped = tally.skipped,
        "run finished"
    );
    Ok(if report.is_success() {
        EXIT_OK
    } else {
        EXIT_FAILED
    })
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn load_config(args: &StagecheckArgs) -> HarnessResult<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::builtin(),
    };
    if let Some(jobs) = args.jobs {
        config.jobs = jobs.get();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout.get());
    }
    config.validate()?;
    Ok(config)
}

fn select_suite(
    config: &HarnessConfig,
    name: &str,
    args: &StagecheckArgs,
) -> HarnessResult<SuiteConfig> {
    let mut suite = config.suite(name)?.clone();
    if let Some(root) = &args.root {
        suite.root = root.clone();
    }
    if let Some(executable) = &args.executable {
        suite.executable = executable.clone();
    }
    Ok(suite)
}

fn print_suites(config: &HarnessConfig) {
    for suite in &config.suites {
        println!(
            "{:<20} {:<12} {} <- {}",
            suite.name,
            suite.strategy.as_str(),
            suite.executable.display(),
            suite.root.display()
        );
    }
    if let Some(timeout) = config.timeout() {
        println!("\ntimeout: {}s", timeout.as_secs());
    }
}
