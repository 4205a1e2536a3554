//! Run-level error types for the harness.
//!
//! Only conditions that make a whole run meaningless live here: a missing or
//! empty fixture root, a subject executable that cannot be spawned, or a broken
//! configuration. Everything that goes wrong inside a single test case is a
//! [`Failure`](crate::verdict::Failure) carried by that case's verdict instead.
//!
//! Errors are `miette` diagnostics so the CLI can render them with codes and
//! help text.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal, run-aborting conditions.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("fixture root '{}' does not exist or is not a directory", path.display())]
    #[diagnostic(
        code(stagecheck::fixture_root_missing),
        help("point --root (or the suite's `root`) at the directory holding the test<N> folders")
    )]
    FixtureRootMissing { path: PathBuf },

    #[error("fixture root '{}' contains no '{prefix}<N>' case directories", path.display())]
    #[diagnostic(code(stagecheck::fixture_root_empty))]
    FixtureRootEmpty { path: PathBuf, prefix: String },

    #[error("failed to scan fixture root '{}': {message}", path.display())]
    #[diagnostic(code(stagecheck::fixture_scan))]
    FixtureScan { path: PathBuf, message: String },

    #[error("subject executable '{}' could not be spawned: {source}", program.display())]
    #[diagnostic(
        code(stagecheck::subject_spawn),
        help("build the stage executable first or pass its location with --exec")
    )]
    SubjectSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown suite '{name}'")]
    #[diagnostic(code(stagecheck::unknown_suite), help("available suites: {available}"))]
    UnknownSuite { name: String, available: String },

    #[error("failed to read configuration '{}': {source}", path.display())]
    #[diagnostic(code(stagecheck::config_io))]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration '{}': {source}", path.display())]
    #[diagnostic(code(stagecheck::config_parse))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(stagecheck::config_invalid))]
    ConfigInvalid { message: String },

    #[error("a worker thread panicked while running suite '{suite}'")]
    #[diagnostic(code(stagecheck::worker_panic))]
    WorkerPanic { suite: String },
}

impl HarnessError {
    /// Shorthand for [`HarnessError::ConfigInvalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        HarnessError::ConfigInvalid {
            message: message.into(),
        }
    }
}
