//! Per-case verdicts and their diagnostic payloads.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::compare::exit_code::exit_code_category;

/// Identity of a test case, taken from the digits of its directory name.
pub type CaseId = u64;

/// The three-valued outcome of judging one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(Failure),
    Skipped(SkipReason),
}

/// Verdict kind without payload, used for tallies and table rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    Passed,
    Failed,
    Skipped,
}

impl VerdictKind {
    pub fn label(self) -> &'static str {
        match self {
            VerdictKind::Passed => "PASSED",
            VerdictKind::Failed => "FAILED",
            VerdictKind::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Verdict {
    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Passed => VerdictKind::Passed,
            Verdict::Failed(_) => VerdictKind::Failed,
            Verdict::Skipped(_) => VerdictKind::Skipped,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }

    /// Diagnostic text attached to this verdict, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            Verdict::Passed => None,
            Verdict::Failed(failure) => Some(failure.to_string()),
            Verdict::Skipped(reason) => Some(reason.to_string()),
        }
    }
}

/// Why a discovered case was not executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason {
    /// Required artifacts that were absent from the case directory.
    pub missing: Vec<PathBuf>,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .missing
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        write!(f, "missing fixture artifact: {}", names.join(", "))
    }
}

/// Which side of a comparison a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Expected,
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Expected => f.write_str("expected"),
            Side::Actual => f.write_str("actual"),
        }
    }
}

/// Everything that can make a single case fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The subject exited non-zero under a strategy that requires success.
    NonZeroExit { code: i32, stderr: String },
    /// Exact-text mismatch, rendered as a unified line diff.
    OutputMismatch { diff: String },
    /// Line-set mismatch.
    LineSetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// One side of a structural comparison is not well-formed JSON.
    MalformedOutput { side: Side, message: String },
    /// Both sides parsed but differ; diff of the canonical renderings.
    StructuralMismatch { diff: String },
    ExitCodeMismatch { expected: i32, actual: i32 },
    /// The exit-code expectation artifact does not hold an integer.
    MalformedExpectation { content: String },
    TimedOut { after: Duration },
    /// Communicating with the subject failed after it was spawned.
    Execution { message: String },
    /// A fixture artifact existed at discovery but could not be read.
    UnreadableFixture { path: PathBuf, message: String },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::NonZeroExit { code, stderr } => {
                write!(f, "subject exited with non-zero status {code}")?;
                if !stderr.trim().is_empty() {
                    write!(f, "\nstderr:\n{}", stderr.trim_end())?;
                }
                Ok(())
            }
            Failure::OutputMismatch { diff } => {
                write!(f, "output differs from expected\n{diff}")
            }
            Failure::LineSetMismatch {
                missing,
                unexpected,
            } => {
                f.write_str("output lines differ from expected")?;
                for line in missing {
                    write!(f, "\n- {line}")?;
                }
                for line in unexpected {
                    write!(f, "\n+ {line}")?;
                }
                Ok(())
            }
            Failure::MalformedOutput { side, message } => {
                write!(f, "malformed output: {side} output is not valid JSON: {message}")
            }
            Failure::StructuralMismatch { diff } => {
                write!(f, "structured output differs from expected\n{diff}")
            }
            Failure::ExitCodeMismatch { expected, actual } => write!(
                f,
                "expected {} ({expected}), got {} ({actual})",
                exit_code_category(*expected),
                exit_code_category(*actual)
            ),
            Failure::MalformedExpectation { content } => write!(
                f,
                "malformed expectation: expected an integer exit code, found {content:?}"
            ),
            Failure::TimedOut { after } => {
                write!(f, "execution timed out after {}s", after.as_secs_f64())
            }
            Failure::Execution { message } => write!(f, "execution failed: {message}"),
            Failure::UnreadableFixture { path, message } => {
                write!(f, "could not read '{}': {message}", path.display())
            }
        }
    }
}
