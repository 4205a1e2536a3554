//! Exact-text comparison.

use super::{line_diff, normalize_text, require_success};
use crate::executor::ExecutionOutcome;
use crate::verdict::Failure;

/// A non-zero exit fails outright; otherwise stdout must equal the expectation
/// after trailing-whitespace normalization.
pub fn compare(expected: &str, outcome: &ExecutionOutcome) -> Result<(), Failure> {
    require_success(outcome)?;

    let expected = normalize_text(expected);
    let actual = normalize_text(&outcome.stdout);
    if expected == actual {
        return Ok(());
    }
    Err(Failure::OutputMismatch {
        diff: line_diff(&expected, &actual),
    })
}
