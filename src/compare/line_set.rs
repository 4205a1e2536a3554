//! Unordered line-set comparison, for stages whose diagnostics may come out
//! in any order.

use std::collections::BTreeSet;

use super::normalize_text;
use crate::executor::ExecutionOutcome;
use crate::verdict::Failure;

/// Compares the sets of distinct stdout lines. Exit status is not consulted.
pub fn compare(expected: &str, outcome: &ExecutionOutcome) -> Result<(), Failure> {
    let expected = normalize_text(expected);
    let actual = normalize_text(&outcome.stdout);
    // Leading blank lines are insignificant too; interior ones still count.
    let expected_lines: BTreeSet<&str> = expected.trim_start().lines().collect();
    let actual_lines: BTreeSet<&str> = actual.trim_start().lines().collect();

    if expected_lines == actual_lines {
        return Ok(());
    }
    Err(Failure::LineSetMismatch {
        missing: expected_lines
            .difference(&actual_lines)
            .map(|line| line.to_string())
            .collect(),
        unexpected: actual_lines
            .difference(&expected_lines)
            .map(|line| line.to_string())
            .collect(),
    })
}
