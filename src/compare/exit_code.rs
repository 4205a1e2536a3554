//! Exit-code-only comparison for the parser stages.

use crate::executor::ExecutionOutcome;
use crate::verdict::Failure;

/// Human-readable category for a stage exit code.
pub fn exit_code_category(code: i32) -> &'static str {
    match code {
        0 => "OK",
        1 => "LEXICAL ERROR",
        2 => "SYNTAX ERROR",
        99 => "INTERNAL ERROR",
        _ => "UNKNOWN ERROR",
    }
}

/// Reads the single integer held by an exit-code expectation artifact.
pub fn parse_expected_code(text: &str) -> Result<i32, Failure> {
    let trimmed = text.trim();
    trimmed
        .parse::<i32>()
        .map_err(|_| Failure::MalformedExpectation {
            content: trimmed.to_string(),
        })
}

/// Compares only the exit status; stdout is ignored.
pub fn compare(expected: &str, outcome: &ExecutionOutcome) -> Result<(), Failure> {
    let expected = parse_expected_code(expected)?;
    if expected == outcome.exit_code {
        return Ok(());
    }
    Err(Failure::ExitCodeMismatch {
        expected,
        actual: outcome.exit_code,
    })
}
