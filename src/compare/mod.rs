//! Output comparison strategies.
//!
//! Each suite binds one [`Strategy`]; [`judge`] applies it to a captured
//! [`ExecutionOutcome`] and the golden expectation text and returns exactly one
//! [`Verdict`]. The strategies never see the fixture paths or the process, only
//! text and an exit status.

pub mod exact;
pub mod exit_code;
pub mod line_set;
pub mod structural;

use std::fmt;

use difference::{Changeset, Difference};
use serde::Deserialize;

use crate::executor::ExecutionOutcome;
use crate::verdict::{Failure, Verdict};

/// The comparison rule bound to a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Exit status must be zero, then stdout must match exactly.
    ExactText,
    /// Stdout lines compared as an unordered set.
    LineSet,
    /// Stdout parsed as JSON and compared structurally.
    Structural,
    /// Only the exit status is compared.
    ExitCode,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::ExactText => "exact-text",
            Strategy::LineSet => "line-set",
            Strategy::Structural => "structural",
            Strategy::ExitCode => "exit-code",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Judges one outcome against its golden expectation.
pub fn judge(strategy: Strategy, expected: &str, outcome: &ExecutionOutcome) -> Verdict {
    let result = match strategy {
        Strategy::ExactText => exact::compare(expected, outcome),
        Strategy::LineSet => line_set::compare(expected, outcome),
        Strategy::Structural => structural::compare(expected, outcome),
        Strategy::ExitCode => exit_code::compare(expected, outcome),
    };
    match result {
        Ok(()) => Verdict::Passed,
        Err(failure) => Verdict::Failed(failure),
    }
}

/// Fails with [`Failure::NonZeroExit`] unless the subject exited with zero.
pub(crate) fn require_success(outcome: &ExecutionOutcome) -> Result<(), Failure> {
    if outcome.exit_code == 0 {
        return Ok(());
    }
    Err(Failure::NonZeroExit {
        code: outcome.exit_code,
        stderr: outcome.stderr.clone(),
    })
}

/// Normalizes text for the text-based strategies: CRLF becomes LF and
/// trailing whitespace at the end of the stream is dropped.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}

/// Unchanged lines kept around each change in a rendered diff.
const DIFF_CONTEXT: usize = 3;

/// Renders a unified line-level diff from `expected` to `actual`, with
/// `@@` hunks holding [`DIFF_CONTEXT`] lines of context on each side.
pub fn line_diff(expected: &str, actual: &str) -> String {
    let lines = diff_lines(expected, actual);
    let mut out = String::from("--- expected\n+++ actual");

    for (start, end) in hunks(&lines) {
        let before = &lines[..start];
        let body = &lines[start..end];
        let old_start = before.iter().filter(|(tag, _)| *tag != '+').count() + 1;
        let new_start = before.iter().filter(|(tag, _)| *tag != '-').count() + 1;
        let old_len = body.iter().filter(|(tag, _)| *tag != '+').count();
        let new_len = body.iter().filter(|(tag, _)| *tag != '-').count();
        out.push_str(&format!(
            "\n@@ -{} +{} @@",
            hunk_range(old_start, old_len),
            hunk_range(new_start, new_len)
        ));
        for (tag, line) in body {
            out.push('\n');
            out.push(*tag);
            out.push_str(line);
        }
    }
    out
}

/// Every line of both sides tagged `' '`, `'-'` or `'+'`.
fn diff_lines(expected: &str, actual: &str) -> Vec<(char, String)> {
    let mut lines = Vec::new();
    let mut push = |tag: char, chunk: &str| {
        lines.extend(chunk.split('\n').map(|line| (tag, line.to_string())));
    };

    // `Changeset` treats an empty text as one empty line.
    match (expected.is_empty(), actual.is_empty()) {
        (true, true) => {}
        (true, false) => push('+', actual),
        (false, true) => push('-', expected),
        (false, false) => {
            let changeset = Changeset::new(expected, actual, "\n");
            for diff in &changeset.diffs {
                match diff {
                    Difference::Same(chunk) => push(' ', chunk),
                    Difference::Rem(chunk) => push('-', chunk),
                    Difference::Add(chunk) => push('+', chunk),
                }
            }
        }
    }
    lines
}

/// Half-open index ranges of the hunks, merged where their context overlaps.
fn hunks(lines: &[(char, String)]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (index, _) in lines.iter().enumerate().filter(|(_, (tag, _))| *tag != ' ') {
        let start = index.saturating_sub(DIFF_CONTEXT);
        let end = (index + DIFF_CONTEXT + 1).min(lines.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

fn hunk_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start - 1),
        1 => start.to_string(),
        _ => format!("{start},{len}"),
    }
}
