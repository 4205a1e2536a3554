//! Result aggregation and terminal reporting.
//!
//! [`ReportBuilder`] accepts verdicts in whatever order cases finish and
//! always hands back a [`RunReport`] sorted by case identity. [`Reporter`]
//! renders live per-case lines and the final tables to any
//! [`WriteColor`] sink.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::verdict::{CaseId, Verdict, VerdictKind};

// ============================================================================
// AGGREGATION
// ============================================================================

/// Counts per verdict kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Tally {
    fn add(&mut self, kind: VerdictKind) {
        match kind {
            VerdictKind::Passed => self.passed += 1,
            VerdictKind::Failed => self.failed += 1,
            VerdictKind::Skipped => self.skipped += 1,
        }
    }

    pub fn get(&self, kind: VerdictKind) -> usize {
        match kind {
            VerdictKind::Passed => self.passed,
            VerdictKind::Failed => self.failed,
            VerdictKind::Skipped => self.skipped,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Collects `(identity, verdict)` pairs in completion order.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    entries: Vec<(CaseId, Verdict)>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: CaseId, verdict: Verdict) {
        self.entries.push((id, verdict));
    }

    /// Sorts by identity and freezes the report.
    pub fn finish(mut self) -> RunReport {
        self.entries.sort_by_key(|(id, _)| *id);
        let mut tally = Tally::default();
        for (_, verdict) in &self.entries {
            tally.add(verdict.kind());
        }
        RunReport {
            entries: self.entries,
            tally,
        }
    }
}

/// The finalized, identity-ordered outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    entries: Vec<(CaseId, Verdict)>,
    tally: Tally,
}

impl RunReport {
    pub fn entries(&self) -> &[(CaseId, Verdict)] {
        &self.entries
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn verdict(&self, id: CaseId) -> Option<&Verdict> {
        self.entries
            .binary_search_by_key(&id, |(case, _)| *case)
            .ok()
            .map(|index| &self.entries[index].1)
    }

    /// True when no case failed. Skipped cases do not count against a run.
    pub fn is_success(&self) -> bool {
        self.tally.failed == 0
    }
}

// ============================================================================
// RENDERING
// ============================================================================

const ID_WIDTH: usize = 10;
const STATUS_WIDTH: usize = 12;

fn verdict_color(kind: VerdictKind) -> Color {
    match kind {
        VerdictKind::Passed => Color::Green,
        VerdictKind::Failed => Color::Red,
        VerdictKind::Skipped => Color::Yellow,
    }
}

/// Resolves `auto` against whether stdout is a terminal.
pub fn resolve_color_choice(choice: ColorChoice) -> ColorChoice {
    match choice {
        ColorChoice::Auto if !atty::is(atty::Stream::Stdout) => ColorChoice::Never,
        other => other,
    }
}

/// Writes progress lines and summary tables.
pub struct Reporter<W: WriteColor> {
    out: W,
}

impl Reporter<StandardStream> {
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(resolve_color_choice(choice)))
    }
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Announces the suite about to run.
    pub fn suite_started(&mut self, suite: &str, strategy: &str) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(self.out, "Running suite {suite}")?;
        self.out.reset()?;
        writeln!(self.out, " ({strategy})\n")
    }

    /// One line per finished case, with its diagnostic indented beneath.
    pub fn case_finished(&mut self, id: CaseId, verdict: &Verdict) -> io::Result<()> {
        let kind = verdict.kind();
        self.colored(kind, true, &format!("TEST {id} {}", kind.label()))?;
        writeln!(self.out)?;
        if let Some(detail) = verdict.detail() {
            for line in detail.lines() {
                writeln!(self.out, "    {line}")?;
            }
        }
        Ok(())
    }

    /// The results table followed by the counts table.
    pub fn summary(&mut self, report: &RunReport) -> io::Result<()> {
        let rule = "-".repeat(ID_WIDTH + STATUS_WIDTH + 2);

        self.heading("Test Results Summary")?;
        writeln!(self.out, "{:<ID_WIDTH$}  {:<STATUS_WIDTH$}", "Test No.", "Result")?;
        writeln!(self.out, "{rule}")?;
        for (id, verdict) in report.entries() {
            let kind = verdict.kind();
            write!(self.out, "{:<ID_WIDTH$}  ", id)?;
            self.colored(kind, false, &format!("{:<STATUS_WIDTH$}", kind.label()))?;
            writeln!(self.out)?;
        }
        writeln!(self.out, "{rule}\n")?;

        self.heading("Test Counts")?;
        writeln!(self.out, "{:<STATUS_WIDTH$}  {:>ID_WIDTH$}", "Status", "Count")?;
        writeln!(self.out, "{rule}")?;
        let tally = report.tally();
        for kind in [VerdictKind::Passed, VerdictKind::Failed, VerdictKind::Skipped] {
            self.colored(kind, true, &format!("{:<STATUS_WIDTH$}", kind.label()))?;
            writeln!(self.out, "  {:>ID_WIDTH$}", tally.get(kind))?;
        }
        writeln!(self.out, "{rule}")?;
        self.out.flush()
    }

    fn heading(&mut self, title: &str) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        write!(self.out, "{title}")?;
        self.out.reset()?;
        writeln!(self.out)
    }

    fn colored(&mut self, kind: VerdictKind, bold: bool, text: &str) -> io::Result<()> {
        self.out.set_color(
            ColorSpec::new()
                .set_fg(Some(verdict_color(kind)))
                .set_bold(bold),
        )?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{Failure, SkipReason};
    use termcolor::NoColor;

    fn failed() -> Verdict {
        Verdict::Failed(Failure::ExitCodeMismatch {
            expected: 0,
            actual: 2,
        })
    }

    fn skipped() -> Verdict {
        Verdict::Skipped(SkipReason {
            missing: vec!["test7/output.txt".into()],
        })
    }

    #[test]
    fn finish_sorts_by_identity_and_tallies() {
        let mut builder = ReportBuilder::new();
        builder.record(10, Verdict::Passed);
        builder.record(2, failed());
        builder.record(7, skipped());
        builder.record(1, Verdict::Passed);
        let report = builder.finish();

        let ids: Vec<CaseId> = report.entries().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 7, 10]);
        assert_eq!(
            report.tally(),
            Tally {
                passed: 2,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(report.tally().total(), 4);
        assert!(!report.is_success());
        assert_eq!(report.verdict(7), Some(&skipped()));
        assert_eq!(report.verdict(3), None);
    }

    #[test]
    fn skipped_cases_do_not_fail_the_run() {
        let mut builder = ReportBuilder::new();
        builder.record(1, skipped());
        builder.record(2, Verdict::Passed);
        assert!(builder.finish().is_success());
    }

    #[test]
    fn case_line_includes_indented_diagnostic() {
        let mut reporter = Reporter::new(NoColor::new(Vec::new()));
        reporter.case_finished(4, &failed()).unwrap();
        let text = String::from_utf8(reporter.into_inner().into_inner()).unwrap();
        assert_eq!(
            text,
            "TEST 4 FAILED\n    expected OK (0), got SYNTAX ERROR (2)\n"
        );
    }

    #[test]
    fn summary_lists_cases_in_order_then_counts() {
        let mut builder = ReportBuilder::new();
        builder.record(12, Verdict::Passed);
        builder.record(3, failed());
        let report = builder.finish();

        let mut reporter = Reporter::new(NoColor::new(Vec::new()));
        reporter.summary(&report).unwrap();
        let text = String::from_utf8(reporter.into_inner().into_inner()).unwrap();

        let row3 = text.find("3           FAILED").unwrap();
        let row12 = text.find("12          PASSED").unwrap();
        assert!(row3 < row12);
        assert!(text.contains("Test Counts"));
        assert!(text.contains("PASSED                 1"));
        assert!(text.contains("FAILED                 1"));
        assert!(text.contains("SKIPPED                0"));
    }
}
