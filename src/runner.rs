//! The harness engine: discovery → execution → comparison → aggregation.
//!
//! Cases run strictly in identity order when `jobs` is 1. With more jobs, a
//! bounded pool of scoped worker threads pulls cases from a shared cursor and
//! sends verdicts back over a channel; the aggregator re-sorts them, so the
//! report is the same either way.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use tracing::debug;

use crate::compare::judge;
use crate::config::SuiteConfig;
use crate::diagnostics::{HarnessError, HarnessResult};
use crate::discovery::{DiscoveredCase, FixtureDiscoverer, TestCase};
use crate::executor::{ExecutionError, SubjectProcess};
use crate::report::{ReportBuilder, RunReport};
use crate::verdict::{CaseId, Failure, Verdict};

/// Runs every case of `suite` against `subject`.
///
/// `on_case` observes each verdict as it becomes available, in completion
/// order. Skipped cases are reported first, before any process is spawned.
/// Returns an error, and no report, for configuration-fatal conditions.
pub fn run_suite<F>(
    suite: &SuiteConfig,
    subject: &dyn SubjectProcess,
    jobs: usize,
    mut on_case: F,
) -> HarnessResult<RunReport>
where
    F: FnMut(CaseId, &Verdict),
{
    let discovered = FixtureDiscoverer::discover(suite)?;
    let mut builder = ReportBuilder::new();
    let mut ready = Vec::with_capacity(discovered.len());

    for case in discovered {
        match case {
            DiscoveredCase::Ready(case) => ready.push(case),
            DiscoveredCase::Skipped { id, reason } => {
                let verdict = Verdict::Skipped(reason);
                on_case(id, &verdict);
                builder.record(id, verdict);
            }
        }
    }

    if jobs <= 1 || ready.len() <= 1 {
        for case in &ready {
            let verdict = run_case(case, subject)?;
            on_case(case.id, &verdict);
            builder.record(case.id, verdict);
        }
    } else {
        run_parallel(&suite.name, &ready, subject, jobs, &mut builder, &mut on_case)?;
    }

    Ok(builder.finish())
}

/// Executes and judges one case.
///
/// Only a subject that cannot be spawned is an error; every other problem
/// becomes a failed verdict for this case alone.
pub fn run_case(case: &TestCase, subject: &dyn SubjectProcess) -> HarnessResult<Verdict> {
    let input = match read_fixture(&case.input) {
        Ok(bytes) => bytes,
        Err(failure) => return Ok(Verdict::Failed(failure)),
    };
    let expected = match read_fixture(&case.expected) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(failure) => return Ok(Verdict::Failed(failure)),
    };

    debug!(case = case.id, strategy = %case.strategy, "running case");
    let verdict = match subject.execute(&input) {
        Ok(outcome) => judge(case.strategy, &expected, &outcome),
        Err(ExecutionError::Spawn { program, source }) => {
            return Err(HarnessError::SubjectSpawn { program, source })
        }
        Err(ExecutionError::TimedOut(after)) => Verdict::Failed(Failure::TimedOut { after }),
        Err(ExecutionError::Io(err)) => Verdict::Failed(Failure::Execution {
            message: err.to_string(),
        }),
    };
    debug!(case = case.id, verdict = %verdict.kind(), "case judged");
    Ok(verdict)
}

fn read_fixture(path: &Path) -> Result<Vec<u8>, Failure> {
    fs::read(path).map_err(|err| Failure::UnreadableFixture {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn run_parallel<F>(
    suite: &str,
    cases: &[TestCase],
    subject: &dyn SubjectProcess,
    jobs: usize,
    builder: &mut ReportBuilder,
    on_case: &mut F,
) -> HarnessResult<()>
where
    F: FnMut(CaseId, &Verdict),
{
    let cursor = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(CaseId, HarnessResult<Verdict>)>();
    let workers = jobs.min(cases.len());
    debug!(suite, workers, cases = cases.len(), "starting worker pool");

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let tx = tx.clone();
                let (cursor, abort) = (&cursor, &abort);
                scope.spawn(move || {
                    while !abort.load(Ordering::SeqCst) {
                        let index = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(case) = cases.get(index) else {
                            break;
                        };
                        let result = run_case(case, subject);
                        if result.is_err() {
                            abort.store(true, Ordering::SeqCst);
                        }
                        if tx.send((case.id, result)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(tx);

        let mut fatal = None;
        for (id, result) in rx {
            match result {
                Ok(verdict) if fatal.is_none() => {
                    on_case(id, &verdict);
                    builder.record(id, verdict);
                }
                Ok(_) => {}
                Err(err) => {
                    fatal.get_or_insert(err);
                }
            }
        }

        let panicked = handles
            .into_iter()
            .fold(false, |panicked, handle| handle.join().is_err() || panicked);
        if let Some(err) = fatal {
            return Err(err);
        }
        if panicked {
            return Err(HarnessError::WorkerPanic {
                suite: suite.to_string(),
            });
        }
        Ok(())
    })
}
