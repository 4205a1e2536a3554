pub use crate::compare::Strategy;
pub use crate::config::{HarnessConfig, SuiteConfig};
pub use crate::diagnostics::{HarnessError, HarnessResult};
pub use crate::discovery::{DiscoveredCase, FixtureDiscoverer, TestCase};
pub use crate::executor::{ExecutionError, ExecutionOutcome, FnSubject, LocalProcess, SubjectProcess};
pub use crate::report::{Reporter, RunReport, Tally};
pub use crate::runner::run_suite;
pub use crate::verdict::{CaseId, Failure, SkipReason, Verdict, VerdictKind};

pub mod cli;
pub mod compare;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod executor;
pub mod report;
pub mod runner;
pub mod verdict;
