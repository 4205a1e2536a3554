//! Suite configuration.
//!
//! A suite binds one stage executable to one fixture layout and one comparison
//! strategy. The built-in table mirrors the repository layout the stage
//! executables were developed against; a YAML file can replace it:
//!
//! ```yaml
//! jobs: 4
//! timeout_secs: 10
//! suites:
//!   - name: scanner
//!     executable: bin/scannerdebug
//!     root: tests/scanner
//!     input: input.zig
//!     expected: expected_output.json
//!     strategy: structural
//! ```
//!
//! Relative `executable` and `root` paths in a file resolve against the file's
//! own directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::compare::Strategy;
use crate::diagnostics::{HarnessError, HarnessResult};

/// Directory-name prefix used when a suite does not set one.
pub const DEFAULT_CASE_PREFIX: &str = "test";

fn default_case_prefix() -> String {
    DEFAULT_CASE_PREFIX.to_string()
}

fn default_jobs() -> usize {
    1
}

/// One selectable suite: executable, fixture layout, and strategy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    pub name: String,
    pub executable: PathBuf,
    pub root: PathBuf,
    #[serde(default = "default_case_prefix")]
    pub case_prefix: String,
    /// File name of the input artifact inside each case directory.
    pub input: String,
    /// File name of the golden expected-output artifact.
    pub expected: String,
    pub strategy: Strategy,
}

impl SuiteConfig {
    pub fn new(
        name: &str,
        executable: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
        input: &str,
        expected: &str,
        strategy: Strategy,
    ) -> Self {
        Self {
            name: name.to_string(),
            executable: executable.into(),
            root: root.into(),
            case_prefix: default_case_prefix(),
            input: input.to_string(),
            expected: expected.to_string(),
            strategy,
        }
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::invalid("suite name must not be empty"));
        }
        if self.case_prefix.is_empty() {
            return Err(HarnessError::invalid(format!(
                "suite '{}': case_prefix must not be empty",
                self.name
            )));
        }
        for (field, value) in [("input", &self.input), ("expected", &self.expected)] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(HarnessError::invalid(format!(
                    "suite '{}': {field} must be a plain file name, got '{value}'",
                    self.name
                )));
            }
        }
        Ok(())
    }

    fn resolve_against(&mut self, base: &Path) {
        if self.executable.is_relative() {
            self.executable = base.join(&self.executable);
        }
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
    }
}

/// The full harness configuration: suites plus run options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Number of cases run concurrently. `1` is strictly sequential.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Per-case wall-clock limit. `None` waits forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    pub suites: Vec<SuiteConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl HarnessConfig {
    /// The stage suites of the reference repository layout, relative to the
    /// current directory.
    pub fn builtin() -> Self {
        use Strategy::*;
        let suites = vec![
            SuiteConfig::new(
                "scanner",
                "bin/scannerdebug",
                "tests/scanner",
                "input.zig",
                "expected_output.json",
                Structural,
            ),
            SuiteConfig::new(
                "token-buffer",
                "bin/tokenbufferdebug",
                "tests/scanner/token_check",
                "input.zig",
                "expected_output.json",
                Structural,
            ),
            SuiteConfig::new(
                "parser-noexpr",
                "bin/ifj24debug",
                "tests/parser/no_expr",
                "input.ifj",
                "output.txt",
                ExitCode,
            ),
            SuiteConfig::new(
                "parser-normal",
                "bin/ifj24debug",
                "tests/parser/normal",
                "input.ifj",
                "output.txt",
                ExitCode,
            ),
            SuiteConfig::new(
                "first-phase-pubfn",
                "bin/firstphasedebug",
                "tests/first_phase/pub_fn",
                "input.ifj",
                "output.txt",
                LineSet,
            ),
            SuiteConfig::new(
                "precedence",
                "bin/precedencedebug",
                "tests/precedence",
                "input.expr",
                "output.txt",
                ExactText,
            ),
            SuiteConfig::new(
                "generate",
                "bin/genhandler",
                "tests/generate",
                "input.txt",
                "expected_output.txt",
                ExactText,
            ),
        ];
        Self {
            jobs: default_jobs(),
            timeout_secs: None,
            suites,
        }
    }

    /// Loads and validates a YAML configuration file.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| HarnessError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml_str(&text, base).map_err(|err| match err {
            HarnessError::ConfigParse { source, .. } => HarnessError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses YAML text, resolving relative paths against `base`.
    pub fn from_yaml_str(text: &str, base: &Path) -> HarnessResult<Self> {
        let mut config: HarnessConfig =
            serde_yaml::from_str(text).map_err(|source| HarnessError::ConfigParse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        for suite in &mut config.suites {
            suite.resolve_against(base);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.jobs == 0 {
            return Err(HarnessError::invalid("jobs must be at least 1"));
        }
        if self.timeout_secs == Some(0) {
            return Err(HarnessError::invalid("timeout_secs must be at least 1"));
        }
        if self.suites.is_empty() {
            return Err(HarnessError::invalid("no suites configured"));
        }
        let mut seen = HashSet::new();
        for suite in &self.suites {
            suite.validate()?;
            if !seen.insert(suite.name.as_str()) {
                return Err(HarnessError::invalid(format!(
                    "suite '{}' is defined more than once",
                    suite.name
                )));
            }
        }
        Ok(())
    }

    /// Looks up a suite by its selector name.
    pub fn suite(&self, name: &str) -> HarnessResult<&SuiteConfig> {
        self.suites
            .iter()
            .find(|suite| suite.name == name)
            .ok_or_else(|| HarnessError::UnknownSuite {
                name: name.to_string(),
                available: self.suite_names().join(", "),
            })
    }

    pub fn suite_names(&self) -> Vec<&str> {
        self.suites.iter().map(|suite| suite.name.as_str()).collect()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
