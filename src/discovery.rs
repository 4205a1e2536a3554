use std::collections::btree_map::{BTreeMap, Entry};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::compare::Strategy;
use crate::config::SuiteConfig;
use crate::diagnostics::{HarnessError, HarnessResult};
use crate::verdict::{CaseId, SkipReason};

/// A runnable test case. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: CaseId,
    pub dir: PathBuf,
    pub input: PathBuf,
    pub expected: PathBuf,
    pub strategy: Strategy,
}

/// One numbered fixture directory, either ready to run or already skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveredCase {
    Ready(TestCase),
    Skipped { id: CaseId, reason: SkipReason },
}

impl DiscoveredCase {
    pub fn id(&self) -> CaseId {
        match self {
            DiscoveredCase::Ready(case) => case.id,
            DiscoveredCase::Skipped { id, .. } => *id,
        }
    }
}

/// Finds the numbered case directories of a suite.
///
/// The discovery process follows this flow:
/// 1. Check the fixture root exists
/// 2. Collect immediate subdirectories named `<prefix><digits>`
/// 3. Order them by the numeric value of the digits
/// 4. Check each for the suite's input and expected artifacts
#[derive(Debug)]
pub struct FixtureDiscoverer;

impl FixtureDiscoverer {
    /// Discovers every case of `suite`, in ascending identity order.
    ///
    /// Fails only when the root is missing or holds no candidate directory;
    /// a case lacking an artifact comes back as [`DiscoveredCase::Skipped`].
    pub fn discover(suite: &SuiteConfig) -> HarnessResult<Vec<DiscoveredCase>> {
        let root = suite.root.as_path();
        if !root.is_dir() {
            return Err(HarnessError::FixtureRootMissing {
                path: root.to_path_buf(),
            });
        }

        let candidates = Self::candidate_dirs(root, &suite.case_prefix)?;
        if candidates.is_empty() {
            return Err(HarnessError::FixtureRootEmpty {
                path: root.to_path_buf(),
                prefix: suite.case_prefix.clone(),
            });
        }

        let cases: Vec<DiscoveredCase> = candidates
            .into_iter()
            .map(|(id, dir)| Self::inspect_case(id, dir, suite))
            .collect();
        debug!(
            suite = %suite.name,
            cases = cases.len(),
            root = %root.display(),
            "discovered fixtures"
        );
        Ok(cases)
    }

    /// Builds the `^<prefix>(\d+)$` directory-name pattern.
    pub fn case_pattern(prefix: &str) -> HarnessResult<Regex> {
        Regex::new(&format!(r"^{}(\d+)$", regex::escape(prefix)))
            .map_err(|e| HarnessError::invalid(format!("bad case prefix '{prefix}': {e}")))
    }

    /// Extracts the case identity from a directory name, if it matches.
    pub fn case_id(pattern: &Regex, name: &str) -> Option<CaseId> {
        let digits = pattern.captures(name)?.get(1)?.as_str();
        match digits.parse::<CaseId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(directory = name, "case number out of range, ignoring");
                None
            }
        }
    }

    /// Immediate subdirectories matching the case pattern, keyed by identity.
    fn candidate_dirs(root: &Path, prefix: &str) -> HarnessResult<BTreeMap<CaseId, PathBuf>> {
        let pattern = Self::case_pattern(prefix)?;
        let mut found = BTreeMap::new();

        // Sorted by name so the lexically first of `test7` / `test07` wins.
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Only a failure to read the root itself is fatal; a broken
                // link or unreadable entry inside it is just not a case.
                Err(e) if e.depth() > 0 => {
                    warn!(error = %e, "unreadable fixture entry, ignoring");
                    continue;
                }
                Err(e) => {
                    return Err(HarnessError::FixtureScan {
                        path: root.to_path_buf(),
                        message: e.to_string(),
                    })
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let Some(id) = Self::case_id(&pattern, &name) else {
                debug!(directory = %name, "not a case directory");
                continue;
            };
            match found.entry(id) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.path().to_path_buf());
                }
                Entry::Occupied(kept) => {
                    warn!(
                        directory = %name,
                        kept = %kept.get().display(),
                        id,
                        "duplicate case number, ignoring"
                    );
                }
            }
        }
        Ok(found)
    }

    fn inspect_case(id: CaseId, dir: PathBuf, suite: &SuiteConfig) -> DiscoveredCase {
        let input = dir.join(&suite.input);
        let expected = dir.join(&suite.expected);
        let missing: Vec<PathBuf> = [&input, &expected]
            .into_iter()
            .filter(|path| !path.is_file())
            .cloned()
            .collect();

        if !missing.is_empty() {
            return DiscoveredCase::Skipped {
                id,
                reason: SkipReason { missing },
            };
        }
        DiscoveredCase::Ready(TestCase {
            id,
            dir,
            input,
            expected,
            strategy: suite.strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn suite(root: &Path) -> SuiteConfig {
        SuiteConfig::new(
            "precedence",
            "bin/precedencedebug",
            root,
            "input.expr",
            "output.txt",
            Strategy::ExactText,
        )
    }

    fn case(root: &Path, name: &str, input: bool, expected: bool) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        if input {
            fs::write(dir.join("input.expr"), "a+b").unwrap();
        }
        if expected {
            fs::write(dir.join("output.txt"), "a b +").unwrap();
        }
    }

    #[test]
    fn orders_numerically_not_lexically() {
        let tmp = TempDir::new().unwrap();
        for name in ["test10", "test2", "test1", "test33"] {
            case(tmp.path(), name, true, true);
        }
        let ids: Vec<CaseId> = FixtureDiscoverer::discover(&suite(tmp.path()))
            .unwrap()
            .iter()
            .map(DiscoveredCase::id)
            .collect();
        assert_eq!(ids, vec![1, 2, 10, 33]);
    }

    #[test]
    fn missing_expected_artifact_is_skipped() {
        let tmp = TempDir::new().unwrap();
        case(tmp.path(), "test6", true, true);
        case(tmp.path(), "test7", true, false);
        let cases = FixtureDiscoverer::discover(&suite(tmp.path())).unwrap();
        assert!(matches!(cases[0], DiscoveredCase::Ready(ref c) if c.id == 6));
        match &cases[1] {
            DiscoveredCase::Skipped { id, reason } => {
                assert_eq!(*id, 7);
                assert_eq!(reason.missing, vec![tmp.path().join("test7/output.txt")]);
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn ignores_files_and_foreign_directories() {
        let tmp = TempDir::new().unwrap();
        case(tmp.path(), "test3", true, true);
        fs::create_dir(tmp.path().join("testx")).unwrap();
        fs::create_dir(tmp.path().join("notes")).unwrap();
        fs::write(tmp.path().join("test4"), "file, not dir").unwrap();
        let cases = FixtureDiscoverer::discover(&suite(tmp.path())).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id(), 3);
    }

    #[test]
    fn duplicate_identity_keeps_lexically_first() {
        let tmp = TempDir::new().unwrap();
        case(tmp.path(), "test07", true, true);
        case(tmp.path(), "test7", true, true);
        let cases = FixtureDiscoverer::discover(&suite(tmp.path())).unwrap();
        assert_eq!(cases.len(), 1);
        let DiscoveredCase::Ready(case) = &cases[0] else {
            panic!("expected a runnable case");
        };
        assert_eq!(case.dir, tmp.path().join("test07"));
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = FixtureDiscoverer::discover(&suite(&tmp.path().join("nope"))).unwrap_err();
        assert!(matches!(err, HarnessError::FixtureRootMissing { .. }));
    }

    #[test]
    fn root_without_candidates_is_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("fixtures")).unwrap();
        let err = FixtureDiscoverer::discover(&suite(tmp.path())).unwrap_err();
        assert!(matches!(err, HarnessError::FixtureRootEmpty { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_ignored() {
        let tmp = TempDir::new().unwrap();
        case(tmp.path(), "test1", true, true);
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("notes")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("test2")).unwrap();
        let cases = FixtureDiscoverer::discover(&suite(tmp.path())).unwrap();
        assert_eq!(cases.len(), 1);
        assert!(matches!(cases[0], DiscoveredCase::Ready(ref c) if c.id == 1));
    }

    #[test]
    fn prefix_is_matched_literally() {
        let pattern = FixtureDiscoverer::case_pattern("case.").unwrap();
        assert_eq!(FixtureDiscoverer::case_id(&pattern, "case.12"), Some(12));
        assert_eq!(FixtureDiscoverer::case_id(&pattern, "caseX12"), None);
        assert_eq!(FixtureDiscoverer::case_id(&pattern, "case.12a"), None);
        assert_eq!(
            FixtureDiscoverer::case_id(&pattern, "case.99999999999999999999999"),
            None
        );
    }
}
