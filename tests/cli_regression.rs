// Regression tests for the stagecheck binary: exit statuses, report layout,
// and miette-rendered fatal errors.
#![cfg(unix)]

mod common;

use std::fs;

use assert_cmd::Command;
use common::{write_case, write_script};
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn stagecheck() -> Command {
    let mut cmd = Command::cargo_bin("stagecheck").unwrap();
    cmd.arg("--color").arg("never");
    cmd
}

/// A precedence-style fixture tree with one passing and one failing case.
fn precedence_tree(tmp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let root = tmp.path().join("precedence");
    write_case(&root, "test1", &[("input.expr", "i+i"), ("output.txt", "i i +\n")]);
    write_case(&root, "test2", &[("input.expr", "i*i"), ("output.txt", "i i *\n")]);
    let exe = write_script(
        tmp.path(),
        "precedencedebug",
        "cat > /dev/null; echo 'i i +'",
    );
    (root, exe)
}

#[test]
fn missing_suite_argument_is_a_usage_error() {
    Command::cargo_bin("stagecheck")
        .unwrap()
        .assert()
        .code(2)
        .stderr(contains("Usage"));
}

#[test]
fn unknown_suite_is_a_usage_error() {
    stagecheck()
        .arg("lexer")
        .assert()
        .code(2)
        .stderr(contains("unknown suite 'lexer'").and(contains("scanner")));
}

#[test]
fn list_prints_builtin_suites() {
    stagecheck()
        .arg("--list")
        .assert()
        .success()
        .stdout(
            contains("scanner")
                .and(contains("parser-normal"))
                .and(contains("exit-code"))
                .and(contains("first-phase-pubfn")),
        );
}

#[test]
fn missing_fixture_root_is_fatal() {
    let tmp = TempDir::new().unwrap();
    stagecheck()
        .arg("precedence")
        .arg("--root")
        .arg(tmp.path().join("nope"))
        .assert()
        .code(2)
        .stdout(contains("TEST").not())
        .stderr(contains("fixture root"));
}

#[test]
fn missing_executable_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let (root, _) = precedence_tree(&tmp);
    stagecheck()
        .arg("precedence")
        .arg("--root")
        .arg(&root)
        .arg("--exec")
        .arg(tmp.path().join("bin/nope"))
        .assert()
        .code(2)
        .stderr(contains("subject executable"));
}

#[test]
fn failing_case_exits_with_one_and_prints_both_tables() {
    let tmp = TempDir::new().unwrap();
    let (root, exe) = precedence_tree(&tmp);
    stagecheck()
        .arg("precedence")
        .arg("--root")
        .arg(&root)
        .arg("--exec")
        .arg(&exe)
        .assert()
        .code(1)
        .stdout(
            contains("TEST 1 PASSED")
                .and(contains("TEST 2 FAILED"))
                .and(contains("-i i *"))
                .and(contains("Test Results Summary"))
                .and(contains("Test Counts")),
        );
}

#[test]
fn passing_run_with_jobs_exits_zero() {
    let tmp = TempDir::new().unwrap();
    let (root, exe) = precedence_tree(&tmp);
    fs::write(root.join("test2/output.txt"), "i i +").unwrap();
    write_case(&root, "test3", &[("input.expr", "i")]);
    stagecheck()
        .arg("precedence")
        .arg("--root")
        .arg(&root)
        .arg("--exec")
        .arg(&exe)
        .arg("--jobs")
        .arg("3")
        .assert()
        .success()
        .stdout(contains("TEST 3 SKIPPED").and(contains("missing fixture artifact")));
}

#[test]
fn timeout_fails_only_the_slow_case() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("generate");
    write_case(&root, "test1", &[("input.txt", "fast"), ("expected_output.txt", "fast")]);
    write_case(&root, "test2", &[("input.txt", "slow"), ("expected_output.txt", "slow")]);
    let exe = write_script(
        tmp.path(),
        "genhandler",
        "read line; if [ \"$line\" = slow ]; then exec sleep 10; fi; echo \"$line\"",
    );
    stagecheck()
        .arg("generate")
        .arg("--root")
        .arg(&root)
        .arg("--exec")
        .arg(&exe)
        .arg("--timeout")
        .arg("1")
        .assert()
        .code(1)
        .stdout(contains("TEST 1 PASSED").and(contains("timed out")));
}

#[test]
fn config_file_replaces_builtin_suites() {
    let tmp = TempDir::new().unwrap();
    write_case(
        &tmp.path().join("cases"),
        "case4",
        &[("in.ifj", "x"), ("code.txt", "99")],
    );
    write_script(tmp.path(), "internal.sh", "exit 99");
    let config = tmp.path().join("stagecheck.yaml");
    fs::write(
        &config,
        "suites:\n  - name: internal\n    executable: internal.sh\n    root: cases\n    case_prefix: case\n    input: in.ifj\n    expected: code.txt\n    strategy: exit-code\n",
    )
    .unwrap();

    stagecheck()
        .arg("--config")
        .arg(&config)
        .arg("internal")
        .assert()
        .success()
        .stdout(contains("TEST 4 PASSED"));

    stagecheck()
        .arg("--config")
        .arg(&config)
        .arg("scanner")
        .assert()
        .code(2)
        .stderr(contains("internal"));
}
