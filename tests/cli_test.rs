//! CLI tests
//!
//! Build the scopecheck binary once, then run it against fixture and pattern
//! files on disk, asserting on exit codes and printed reports.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Cache the built CLI path
static CLI_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Get the path to the workspace root (parent of the tests directory)
fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests dir should have parent")
        .to_path_buf()
}

/// Build the scopecheck CLI and return the path to the binary (cached)
fn build_cli() -> PathBuf {
    CLI_PATH
        .get_or_init(|| {
            let root = workspace_root();

            let status = Command::new("cargo")
                .args(["build", "--release", "-p", "scopecheck"])
                .current_dir(&root)
                .status()
                .expect("Failed to execute cargo build");
            assert!(status.success(), "Failed to build the scopecheck CLI");

            // The binary location depends on the target directory
            // configuration.
            let mut candidates = Vec::new();
            if let Ok(target_dir) = std::env::var("CARGO_TARGET_DIR") {
                candidates.push(PathBuf::from(target_dir).join("release/scopecheck"));
            }
            candidates.push(root.join("target/release/scopecheck"));

            for path in &candidates {
                if path.exists() {
                    return path.clone();
                }
            }

            panic!(
                "Could not find the scopecheck binary after build. Tried: {:?}",
                candidates
            );
        })
        .clone()
}

/// Run the CLI and return the raw output (status + captured streams)
fn run_cli(args: &[&str], working_dir: &Path) -> Output {
    Command::new(build_cli())
        .args(args)
        .current_dir(working_dir)
        .output()
        .expect("Failed to execute scopecheck")
}

const PATTERNS_JSON: &str = r#"{ "headlineDetectRegex": "^(\\*+\\s+.*)" }"#;

/// Write a fixture file and a pattern table into `dir`
fn write_files(dir: &Path, fixture: &str) -> (PathBuf, PathBuf) {
    let fixture_path = dir.join("cases.org");
    let patterns_path = dir.join("patterns.json");
    fs::write(&fixture_path, fixture).unwrap();
    fs::write(&patterns_path, PATTERNS_JSON).unwrap();
    (fixture_path, patterns_path)
}

#[test]
fn test_check_exits_zero_on_passing_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let (fixture, patterns) = write_files(
        dir.path(),
        "\
#+NAME: Passing headline
#+BEGIN_FIXTURE
* A headline
#+END_FIXTURE
#+EXPECTED: headlineDetectRegex
| 1 | * A headline |
",
    );

    let output = run_cli(
        &[
            "check",
            fixture.to_str().unwrap(),
            "--patterns",
            patterns.to_str().unwrap(),
        ],
        dir.path(),
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "check should exit 0 for a passing fixture: {}",
        stdout
    );
    assert!(stdout.contains("PASS"), "stdout: {}", stdout);
    assert!(stdout.contains("Passing headline"), "stdout: {}", stdout);
}

#[test]
fn test_check_exits_one_on_failing_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let (fixture, patterns) = write_files(
        dir.path(),
        "\
#+NAME: Failing headline
#+BEGIN_FIXTURE
* A headline
#+END_FIXTURE
#+EXPECTED: headlineDetectRegex
no-match
",
    );

    let output = run_cli(
        &[
            "check",
            fixture.to_str().unwrap(),
            "--patterns",
            patterns.to_str().unwrap(),
        ],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAIL"), "stdout: {}", stdout);
    assert!(
        stdout.contains("pattern 'headlineDetectRegex'"),
        "the failing expectation should be printed: {}",
        stdout
    );
}

#[test]
fn test_check_without_grammar_is_configuration_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (fixture, patterns) = write_files(
        dir.path(),
        "\
#+NAME: Needs a tokenizer
#+BEGIN_FIXTURE
*bold*
#+END_FIXTURE
#+EXPECTED: scopes
bold => markup.bold.org
",
    );

    // A scope expectation with no --grammar is a broken setup, not a pass.
    let output = run_cli(
        &[
            "check",
            fixture.to_str().unwrap(),
            "--patterns",
            patterns.to_str().unwrap(),
        ],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("configuration error"), "stdout: {}", stdout);
    assert!(stdout.contains("no tokenizer"), "stdout: {}", stdout);
}

#[test]
fn test_list_prints_parsed_cases() {
    let dir = tempfile::tempdir().unwrap();
    let (fixture, _) = write_files(
        dir.path(),
        "\
#+NAME: First case
#+BEGIN_FIXTURE
* A headline
#+END_FIXTURE
#+EXPECTED: headlineDetectRegex
| 1 | * A headline |

#+NAME: Second case
#+BEGIN_FIXTURE
*bold*
#+END_FIXTURE
#+EXPECTED: scopes
bold => markup.bold.org
",
    );

    let output = run_cli(&["list", fixture.to_str().unwrap()], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("First case"), "stdout: {}", stdout);
    assert!(stdout.contains("Second case"), "stdout: {}", stdout);
    assert!(stdout.contains("pattern"), "stdout: {}", stdout);
    assert!(stdout.contains("scopes"), "stdout: {}", stdout);
}
