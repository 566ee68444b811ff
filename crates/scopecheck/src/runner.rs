// runner.rs
//
// Orchestration: for each test case, execute pattern expectations against
// the registry and scope expectations through the tokenizer + resolver.
// Every expectation is evaluated even after an earlier one fails, so one run
// surfaces the complete set of violations.

use crate::fixture::{CaptureValue, Expectation, PatternExpectation, TestCase};
use crate::registry::PatternRegistry;
use crate::report::{CaseReport, ExpectationReport, PatternOutcome};
use crate::resolver::resolve_tree;
use crate::tokenizer::{Tokenizer, TokenizedLine, tokenize_input};


/// Run every case. `tokenizer: None` turns scope expectations into
/// configuration failures (the fixture asks for something the run was not
/// set up for).
pub fn run<T: Tokenizer>(
    cases: &[TestCase],
    registry: &PatternRegistry,
    tokenizer: Option<&T>,
) -> Vec<CaseReport> {
    cases
        .iter()
        .map(|case| run_case(case, registry, tokenizer))
        .collect()
}

pub fn run_case<T: Tokenizer>(
    case: &TestCase,
    registry: &PatternRegistry,
    tokenizer: Option<&T>,
) -> CaseReport {
    // Tokenized once per case, shared by every scope expectation.
    let mut tokenized: Option<Vec<TokenizedLine>> = None;

    let results = case
        .expectations
        .iter()
        .map(|expectation| match expectation {
            Expectation::Pattern(pattern) => check_pattern(case, pattern, registry),
            Expectation::Scope(scope) => {
                let Some(tokenizer) = tokenizer else {
                    return ExpectationReport::Configuration {
                        message: "scope expectation but no tokenizer configured".to_string(),
                    };
                };
                let lines = tokenized
                    .get_or_insert_with(|| tokenize_input(tokenizer, &case.input));
                ExpectationReport::Scope {
                    assertions: resolve_tree(&scope.assertions, lines),
                }
            }
        })
        .collect();

    CaseReport {
        name: case.name.clone(),
        results,
    }
}

fn check_pattern(
    case: &TestCase,
    expectation: &PatternExpectation,
    registry: &PatternRegistry,
) -> ExpectationReport {
    let Some(pattern) = registry.lookup(&expectation.pattern) else {
        return ExpectationReport::Configuration {
            message: format!("unknown pattern '{}'", expectation.pattern),
        };
    };

    let captures = pattern.captures(&case.input);

    let outcome = match (&captures, expectation.should_match) {
        (None, true) => PatternOutcome::Fail {
            expected: "a match".to_string(),
            actual: "no match".to_string(),
        },
        (Some(_), false) => PatternOutcome::Fail {
            expected: "no match".to_string(),
            actual: "a match".to_string(),
        },
        (None, false) => PatternOutcome::Pass,
        (Some(captures), true) => check_captures(expectation, captures),
    };

    ExpectationReport::Pattern {
        pattern: expectation.pattern.clone(),
        outcome,
    }
}

fn check_captures(
    expectation: &PatternExpectation,
    captures: &regex::Captures<'_>,
) -> PatternOutcome {
    for expected in &expectation.captures {
        let actual = captures.get(expected.group).map(|m| m.as_str());
        match (&expected.value, actual) {
            (CaptureValue::Unset, None) => {}
            (CaptureValue::Unset, Some(actual)) => {
                return PatternOutcome::Fail {
                    expected: format!("group {} unset", expected.group),
                    actual: format!("'{}'", actual),
                };
            }
            (CaptureValue::Text(value), Some(actual)) if actual == value => {}
            (CaptureValue::Text(value), Some(actual)) => {
                return PatternOutcome::Fail {
                    expected: format!("group {} = '{}'", expected.group, value),
                    actual: format!("'{}'", actual),
                };
            }
            (CaptureValue::Text(value), None) => {
                return PatternOutcome::Fail {
                    expected: format!("group {} = '{}'", expected.group, value),
                    actual: "unset".to_string(),
                };
            }
        }
    }
    PatternOutcome::Pass
}
