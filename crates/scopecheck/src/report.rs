// report.rs

use std::fmt;

use crate::resolver::{AssertionOutcome, AssertionResult, ResolveFailure};

/// Result of running every expectation of one test case.
#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub results: Vec<ExpectationReport>,
}

impl CaseReport {
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.passed())
    }
}

#[derive(Debug)]
pub enum ExpectationReport {
    Pattern {
        pattern: String,
        outcome: PatternOutcome,
    },
    Scope {
        assertions: Vec<AssertionResult>,
    },
    /// A broken fixture rather than a wrong tokenizer: unknown pattern name,
    /// missing grammar, and the like.
    Configuration { message: String },
}

impl ExpectationReport {
    pub fn passed(&self) -> bool {
        match self {
            ExpectationReport::Pattern { outcome, .. } => {
                matches!(outcome, PatternOutcome::Pass)
            }
            ExpectationReport::Scope { assertions } => assertions
                .iter()
                .all(|a| matches!(a.outcome, AssertionOutcome::Resolved(_))),
            ExpectationReport::Configuration { .. } => false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PatternOutcome {
    Pass,
    Fail { expected: String, actual: String },
}

impl fmt::Display for ExpectationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectationReport::Pattern { pattern, outcome } => match outcome {
                PatternOutcome::Pass => write!(f, "pattern '{}': pass", pattern),
                PatternOutcome::Fail { expected, actual } => write!(
                    f,
                    "pattern '{}': expected {}, got {}",
                    pattern, expected, actual
                ),
            },
            ExpectationReport::Scope { assertions } => {
                let mut first = true;
                for assertion in assertions {
                    if !first {
                        writeln!(f)?;
                    }
                    first = false;
                    write!(f, "{}", assertion)?;
                }
                Ok(())
            }
            ExpectationReport::Configuration { message } => {
                write!(f, "configuration error: {}", message)
            }
        }
    }
}

impl fmt::Display for AssertionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self;
        match &result.outcome {
            AssertionOutcome::Resolved(resolution) => write!(
                f,
                "'{}' resolved at {}:{}..{}",
                result.text,
                resolution.region.line + 1,
                resolution.region.start,
                resolution.region.end
            ),
            AssertionOutcome::Failed(ResolveFailure::NotFound) => {
                write!(f, "'{}' not found in input", result.text)
            }
            AssertionOutcome::Failed(ResolveFailure::Unsatisfied {
                region,
                union,
                missing,
                forbidden,
                ..
            }) => {
                write!(
                    f,
                    "'{}' at {}:{}..{} does not satisfy scopes:",
                    result.text,
                    region.line + 1,
                    region.start,
                    region.end
                )?;
                if !missing.is_empty() {
                    write!(f, " missing [{}]", missing.join(", "))?;
                }
                if !forbidden.is_empty() {
                    write!(f, " forbidden [{}]", forbidden.join(", "))?;
                }
                let available: Vec<&str> = union.iter().map(String::as_str).collect();
                write!(f, " (available: {})", available.join(", "))
            }
            AssertionOutcome::ParentUnresolved => {
                write!(f, "'{}' skipped: parent assertion did not resolve", result.text)
            }
        }
    }
}
