mod fixture;
mod grammar;
mod registry;
mod report;
mod resolver;
mod runner;
mod tokenizer;

pub use fixture::{
    CaptureValue, Expectation, ExpectedCapture, PatternExpectation, ScopeAssertion,
    ScopeExpectation, TestCase, parse, serialize,
};
pub use grammar::{BlockRule, Grammar, GrammarTokenizer, MatchRule};
pub use registry::PatternRegistry;
pub use report::{CaseReport, ExpectationReport, PatternOutcome};
pub use resolver::{
    AssertionOutcome, AssertionResult, Region, ResolveFailure, Resolution, resolve, resolve_tree,
};
pub use runner::{run, run_case};
pub use tokenizer::{TokenSpan, TokenizedLine, Tokenizer, tokenize_input};
