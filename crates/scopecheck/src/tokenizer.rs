// tokenizer.rs
//
// The boundary between the harness and whatever tokenizer engine is under
// test. The harness never inspects tokenizer state; it only threads it
// forward line by line, because context opened on line N affects line N+1.

/// A contiguous range of one input line annotated with its scope stack.
///
/// `start` and `end` are byte offsets within the line. `scopes` is ordered
/// outermost to innermost and is never empty for a well-behaved tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
    pub scopes: Vec<String>,
}

/// A stateful line tokenizer.
///
/// One input line yields an ordered, non-overlapping, contiguous sequence of
/// spans covering the whole line. The state returned for line N must be fed
/// into line N+1; the harness treats it as an opaque carry value.
pub trait Tokenizer {
    type State;

    fn initial_state(&self) -> Self::State;

    fn tokenize_line(
        &self,
        line: &str,
        line_number: usize,
        state: Self::State,
    ) -> (Vec<TokenSpan>, Self::State);
}

/// One input line together with the spans the tokenizer produced for it.
#[derive(Debug, Clone)]
pub struct TokenizedLine {
    pub text: String,
    pub spans: Vec<TokenSpan>,
}

/// Tokenize a full (possibly multi-line) input, threading state sequentially.
pub fn tokenize_input<T: Tokenizer>(tokenizer: &T, input: &str) -> Vec<TokenizedLine> {
    let mut state = tokenizer.initial_state();
    let mut lines = Vec::new();

    for (line_number, text) in input.split('\n').enumerate() {
        let (spans, next_state) = tokenizer.tokenize_line(text, line_number, state);
        state = next_state;
        lines.push(TokenizedLine {
            text: text.to_string(),
            spans,
        });
    }

    lines
}
