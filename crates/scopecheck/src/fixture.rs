// fixture.rs
//
// The fixture DSL: `#+NAME:` / `#+BEGIN_FIXTURE` / `#+END_FIXTURE` /
// `#+EXPECTED:` directives, parsed leniently. Fixture authors iterate
// rapidly, so malformed constructs are skipped instead of failing the whole
// file.


/// One self-contained fixture: a name, verbatim input text, and the
/// expectations declared against that input.
///
/// All `#+EXPECTED:` blocks following one fixture container attach to the
/// same case, in declared order. Names need not be unique within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub expectations: Vec<Expectation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    Pattern(PatternExpectation),
    Scope(ScopeExpectation),
}

/// Expectation that a named pattern does (or does not) match the input.
///
/// Invariant: `captures` is empty when `should_match` is false. The parser
/// enforces this by ignoring capture rows in a `no-match` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternExpectation {
    pub pattern: String,
    pub should_match: bool,
    pub captures: Vec<ExpectedCapture>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedCapture {
    pub group: usize,
    pub value: CaptureValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureValue {
    Text(String),
    /// The group did not participate in the match (`undefined` in the DSL).
    Unset,
}

/// Expectation over tokenizer output: a forest of scope assertions.
///
/// A flat expectation is simply a forest of childless roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeExpectation {
    pub assertions: Vec<ScopeAssertion>,
}

/// One `<text> => <scope-list>` line. A child assertion's search space is
/// restricted to its parent's resolved span on the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeAssertion {
    pub text: String,
    pub must_contain: Vec<String>,
    pub must_not_contain: Vec<String>,
    pub children: Vec<ScopeAssertion>,
}

const NAME_DIRECTIVE: &str = "#+name:";
const BEGIN_DIRECTIVE: &str = "#+begin_fixture";
const END_DIRECTIVE: &str = "#+end_fixture";
const EXPECTED_DIRECTIVE: &str = "#+expected:";

/// Marker word that makes an `#+EXPECTED:` block a scope expectation rather
/// than a pattern expectation.
const SCOPE_MARKER: &str = "scopes";

fn is_directive(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    lower.starts_with(NAME_DIRECTIVE)
        || lower.starts_with(BEGIN_DIRECTIVE)
        || lower.starts_with(EXPECTED_DIRECTIVE)
}

fn directive_value<'a>(line: &'a str, directive: &str) -> Option<&'a str> {
    let trimmed = line.trim();
    match trimmed.get(..directive.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(directive) => {
            Some(trimmed[directive.len()..].trim())
        }
        _ => None,
    }
}

/// Parse a fixture file into an ordered sequence of test cases.
///
/// Pure and deterministic; never fails. Dangling names, unclosed containers
/// and malformed body lines are dropped.
pub fn parse(content: &str) -> Vec<TestCase> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut cases = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(name) = directive_value(lines[i], NAME_DIRECTIVE) else {
            i += 1;
            continue;
        };

        // A name only counts if the very next line opens the container.
        let begin = i + 1;
        if begin >= lines.len() || directive_value(lines[begin], BEGIN_DIRECTIVE).is_none() {
            i += 1;
            continue;
        }

        // Capture everything verbatim until the literal close directive.
        // Container-like text inside (e.g. an unrelated code block) is not
        // special.
        let content_start = begin + 1;
        let mut content_end = None;
        for (j, line) in lines.iter().enumerate().skip(content_start) {
            if directive_value(line, END_DIRECTIVE).is_some() {
                content_end = Some(j);
                break;
            }
        }
        let Some(content_end) = content_end else {
            // Unclosed container discards the whole case.
            break;
        };

        let input = lines[content_start..content_end].join("\n");
        let mut j = content_end + 1;
        while j < lines.len() && lines[j].trim().is_empty() {
            j += 1;
        }

        let mut expectations = Vec::new();
        while j < lines.len() {
            let Some(header) = directive_value(lines[j], EXPECTED_DIRECTIVE) else {
                break;
            };
            let (expectation, block_end) = parse_expectation_block(header, &lines, j + 1);
            if let Some(expectation) = expectation {
                expectations.push(expectation);
            }
            j = block_end;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
        }

        cases.push(TestCase {
            name: name.to_string(),
            input,
            expectations,
        });
        i = j.max(content_end + 1);
    }

    cases
}

/// Parse one expectation block body starting at `start`. Returns the parsed
/// expectation (None when the header is empty) and the index of the first
/// line after the block.
fn parse_expectation_block(
    header: &str,
    lines: &[&str],
    start: usize,
) -> (Option<Expectation>, usize) {
    let mut end = start;
    while end < lines.len() && !is_directive(lines[end]) {
        end += 1;
    }
    let body = &lines[start..end];

    if header.is_empty() {
        return (None, end);
    }

    let expectation = if header.eq_ignore_ascii_case(SCOPE_MARKER) {
        Expectation::Scope(ScopeExpectation {
            assertions: parse_assertions(body),
        })
    } else {
        Expectation::Pattern(parse_pattern_body(header, body))
    };

    (Some(expectation), end)
}

fn parse_pattern_body(pattern: &str, body: &[&str]) -> PatternExpectation {
    let mut should_match = true;
    let mut captures = Vec::new();

    for line in body {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("no-match") {
            should_match = false;
        } else if trimmed.starts_with('|') {
            if let Some(capture) = parse_capture_row(trimmed) {
                captures.push(capture);
            }
        }
    }

    // A no-match expectation carries no captures.
    if !should_match {
        captures.clear();
    }

    PatternExpectation {
        pattern: pattern.to_string(),
        should_match,
        captures,
    }
}

/// Parse a `| group# | value |` row. Header rows (`Group #` first cell) and
/// dash separators fail the numeric parse and are dropped.
fn parse_capture_row(row: &str) -> Option<ExpectedCapture> {
    let parts: Vec<&str> = row.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let group = parts[1].parse::<usize>().ok()?;
    let value = if parts[2] == "undefined" {
        CaptureValue::Unset
    } else {
        CaptureValue::Text(parts[2].to_string())
    };
    Some(ExpectedCapture { group, value })
}

/// Parse scope assertion lines into a forest. Indentation deeper than the
/// previous assertion makes a line a child of that assertion.
fn parse_assertions(body: &[&str]) -> Vec<ScopeAssertion> {
    let mut roots: Vec<ScopeAssertion> = Vec::new();
    let mut stack: Vec<(usize, ScopeAssertion)> = Vec::new();

    fn attach(popped: ScopeAssertion, stack: &mut [(usize, ScopeAssertion)], roots: &mut Vec<ScopeAssertion>) {
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(popped),
            None => roots.push(popped),
        }
    }

    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let Some(assertion) = parse_assertion_line(line.trim()) else {
            continue;
        };

        while let Some((top_indent, _)) = stack.last() {
            if *top_indent >= indent {
                let (_, popped) = stack.pop().unwrap();
                attach(popped, &mut stack, &mut roots);
            } else {
                break;
            }
        }
        stack.push((indent, assertion));
    }

    while let Some((_, popped)) = stack.pop() {
        attach(popped, &mut stack, &mut roots);
    }

    roots
}

/// Parse one `<text> => <scope-list>` line. Returns None for malformed lines
/// (no arrow, empty text, unquoted text with internal whitespace, empty
/// scope list).
fn parse_assertion_line(line: &str) -> Option<ScopeAssertion> {
    let (raw_text, rest) = if let Some(stripped) = line.strip_prefix('"') {
        let close = stripped.find('"')?;
        (&stripped[..close], stripped[close + 1..].trim_start())
    } else {
        let arrow = line.find("=>")?;
        (line[..arrow].trim_end(), &line[arrow..])
    };

    if raw_text.is_empty() || (!line.starts_with('"') && raw_text.contains(char::is_whitespace)) {
        return None;
    }

    let scope_list = rest.strip_prefix("=>")?.trim();
    let mut must_contain = Vec::new();
    let mut must_not_contain = Vec::new();
    for entry in scope_list.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.strip_prefix('!') {
            Some(forbidden) => must_not_contain.push(forbidden.trim().to_string()),
            None => must_contain.push(entry.to_string()),
        }
    }
    if must_contain.is_empty() && must_not_contain.is_empty() {
        return None;
    }

    Some(ScopeAssertion {
        text: raw_text.to_string(),
        must_contain,
        must_not_contain,
        children: Vec::new(),
    })
}

/// Re-serialize test cases into canonical fixture text.
///
/// `parse(&serialize(&parse(x))) == parse(x)` for any fixture whose input
/// lines are not themselves directives.
pub fn serialize(cases: &[TestCase]) -> String {
    let mut out = String::new();
    for case in cases {
        out.push_str("#+NAME: ");
        out.push_str(&case.name);
        out.push_str("\n#+BEGIN_FIXTURE\n");
        out.push_str(&case.input);
        out.push_str("\n#+END_FIXTURE\n");
        for expectation in &case.expectations {
            match expectation {
                Expectation::Pattern(p) => {
                    out.push_str("#+EXPECTED: ");
                    out.push_str(&p.pattern);
                    out.push('\n');
                    if !p.should_match {
                        out.push_str("no-match\n");
                    }
                    for capture in &p.captures {
                        let value = match &capture.value {
                            CaptureValue::Text(text) => text.as_str(),
                            CaptureValue::Unset => "undefined",
                        };
                        out.push_str(&format!("| {} | {} |\n", capture.group, value));
                    }
                }
                Expectation::Scope(s) => {
                    out.push_str("#+EXPECTED: scopes\n");
                    for assertion in &s.assertions {
                        serialize_assertion(assertion, 0, &mut out);
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

fn serialize_assertion(assertion: &ScopeAssertion, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    if assertion.text.contains(char::is_whitespace) {
        out.push('"');
        out.push_str(&assertion.text);
        out.push('"');
    } else {
        out.push_str(&assertion.text);
    }
    out.push_str(" => ");
    let mut entries: Vec<String> = assertion.must_contain.clone();
    entries.extend(assertion.must_not_contain.iter().map(|s| format!("!{}", s)));
    out.push_str(&entries.join(", "));
    out.push('\n');
    for child in &assertion.children {
        serialize_assertion(child, depth + 1, out);
    }
}
