use super::*;
use crate::tokenizer::tokenize_input;

fn org_grammar() -> GrammarTokenizer {
    let grammar = Grammar::from_json(
        r#"{
            "scopeName": "text.org",
            "patterns": [
                {
                    "match": "^(\\*+)\\s.*$",
                    "name": "markup.heading.org",
                    "captures": { "1": "punctuation.definition.heading.org" }
                },
                {
                    "match": "(\\*)([^*]+)(\\*)",
                    "name": "markup.bold.org",
                    "captures": {
                        "1": "punctuation.definition.bold.org",
                        "3": "punctuation.definition.bold.org"
                    }
                }
            ],
            "blocks": [
                {
                    "begin": "^#\\+BEGIN_SRC\\b.*$",
                    "end": "^#\\+END_SRC\\s*$",
                    "name": "meta.block.begin-end.src.org",
                    "contentName": "markup.block.src.org",
                    "beginCaptures": { "0": "keyword.control.block.org" },
                    "endCaptures": { "0": "keyword.control.block.org" }
                }
            ]
        }"#,
    )
    .unwrap();
    GrammarTokenizer::new(&grammar).unwrap()
}

fn assert_covers_line(spans: &[crate::TokenSpan], line_len: usize) {
    assert!(!spans.is_empty());
    assert_eq!(spans[0].start, 0);
    assert_eq!(spans.last().unwrap().end, line_len);
    for pair in spans.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "spans must be contiguous");
    }
    for span in spans {
        assert!(!span.scopes.is_empty());
        assert_eq!(span.scopes[0], "text.org", "root scope is outermost");
    }
}

#[test]
fn test_plain_line_is_one_root_span() {
    let tokenizer = org_grammar();
    let lines = tokenize_input(&tokenizer, "just prose");
    assert_eq!(lines.len(), 1);
    assert_covers_line(&lines[0].spans, "just prose".len());
    assert_eq!(lines[0].spans.len(), 1);
    assert_eq!(lines[0].spans[0].scopes, vec!["text.org".to_string()]);
}

#[test]
fn test_headline_captures_split_spans() {
    let tokenizer = org_grammar();
    let lines = tokenize_input(&tokenizer, "* A headline");
    let spans = &lines[0].spans;
    assert_covers_line(spans, "* A headline".len());

    assert_eq!(spans[0].start, 0);
    assert_eq!(spans[0].end, 1);
    assert!(spans[0]
        .scopes
        .contains(&"punctuation.definition.heading.org".to_string()));
    assert!(spans[1].scopes.contains(&"markup.heading.org".to_string()));
    assert!(!spans[1]
        .scopes
        .contains(&"punctuation.definition.heading.org".to_string()));
}

#[test]
fn test_inline_bold_in_prose() {
    let tokenizer = org_grammar();
    let lines = tokenize_input(&tokenizer, "some *bold* text");
    let spans = &lines[0].spans;
    assert_covers_line(spans, "some *bold* text".len());

    let bold = spans
        .iter()
        .find(|s| s.start == 6 && s.end == 10)
        .expect("span for the bold word");
    assert_eq!(
        bold.scopes,
        vec!["text.org".to_string(), "markup.bold.org".to_string()]
    );

    let opener = spans.iter().find(|s| s.start == 5 && s.end == 6).unwrap();
    assert!(opener
        .scopes
        .contains(&"punctuation.definition.bold.org".to_string()));

    // Prose before the markup carries only the root scope.
    assert_eq!(spans[0].scopes, vec!["text.org".to_string()]);
}

#[test]
fn test_block_state_threads_across_lines() {
    let tokenizer = org_grammar();
    let input = "#+BEGIN_SRC python\nprint(1)\n#+END_SRC\nafter";
    let lines = tokenize_input(&tokenizer, input);
    assert_eq!(lines.len(), 4);

    let begin = &lines[0].spans;
    assert_covers_line(begin, "#+BEGIN_SRC python".len());
    assert!(begin[0].scopes.contains(&"keyword.control.block.org".to_string()));
    assert!(begin[0]
        .scopes
        .contains(&"meta.block.begin-end.src.org".to_string()));

    // The content line is inside the block even though nothing on the line
    // says so: state carried over.
    let content = &lines[1].spans;
    assert_eq!(content.len(), 1);
    assert_eq!(
        content[0].scopes,
        vec![
            "text.org".to_string(),
            "meta.block.begin-end.src.org".to_string(),
            "markup.block.src.org".to_string(),
        ]
    );

    let end = &lines[2].spans;
    assert!(end[0].scopes.contains(&"keyword.control.block.org".to_string()));

    // After the close the block scope is gone.
    let after = &lines[3].spans;
    assert_eq!(after[0].scopes, vec!["text.org".to_string()]);
}

#[test]
fn test_begin_line_inside_open_block_is_content() {
    let tokenizer = org_grammar();
    let input = "#+BEGIN_SRC python\n#+BEGIN_SRC inner\n#+END_SRC\nafter";
    let lines = tokenize_input(&tokenizer, input);

    // Blocks do not nest: a begin-looking line inside an open block is plain
    // content, and the first end line closes the block.
    let inner = &lines[1].spans;
    assert_eq!(inner.len(), 1);
    assert_eq!(
        inner[0].scopes,
        vec![
            "text.org".to_string(),
            "meta.block.begin-end.src.org".to_string(),
            "markup.block.src.org".to_string(),
        ]
    );

    assert!(lines[2].spans[0]
        .scopes
        .contains(&"keyword.control.block.org".to_string()));
    assert_eq!(lines[3].spans[0].scopes, vec!["text.org".to_string()]);
}

#[test]
fn test_empty_line_has_no_spans() {
    let tokenizer = org_grammar();
    let lines = tokenize_input(&tokenizer, "a\n\nb");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].spans.is_empty());
}

#[test]
fn test_invalid_grammar_regex_is_an_error() {
    let grammar = Grammar::from_json(
        r#"{ "scopeName": "text.org", "patterns": [ { "match": "(unclosed" } ] }"#,
    )
    .unwrap();
    assert!(GrammarTokenizer::new(&grammar).is_err());
}

#[test]
fn test_malformed_grammar_json_is_an_error() {
    assert!(Grammar::from_json("{").is_err());
    assert!(Grammar::from_json(r#"{ "patterns": [] }"#).is_err(), "scopeName is required");
}
