// grammar.rs
//
// A reference tokenizer so the CLI and the integration tests can exercise
// scope expectations end to end. The grammar is a JSON file: single-line
// match rules with numbered capture scopes, plus begin/end block rules whose
// state (the currently open block, if any) carries across lines. Blocks do
// not nest; a begin-looking line inside an open block is plain content. This
// is the collaborator side of the `Tokenizer` seam, not part of the
// resolution core.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::tokenizer::{TokenSpan, Tokenizer};

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grammar {
    /// Root scope, outermost on every span (e.g. `text.org`).
    pub scope_name: String,
    #[serde(default)]
    pub patterns: Vec<MatchRule>,
    #[serde(default)]
    pub blocks: Vec<BlockRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRule {
    #[serde(rename = "match")]
    pub pattern: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Capture group number (as a string key, TextMate style) to scope name.
    #[serde(default)]
    pub captures: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRule {
    pub begin: String,
    pub end: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Scope added to the lines between begin and end.
    #[serde(default)]
    pub content_name: Option<String>,
    #[serde(default)]
    pub begin_captures: HashMap<String, String>,
    #[serde(default)]
    pub end_captures: HashMap<String, String>,
}

impl Grammar {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse grammar JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read grammar: {}", path.display()))?;
        Self::from_json(&content)
    }
}

#[derive(Debug)]
struct CompiledMatch {
    regex: Regex,
    name: Option<String>,
    /// (group number, scope), sorted by group number.
    captures: Vec<(usize, String)>,
}

#[derive(Debug)]
struct CompiledBlock {
    begin: Regex,
    end: Regex,
    name: Option<String>,
    content_name: Option<String>,
    begin_captures: Vec<(usize, String)>,
    end_captures: Vec<(usize, String)>,
}

#[derive(Debug)]
pub struct GrammarTokenizer {
    root: String,
    patterns: Vec<CompiledMatch>,
    blocks: Vec<CompiledBlock>,
}

fn compile_captures(captures: &HashMap<String, String>) -> Vec<(usize, String)> {
    let mut compiled: Vec<(usize, String)> = captures
        .iter()
        .filter_map(|(key, scope)| key.parse::<usize>().ok().map(|n| (n, scope.clone())))
        .collect();
    compiled.sort_by_key(|(n, _)| *n);
    compiled
}

impl GrammarTokenizer {
    pub fn new(grammar: &Grammar) -> Result<Self> {
        let patterns = grammar
            .patterns
            .iter()
            .map(|rule| {
                Ok(CompiledMatch {
                    regex: Regex::new(&rule.pattern)
                        .with_context(|| format!("Invalid match pattern: {}", rule.pattern))?,
                    name: rule.name.clone(),
                    captures: compile_captures(&rule.captures),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let blocks = grammar
            .blocks
            .iter()
            .map(|rule| {
                Ok(CompiledBlock {
                    begin: Regex::new(&rule.begin)
                        .with_context(|| format!("Invalid begin pattern: {}", rule.begin))?,
                    end: Regex::new(&rule.end)
                        .with_context(|| format!("Invalid end pattern: {}", rule.end))?,
                    name: rule.name.clone(),
                    content_name: rule.content_name.clone(),
                    begin_captures: compile_captures(&rule.begin_captures),
                    end_captures: compile_captures(&rule.end_captures),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GrammarTokenizer {
            root: grammar.scope_name.clone(),
            patterns,
            blocks,
        })
    }

    fn base_scopes(&self, state: Option<usize>) -> Vec<String> {
        let mut scopes = vec![self.root.clone()];
        if let Some(index) = state {
            if let Some(name) = &self.blocks[index].name {
                scopes.push(name.clone());
            }
        }
        scopes
    }

    /// Spans for one matched rule: the capture groups get their own scope,
    /// the rest of the match gets the rule scope. Captures overlapped by an
    /// earlier capture are dropped so spans stay non-overlapping.
    fn match_spans(
        &self,
        line_number: usize,
        captures: &regex::Captures<'_>,
        base: &[String],
        name: Option<&String>,
        capture_scopes: &[(usize, String)],
        spans: &mut Vec<TokenSpan>,
    ) {
        let overall = captures.get(0).expect("group 0 always participates");
        let mut match_scopes = base.to_vec();
        if let Some(name) = name {
            match_scopes.push(name.clone());
        }

        let mut ordered: Vec<(usize, usize, &String)> = capture_scopes
            .iter()
            .filter_map(|(group, scope)| {
                captures.get(*group).map(|m| (m.start(), m.end(), scope))
            })
            .filter(|(start, end, _)| start < end)
            .collect();
        ordered.sort_by_key(|(start, _, _)| *start);

        let mut cursor = overall.start();
        for (start, end, scope) in ordered {
            if start < cursor {
                continue;
            }
            push_span(spans, line_number, cursor, start, match_scopes.clone());
            let mut capture_span = match_scopes.clone();
            capture_span.push(scope.clone());
            push_span(spans, line_number, start, end, capture_span);
            cursor = end;
        }
        push_span(spans, line_number, cursor, overall.end(), match_scopes);
    }

    fn tokenize_with_patterns(
        &self,
        line: &str,
        line_number: usize,
        base: &[String],
        spans: &mut Vec<TokenSpan>,
    ) {
        let mut pos = 0;
        while pos < line.len() {
            let earliest = self
                .patterns
                .iter()
                .filter_map(|rule| {
                    rule.regex
                        .captures_at(line, pos)
                        .map(|captures| (captures.get(0).unwrap().start(), rule, captures))
                })
                .min_by_key(|(start, _, _)| *start);

            let Some((start, rule, captures)) = earliest else {
                break;
            };
            push_span(spans, line_number, pos, start, base.to_vec());
            let end = captures.get(0).unwrap().end();
            self.match_spans(
                line_number,
                &captures,
                base,
                rule.name.as_ref(),
                &rule.captures,
                spans,
            );
            // Zero-width matches must not stall the scan.
            pos = if end > start { end } else { next_char_boundary(line, start) };
        }
        push_span(spans, line_number, pos, line.len(), base.to_vec());
    }
}

fn push_span(spans: &mut Vec<TokenSpan>, line: usize, start: usize, end: usize, scopes: Vec<String>) {
    if start < end {
        spans.push(TokenSpan {
            line,
            start,
            end,
            scopes,
        });
    }
}

fn next_char_boundary(line: &str, pos: usize) -> usize {
    let mut next = pos + 1;
    while next < line.len() && !line.is_char_boundary(next) {
        next += 1;
    }
    next
}

impl Tokenizer for GrammarTokenizer {
    /// Index of the open block, if any.
    type State = Option<usize>;

    fn initial_state(&self) -> Self::State {
        None
    }

    fn tokenize_line(
        &self,
        line: &str,
        line_number: usize,
        mut state: Self::State,
    ) -> (Vec<TokenSpan>, Self::State) {
        let mut spans = Vec::new();

        if let Some(open) = state {
            let block = &self.blocks[open];
            if let Some(captures) = block.end.captures(line) {
                // Closing line: end captures under the block scope, the
                // remainder under the parent context.
                let base = self.base_scopes(state);
                let overall = captures.get(0).expect("group 0 always participates");
                let mut content = base.clone();
                if let Some(content_name) = &block.content_name {
                    content.push(content_name.clone());
                }
                push_span(&mut spans, line_number, 0, overall.start(), content);
                self.match_spans(
                    line_number,
                    &captures,
                    &base,
                    None,
                    &block.end_captures,
                    &mut spans,
                );
                state = None;
                let parent_base = self.base_scopes(state);
                push_span(&mut spans, line_number, overall.end(), line.len(), parent_base);
            } else {
                let mut content = self.base_scopes(state);
                if let Some(content_name) = &block.content_name {
                    content.push(content_name.clone());
                }
                push_span(&mut spans, line_number, 0, line.len(), content);
            }
            return (spans, state);
        }

        for (index, block) in self.blocks.iter().enumerate() {
            if let Some(captures) = block.begin.captures(line) {
                state = Some(index);
                let base = self.base_scopes(state);
                let overall = captures.get(0).expect("group 0 always participates");
                push_span(&mut spans, line_number, 0, overall.start(), base.clone());
                self.match_spans(
                    line_number,
                    &captures,
                    &base,
                    None,
                    &block.begin_captures,
                    &mut spans,
                );
                push_span(&mut spans, line_number, overall.end(), line.len(), base);
                return (spans, state);
            }
        }

        let base = self.base_scopes(state);
        self.tokenize_with_patterns(line, line_number, &base, &mut spans);
        (spans, state)
    }
}
