// resolver.rs
//
// Resolves one scope assertion against tokenized output: find every literal
// occurrence of the assertion text, aggregate the scopes of the spans
// covering it, and pick the best admissible candidate deterministically.

use std::collections::BTreeSet;

use crate::fixture::ScopeAssertion;
use crate::tokenizer::TokenizedLine;


/// A resolved region of one line: byte offsets within `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Region {
    fn contains(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Successful resolution: where the assertion text matched and the scope
/// context it matched under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub region: Region,
    /// Scopes present on every span covering the occurrence.
    pub intersection: BTreeSet<String>,
    /// Scopes present on any span touching the occurrence.
    pub union: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// The assertion text never occurs in the searched region.
    NotFound,
    /// The text occurs, but no occurrence satisfies the constraints. Carries
    /// the best inadmissible candidate for diagnostics.
    Unsatisfied {
        region: Region,
        intersection: BTreeSet<String>,
        union: BTreeSet<String>,
        /// Required scopes absent from the union.
        missing: Vec<String>,
        /// Forbidden scopes present in the intersection.
        forbidden: Vec<String>,
    },
}

/// Ephemeral value: one occurrence of the assertion text together with the
/// aggregated scopes of the spans covering it.
#[derive(Debug)]
struct Candidate {
    region: Region,
    intersection: BTreeSet<String>,
    union: BTreeSet<String>,
    exactly_aligned: bool,
}

/// Resolve a single assertion. `parent` restricts the search to one region of
/// one line (tree mode); `None` searches every line.
pub fn resolve(
    assertion: &ScopeAssertion,
    lines: &[TokenizedLine],
    parent: Option<Region>,
) -> Result<Resolution, ResolveFailure> {
    let candidates = collect_candidates(&assertion.text, lines, parent);
    if candidates.is_empty() {
        return Err(ResolveFailure::NotFound);
    }

    // Candidates are generated in (line, column) order, so the first
    // admissible one already wins the positional tie-break; alignment is the
    // stronger preference.
    let admissible = |c: &&Candidate| {
        assertion
            .must_not_contain
            .iter()
            .all(|s| !c.intersection.contains(s))
            && assertion.must_contain.iter().all(|s| c.union.contains(s))
    };

    let chosen = candidates
        .iter()
        .filter(admissible)
        .find(|c| c.exactly_aligned)
        .or_else(|| candidates.iter().find(admissible));

    if let Some(chosen) = chosen {
        return Ok(Resolution {
            region: chosen.region,
            intersection: chosen.intersection.clone(),
            union: chosen.union.clone(),
        });
    }

    // Diagnose the best inadmissible candidate: prefer an aligned one.
    let best = candidates
        .iter()
        .find(|c| c.exactly_aligned)
        .unwrap_or(&candidates[0]);
    let missing: Vec<String> = assertion
        .must_contain
        .iter()
        .filter(|s| !best.union.contains(*s))
        .cloned()
        .collect();
    let forbidden: Vec<String> = assertion
        .must_not_contain
        .iter()
        .filter(|s| best.intersection.contains(*s))
        .cloned()
        .collect();
    Err(ResolveFailure::Unsatisfied {
        region: best.region,
        intersection: best.intersection.clone(),
        union: best.union.clone(),
        missing,
        forbidden,
    })
}

/// Find every occurrence of `needle` (overlapping ones included) and
/// aggregate the spans covering each into a candidate.
fn collect_candidates(
    needle: &str,
    lines: &[TokenizedLine],
    parent: Option<Region>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if needle.is_empty() {
        return candidates;
    }

    for (line_number, line) in lines.iter().enumerate() {
        if let Some(parent) = parent {
            if parent.line != line_number {
                continue;
            }
        }

        for (start, _) in line.text.char_indices() {
            if !line.text[start..].starts_with(needle) {
                continue;
            }
            let end = start + needle.len();
            if let Some(parent) = parent {
                if !parent.contains(start, end) {
                    continue;
                }
            }

            let overlapping: Vec<_> = line
                .spans
                .iter()
                .filter(|span| span.start < end && span.end > start)
                .collect();
            if overlapping.is_empty() {
                continue;
            }

            let mut intersection: BTreeSet<String> =
                overlapping[0].scopes.iter().cloned().collect();
            let mut union = BTreeSet::new();
            for span in &overlapping {
                let scopes: BTreeSet<String> = span.scopes.iter().cloned().collect();
                intersection.retain(|s| scopes.contains(s));
                union.extend(scopes);
            }
            let exactly_aligned = overlapping
                .iter()
                .filter(|span| span.start == start && span.end == end)
                .count()
                == 1;

            candidates.push(Candidate {
                region: Region {
                    line: line_number,
                    start,
                    end,
                },
                intersection,
                union,
                exactly_aligned,
            });
        }
    }

    candidates
}

/// Outcome of one assertion inside a tree evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionOutcome {
    Resolved(Resolution),
    Failed(ResolveFailure),
    /// The parent assertion did not resolve, so this node had no region to
    /// anchor to.
    ParentUnresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub text: String,
    pub must_contain: Vec<String>,
    pub must_not_contain: Vec<String>,
    pub outcome: AssertionOutcome,
}

/// Evaluate a forest of assertions depth-first, anchoring each child to its
/// parent's resolved region. Every node is evaluated and reported; a failure
/// never short-circuits its siblings.
pub fn resolve_tree(roots: &[ScopeAssertion], lines: &[TokenizedLine]) -> Vec<AssertionResult> {
    let mut results = Vec::new();
    for root in roots {
        resolve_node(root, lines, None, &mut results);
    }
    results
}

fn resolve_node(
    assertion: &ScopeAssertion,
    lines: &[TokenizedLine],
    parent: Option<Region>,
    results: &mut Vec<AssertionResult>,
) {
    let outcome = match resolve(assertion, lines, parent) {
        Ok(resolution) => {
            let region = resolution.region;
            results.push(result_for(assertion, AssertionOutcome::Resolved(resolution)));
            for child in &assertion.children {
                resolve_node(child, lines, Some(region), results);
            }
            return;
        }
        Err(failure) => AssertionOutcome::Failed(failure),
    };

    results.push(result_for(assertion, outcome));
    for child in &assertion.children {
        mark_unresolved(child, results);
    }
}

fn mark_unresolved(assertion: &ScopeAssertion, results: &mut Vec<AssertionResult>) {
    results.push(result_for(assertion, AssertionOutcome::ParentUnresolved));
    for child in &assertion.children {
        mark_unresolved(child, results);
    }
}

fn result_for(assertion: &ScopeAssertion, outcome: AssertionOutcome) -> AssertionResult {
    AssertionResult {
        text: assertion.text.clone(),
        must_contain: assertion.must_contain.clone(),
        must_not_contain: assertion.must_not_contain.clone(),
        outcome,
    }
}
