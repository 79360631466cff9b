//! Merge per-file diagram fragments into one consistent diagram.
//!
//! Each fragment arrives as a complete little flowchart with its own
//! `graph TD` (or `graph LR`) header. Concatenating them naively would
//! produce duplicate headers, repeated styling boilerplate, and one node
//! per *mention* of an entity instead of one per entity line. The merge is
//! therefore: strip each fragment's leading header, trim every line, and
//! keep a line only the first time its trimmed form appears anywhere in
//! the merge. Deduplication is byte-exact on trimmed lines, so two mentions
//! of the same organisation with different label text stay separate nodes.
//!
//! The result always opens with the fixed header and one `classDef` line
//! per entity class so the downstream renderer can style `:::class` tags
//! regardless of which fragment a node came from.

use crate::pipeline::llm::DiagramFragment;
use crate::prompts::NODE_CLASSES;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Header line every merged diagram starts with.
pub const GRAPH_HEADER: &str = "graph TD";

/// Body emitted when the merge produces no lines at all.
pub const PLACEHOLDER_NODE: &str = "N0[\"No extractable entities found\"]";

static RE_LEADING_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\A\s*graph[ \t]+(?:td|lr)[^\n]*\n?").unwrap());

/// An insertion-ordered set of trimmed diagram lines.
///
/// `insert` reports whether the line was new; iteration order of
/// [`OrderedLineSet::into_lines`] is first-insertion order, which keeps the
/// merge deterministic for a given fragment sequence.
#[derive(Debug, Default)]
pub struct OrderedLineSet {
    seen: HashSet<String>,
    lines: Vec<String>,
}

impl OrderedLineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a line as already present without emitting it. Used to seed the
    /// style preamble so fragments cannot re-introduce those lines.
    pub fn mark_seen(&mut self, line: &str) {
        self.seen.insert(line.trim().to_string());
    }

    /// Append the trimmed line unless an identical one was seen before.
    /// Returns whether the line was appended.
    pub fn insert(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() || !self.seen.insert(trimmed.to_string()) {
            return false;
        }
        self.lines.push(trimmed.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// One no-op styling declaration per allowed entity class, in taxonomy order.
pub fn class_style_preamble() -> Vec<String> {
    NODE_CLASSES
        .iter()
        .map(|class| format!("classDef {class} stroke-width:1px"))
        .collect()
}

/// Strip a fragment's leading graph-declaration header, if present.
fn strip_leading_header(fragment: &str) -> &str {
    match RE_LEADING_HEADER.find(fragment) {
        Some(m) if m.start() == 0 => &fragment[m.end()..],
        _ => fragment,
    }
}

/// Merge fragments into the final diagram text.
///
/// Pure function of the fragment sequence. The output starts with
/// [`GRAPH_HEADER`], then the class-style preamble, then the globally
/// deduplicated body, with [`PLACEHOLDER_NODE`] standing in when no
/// fragment contributed a line.
pub fn merge(fragments: &[DiagramFragment]) -> String {
    let preamble = class_style_preamble();
    let mut body = OrderedLineSet::new();
    for line in &preamble {
        body.mark_seen(line);
    }

    for fragment in fragments {
        for line in strip_leading_header(&fragment.text).lines() {
            body.insert(line);
        }
    }

    let body_lines = if body.is_empty() {
        vec![PLACEHOLDER_NODE.to_string()]
    } else {
        body.into_lines()
    };

    let mut out = String::from(GRAPH_HEADER);
    for line in preamble.iter().chain(body_lines.iter()) {
        out.push('\n');
        out.push_str(line);
    }
    out
}
