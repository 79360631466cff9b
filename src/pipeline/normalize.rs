//! Per-file text normalization and corpus assembly.
//!
//! Raw extraction output is messy: OCR emits stray control characters and
//! ragged whitespace, PDFs concatenate pages with newline runs, and some
//! files produce nothing at all. This stage turns each
//! [`ExtractionResult`] into a [`NormalizedSegment`] with a single shape:
//! printable ASCII, single spaces, a hard character cap, and a file-boundary
//! delimiter. Files whose extraction failed carry the fixed diagnostic
//! placeholder instead.
//!
//! Rules run as an ordered chain of pure `&str → String` functions so each
//! is independently testable.

use crate::pipeline::extract::{ExtractionResult, ExtractionStatus};
use once_cell::sync::Lazy;
use regex::Regex;

/// Appended when a file's cleaned text exceeds the character cap.
pub const TRUNCATION_MARKER: &str = " [truncated]";

static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").unwrap());

/// One file's cleaned, bounded text.
///
/// Invariant: `text` holds at most the configured cap of characters, plus
/// [`TRUNCATION_MARKER`] when `truncated` is set. `text` is never empty;
/// files that yielded nothing carry the diagnostic placeholder instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSegment {
    pub file_name: String,
    pub text: String,
    pub truncated: bool,
}

impl NormalizedSegment {
    /// Render the segment wrapped in its file-boundary delimiter, the form
    /// embedded into prompts.
    pub fn delimited(&self) -> String {
        format!(
            "--- BEGIN DOCUMENT: {name} ---\n{text}\n--- END DOCUMENT: {name} ---",
            name = self.file_name,
            text = self.text,
        )
    }
}

/// Ordered collection of segments; insertion order is upload order.
#[derive(Debug, Default)]
pub struct CombinedCorpus {
    segments: Vec<NormalizedSegment>,
}

impl CombinedCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: NormalizedSegment) {
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[NormalizedSegment] {
        &self.segments
    }

    /// Join every delimited segment, preserving upload order.
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(NormalizedSegment::delimited)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The fixed substitute text for files that produced no usable content.
pub fn diagnostic_placeholder(file_name: &str) -> String {
    format!("No readable text could be extracted from \"{file_name}\".")
}

/// Normalize one extraction result.
///
/// Failed, unsupported, and empty extractions become the placeholder. For
/// everything else the text is cleaned, capped at `max_chars` characters
/// (marker appended when cut), and returned with the truncation flag set
/// accordingly.
pub fn normalize(extraction: &ExtractionResult, max_chars: usize) -> NormalizedSegment {
    let placeholder = |file_name: &str| NormalizedSegment {
        file_name: file_name.to_string(),
        text: diagnostic_placeholder(file_name),
        truncated: false,
    };

    if extraction.status != ExtractionStatus::Ok {
        return placeholder(&extraction.file_name);
    }

    let cleaned = clean_text(&extraction.text);
    if cleaned.is_empty() {
        return placeholder(&extraction.file_name);
    }

    let (text, truncated) = truncate_to_cap(&cleaned, max_chars);
    NormalizedSegment {
        file_name: extraction.file_name.clone(),
        text,
        truncated,
    }
}

/// Full cleaning chain: whitespace to spaces, printable ASCII only,
/// collapsed runs, trimmed ends.
pub fn clean_text(text: &str) -> String {
    let spaced = whitespace_to_spaces(text);
    let printable = strip_unprintable(&spaced);
    collapse_spaces(&printable)
}

// ── Rules ────────────────────────────────────────────────────────────────

/// Rule 1: map every whitespace character (tabs, newlines, unicode spaces)
/// to a plain space so word boundaries survive the ASCII filter.
fn whitespace_to_spaces(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect()
}

/// Rule 2: keep printable ASCII (0x20..=0x7E) only.
fn strip_unprintable(text: &str) -> String {
    text.chars().filter(|c| (' '..='~').contains(c)).collect()
}

/// Rule 3: collapse space runs to single spaces and trim the ends.
fn collapse_spaces(text: &str) -> String {
    RE_SPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Cap `text` at `cap` characters, appending the truncation marker when cut.
fn truncate_to_cap(text: &str, cap: usize) -> (String, bool) {
    if text.chars().count() <= cap {
        return (text.to_string(), false);
    }
    let mut kept: String = text.chars().take(cap).collect();
    kept.push_str(TRUNCATION_MARKER);
    (kept, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_extraction(name: &str, text: &str) -> ExtractionResult {
        ExtractionResult {
            file_name: name.to_string(),
            status: ExtractionStatus::Ok,
            text: text.to_string(),
        }
    }

    #[test]
    fn failed_extractions_become_the_placeholder() {
        for status in [
            ExtractionStatus::Unsupported,
            ExtractionStatus::Unreadable,
            ExtractionStatus::OcrFailed,
            ExtractionStatus::Empty,
        ] {
            let extraction = ExtractionResult {
                file_name: "broken.bin".into(),
                status,
                text: String::new(),
            };
            let segment = normalize(&extraction, 1000);
            assert_eq!(segment.text, diagnostic_placeholder("broken.bin"));
            assert!(!segment.truncated);
        }
    }

    #[test]
    fn ok_extraction_that_cleans_to_nothing_becomes_the_placeholder() {
        let extraction = ok_extraction("weird.txt", "\u{0007}\u{00A0}\u{200B}");
        let segment = normalize(&extraction, 1000);
        assert_eq!(segment.text, diagnostic_placeholder("weird.txt"));
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(clean_text("a\u{0000}b\u{0007}c"), "abc");
    }

    #[test]
    fn non_ascii_is_stripped_but_words_stay_separated() {
        assert_eq!(clean_text("Zürich\noffice"), "Zrich office");
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(
            clean_text("John  Smith\t\tis\n\n\ndirector"),
            "John Smith is director"
        );
    }

    #[test]
    fn clean_sentence_passes_through_unchanged() {
        let sentence = "John Smith is director of Acme Pte Ltd, located at 1 Raffles Place";
        assert_eq!(clean_text(sentence), sentence);
    }

    #[test]
    fn over_cap_text_is_cut_to_exactly_the_cap() {
        let extraction = ok_extraction("big.txt", &"a".repeat(5000));
        let segment = normalize(&extraction, 100);
        assert!(segment.truncated);
        assert!(segment.text.ends_with(TRUNCATION_MARKER));
        let without_marker = segment.text.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(without_marker.chars().count(), 100);
    }

    #[test]
    fn at_cap_text_is_not_truncated() {
        let extraction = ok_extraction("fits.txt", &"b".repeat(100));
        let segment = normalize(&extraction, 100);
        assert!(!segment.truncated);
        assert_eq!(segment.text.len(), 100);
    }

    #[test]
    fn delimiter_names_the_file_on_both_ends() {
        let segment = NormalizedSegment {
            file_name: "notes.txt".into(),
            text: "hello".into(),
            truncated: false,
        };
        let block = segment.delimited();
        assert!(block.starts_with("--- BEGIN DOCUMENT: notes.txt ---\n"));
        assert!(block.ends_with("\n--- END DOCUMENT: notes.txt ---"));
        assert!(block.contains("hello"));
    }

    #[test]
    fn corpus_renders_in_upload_order() {
        let mut corpus = CombinedCorpus::new();
        for name in ["first.txt", "second.txt", "third.txt"] {
            corpus.push(NormalizedSegment {
                file_name: name.into(),
                text: "x".into(),
                truncated: false,
            });
        }
        let rendered = corpus.render();
        let first = rendered.find("first.txt").unwrap();
        let second = rendered.find("second.txt").unwrap();
        let third = rendered.find("third.txt").unwrap();
        assert!(first < second && second < third);
    }
}
