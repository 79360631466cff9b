//! Instruction templates for entity-diagram generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: changing the extraction rules or the
//!    node-class taxonomy means editing exactly one place.
//!
//! 2. **Testability**: unit tests can inspect the composed prompt without
//!    calling a real model, making prompt regressions easy to catch.
//!
//! The template is deterministic and content-agnostic: it never branches on
//! what the documents say, it only fixes the taxonomy, the output format,
//! and the empty-case behaviour.

use crate::pipeline::normalize::{CombinedCorpus, NormalizedSegment};

/// The fixed taxonomy of node classes the model may assign.
///
/// Order matters: the merger emits its style preamble in this order, so
/// reordering the array changes the byte layout of every merged diagram.
pub const NODE_CLASSES: [&str; 7] = [
    "case",
    "person",
    "organisation",
    "legal_issue",
    "event",
    "document",
    "location",
];

/// Marker separating the instruction block from the document corpus.
pub const DOCUMENTS_MARKER: &str = "DOCUMENTS:";

/// Instruction template prepended to every generation request.
pub const ENTITY_DIAGRAM_PROMPT: &str = r#"You are an information-extraction assistant. Your task is to read the documents below and produce a Mermaid flowchart describing the entities they mention and the relationships between them.

Follow these rules precisely:

1. ENTITY EXTRACTION
   - Extract every named entity: people, organisations, cases, legal issues, events, documents, locations
   - One node per entity; reuse the same node identifier when an entity reappears
   - Keep node labels short (the entity name, not a sentence)

2. ALLOWED NODE CLASSES
   - Tag every node with exactly one of: case, person, organisation, legal_issue, event, document, location
   - Do not invent other classes

3. STYLING
   - Append the class to each node with the ::: syntax, e.g. P1["John Smith"]:::person
   - Do not emit classDef lines; styling is applied downstream

4. STRUCTURE
   - The output must start with the line: graph TD
   - Declare relationships as labelled edges, e.g. P1 -->|Director of| O1
   - One statement per line; no prose between statements

5. IF NOTHING CAN BE EXTRACTED
   - Output exactly:
     graph TD
     N0["No extractable entities found"]

6. FORMAT EXAMPLE (illustrative only; never copy its content)
   graph TD
   C1["Doe v Example Corp"]:::case
   P1["Jane Doe"]:::person
   O1["Example Corp"]:::organisation
   P1 -->|Claimant in| C1
   O1 -->|Defendant in| C1

7. OUTPUT FORMAT
   - Output ONLY the Mermaid flowchart
   - Do NOT wrap it in ``` fences
   - Do NOT add commentary before or after the diagram"#;

/// Compose the combined-corpus prompt: instructions, marker, every
/// delimited segment in upload order.
pub fn compose_combined(corpus: &CombinedCorpus) -> String {
    format!(
        "{ENTITY_DIAGRAM_PROMPT}\n\n{DOCUMENTS_MARKER}\n\n{}",
        corpus.render()
    )
}

/// Compose a per-file prompt carrying a single delimited segment.
pub fn compose_single(segment: &NormalizedSegment) -> String {
    format!(
        "{ENTITY_DIAGRAM_PROMPT}\n\n{DOCUMENTS_MARKER}\n\n{}",
        segment.delimited()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_lists_every_node_class() {
        for class in NODE_CLASSES {
            assert!(
                ENTITY_DIAGRAM_PROMPT.contains(class),
                "template is missing node class '{class}'"
            );
        }
    }

    #[test]
    fn template_pins_the_empty_case_node() {
        assert!(ENTITY_DIAGRAM_PROMPT.contains(crate::pipeline::merge::PLACEHOLDER_NODE));
    }

    #[test]
    fn single_prompt_contains_template_marker_and_segment() {
        let segment = NormalizedSegment {
            file_name: "notes.txt".into(),
            text: "John Smith is director of Acme Pte Ltd".into(),
            truncated: false,
        };
        let prompt = compose_single(&segment);
        assert!(prompt.starts_with(ENTITY_DIAGRAM_PROMPT));
        assert!(prompt.contains(DOCUMENTS_MARKER));
        assert!(prompt.contains("John Smith is director of Acme Pte Ltd"));
        assert!(prompt.contains("notes.txt"));
    }
}
