//! Pipeline stages for document-to-diagram generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different OCR engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ classify ──▶ extract ──▶ normalize ──▶ llm ──▶ merge
//! (spool)    (route)      (ocr/pdf)   (clean/cap)   (model)  (dedup)
//! ```
//!
//! 1. [`ingest`]: spool each multipart part to a temp-backed file
//! 2. [`classify`]: readability heuristic + extension-based routing
//! 3. [`extract`]: run the routed strategy; [`ocr`] recognises a single
//!    image, [`pdf`] drives the page-by-page rasterize/OCR loop
//! 4. [`normalize`]: placeholder substitution, printable-ASCII cleanup,
//!    char-cap truncation, file-boundary delimiting
//! 5. [`llm`]: drive the generation call with fallback (and optional
//!    retry/backoff); the only stage with network I/O
//! 6. [`merge`]: strip per-fragment headers, deduplicate lines
//!    globally, prepend the class-style preamble
//!
//! Every stage is best-effort: a failed unit of work degrades to placeholder
//! text or a fallback fragment, never into an aborted batch.

pub mod classify;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod merge;
pub mod normalize;
pub mod ocr;
pub mod pdf;
