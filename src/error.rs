//! Error types for the doc2graph library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ServiceError`] is **fatal**: the request (or the process) cannot
//!   proceed at all (invalid configuration, broken upload stream, bind
//!   failure). Surfaces as a 500 response whose body is still a diagram.
//!
//! * [`Diagnostic`] is **non-fatal**: one unit of work failed (one file was
//!   unsupported, one OCR pass produced nothing, one model call came back
//!   malformed) but the batch is fine. Stored inside results such as
//!   [`crate::pipeline::llm::DiagramFragment`] so callers can inspect
//!   partial success rather than losing the whole request to one bad file.
//!
//! The separation mirrors the service contract: a single bad document turns
//! into placeholder text, never into an aborted request.

use std::io;
use thiserror::Error;

/// All fatal errors returned by the doc2graph library.
///
/// Per-file and per-call failures use [`Diagnostic`] and are recovered in
/// place rather than propagated here.
#[derive(Debug, Error)]
pub enum ServiceError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Client errors ─────────────────────────────────────────────────────
    /// The reqwest client for the generation service could not be built.
    #[error("Failed to initialise the HTTP client for the generation service: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// An uploaded file could not be written to temporary storage.
    #[error("Failed to spool an uploaded file to temporary storage: {source}\nCheck free space and permissions on the system temp directory.")]
    UploadSpool {
        #[source]
        source: io::Error,
    },

    /// The multipart body could not be read to the end.
    #[error("Failed to read the multipart upload stream: {0}")]
    UploadStream(String),

    // ── Server errors ─────────────────────────────────────────────────────
    /// Binding or serving the listen address failed.
    #[error("Failed to serve on {addr}: {source}\nIs the port already in use?")]
    Serve {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// A non-fatal, per-unit-of-work failure.
///
/// Every variant is recovered where it occurs: unsupported or unreadable
/// files become placeholder text, OCR failures contribute empty page text,
/// and generation failures become the fallback fragment. The value is kept
/// in the surrounding result for logging and stats.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum Diagnostic {
    /// The file extension maps to no extraction strategy.
    #[error("unsupported file type: '{file}'")]
    UnsupportedFileType { file: String },

    /// The file content did not pass the readable-text heuristic.
    #[error("content of '{file}' is not readable text")]
    UnreadableContent { file: String },

    /// OCR produced no usable output.
    #[error("OCR failed: {detail}")]
    OcrFailure { detail: String },

    /// The remote model call failed or returned nothing usable.
    #[error("remote generation failed: {detail}")]
    RemoteGenerationFailure { detail: String },

    /// The model found nothing to extract. A valid outcome, not a defect.
    #[error("no extractable entities")]
    NoExtractableEntities,
}
