//! Per-file extraction dispatch.
//!
//! One uploaded file in, one [`ExtractionResult`] out, never an error: the
//! status field records what happened and the normalizer decides what the
//! prompt will say about it. The routing itself lives in
//! [`crate::pipeline::classify`]; this module runs the chosen strategy.

use crate::config::GeneratorConfig;
use crate::pipeline::classify::{is_readable_text, FileKind};
use crate::pipeline::ingest::UploadedFile;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::pdf;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What became of one file's extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    /// Usable text was produced.
    Ok,
    /// No strategy exists for the file's extension.
    Unsupported,
    /// The content failed the readable-text heuristic (or could not be read).
    Unreadable,
    /// OCR failed outright for an image upload.
    OcrFailed,
    /// The strategy ran but produced no text.
    Empty,
}

/// Immutable per-file extraction outcome, consumed by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub file_name: String,
    pub status: ExtractionStatus,
    pub text: String,
}

impl ExtractionResult {
    fn without_text(file_name: &str, status: ExtractionStatus) -> Self {
        Self {
            file_name: file_name.to_string(),
            status,
            text: String::new(),
        }
    }

    fn from_text(file_name: &str, text: String) -> Self {
        if text.trim().is_empty() {
            Self::without_text(file_name, ExtractionStatus::Empty)
        } else {
            Self {
                file_name: file_name.to_string(),
                status: ExtractionStatus::Ok,
                text,
            }
        }
    }
}

/// Run the routed extraction strategy for one uploaded file.
pub async fn extract_file(
    file: &UploadedFile,
    ocr: &OcrEngine,
    config: &GeneratorConfig,
) -> ExtractionResult {
    let name = file.original_name.as_str();
    let kind = FileKind::from_name(name);
    debug!(file = name, ?kind, size_bytes = file.size_bytes, "extracting");

    match kind {
        FileKind::Unsupported => {
            warn!(file = name, "unsupported file type; substituting placeholder");
            ExtractionResult::without_text(name, ExtractionStatus::Unsupported)
        }

        FileKind::Text => {
            let bytes = match tokio::fs::read(&file.temp_path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = name, error = %e, "could not read spooled upload");
                    return ExtractionResult::without_text(name, ExtractionStatus::Unreadable);
                }
            };
            if !is_readable_text(&bytes) {
                warn!(file = name, "content failed the readability check");
                return ExtractionResult::without_text(name, ExtractionStatus::Unreadable);
            }
            ExtractionResult::from_text(name, String::from_utf8_lossy(&bytes).into_owned())
        }

        FileKind::Image => match ocr.recognize(&file.temp_path).await {
            Ok(text) => ExtractionResult::from_text(name, text),
            Err(diag) => {
                warn!(file = name, error = %diag, "image OCR failed");
                ExtractionResult::without_text(name, ExtractionStatus::OcrFailed)
            }
        },

        FileKind::Pdf => {
            let text =
                pdf::extract_pdf_text(&file.temp_path, ocr, config.max_pdf_pages, config.ocr_dpi)
                    .await;
            ExtractionResult::from_text(name, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn upload(dir: &Path, name: &str, bytes: &[u8]) -> UploadedFile {
        let temp_path = dir.join(name);
        std::fs::write(&temp_path, bytes).unwrap();
        UploadedFile {
            original_name: name.to_string(),
            temp_path,
            size_bytes: bytes.len() as u64,
        }
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig::builder().api_key("test").build().unwrap()
    }

    #[tokio::test]
    async fn unsupported_extension_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let file = upload(dir.path(), "minutes.docx", b"whatever");
        let result = extract_file(&file, &OcrEngine::new("eng"), &config()).await;
        assert_eq!(result.status, ExtractionStatus::Unsupported);
        assert!(result.text.is_empty());
    }

    #[tokio::test]
    async fn readable_text_file_passes_through() {
        let dir = TempDir::new().unwrap();
        let sentence = "John Smith is director of Acme Pte Ltd, located at 1 Raffles Place";
        let file = upload(dir.path(), "notes.txt", sentence.as_bytes());
        let result = extract_file(&file, &OcrEngine::new("eng"), &config()).await;
        assert_eq!(result.status, ExtractionStatus::Ok);
        assert_eq!(result.text, sentence);
    }

    #[tokio::test]
    async fn binary_bytes_in_a_txt_file_are_unreadable() {
        let dir = TempDir::new().unwrap();
        let mut bytes = vec![0u8; 64];
        bytes[..10].copy_from_slice(b"PK\x03\x04rest..");
        let file = upload(dir.path(), "archive.txt", &bytes);
        let result = extract_file(&file, &OcrEngine::new("eng"), &config()).await;
        assert_eq!(result.status, ExtractionStatus::Unreadable);
    }

    #[tokio::test]
    async fn empty_txt_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let file = upload(dir.path(), "empty.txt", b"");
        let result = extract_file(&file, &OcrEngine::new("eng"), &config()).await;
        assert_eq!(result.status, ExtractionStatus::Unreadable);
    }

    #[tokio::test]
    async fn whitespace_only_txt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = upload(dir.path(), "blank.txt", b"      ");
        let result = extract_file(&file, &OcrEngine::new("eng"), &config()).await;
        assert_eq!(result.status, ExtractionStatus::Empty);
    }

    #[test]
    fn missing_spooled_file_is_unreadable() {
        let file = UploadedFile {
            original_name: "ghost.txt".into(),
            temp_path: "/nonexistent/ghost.txt".into(),
            size_bytes: 0,
        };
        let result =
            tokio_test::block_on(extract_file(&file, &OcrEngine::new("eng"), &config()));
        assert_eq!(result.status, ExtractionStatus::Unreadable);
    }
}
