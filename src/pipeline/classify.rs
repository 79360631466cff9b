//! Readability heuristic and extension-based routing.
//!
//! Both decisions are deliberately cheap. The readability check is a
//! printable-byte ratio, not an encoding detector: it exists to reject
//! binary blobs renamed to `.txt`, and the occasional misclassification is
//! acceptable because every downstream stage degrades gracefully. Routing
//! looks at the file-name extension only; content sniffing is not worth the
//! complexity when a wrong route still ends in placeholder text.

use std::path::Path;

/// Ratio of printable bytes a buffer must exceed to count as text.
const READABLE_RATIO: f64 = 0.8;

/// Heuristic: is this byte buffer text a human could read?
///
/// Counts bytes with value ≥ 0x20 (space) against the total. Control bytes
/// (including newlines) count as unprintable; multi-byte UTF-8 sequences
/// count as printable. Empty buffers are not readable. The ratio must be
/// strictly greater than 0.8.
pub fn is_readable_text(buffer: &[u8]) -> bool {
    if buffer.is_empty() {
        return false;
    }
    let printable = buffer.iter().filter(|&&b| b >= 0x20).count();
    (printable as f64 / buffer.len() as f64) > READABLE_RATIO
}

/// Extraction strategy selected from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Decode the bytes directly (subject to the readability check).
    Text,
    /// Rasterize page by page and OCR each page.
    Pdf,
    /// OCR the file as a single image.
    Image,
    /// No strategy; the file becomes a diagnostic placeholder.
    Unsupported,
}

impl FileKind {
    /// Route a file by its (case-insensitive) extension.
    ///
    /// Unknown and missing extensions route to [`FileKind::Unsupported`];
    /// they never fail the request.
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") => FileKind::Text,
            Some("pdf") => FileKind::Pdf,
            Some("png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp") => FileKind::Image,
            _ => FileKind::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_not_readable() {
        assert!(!is_readable_text(b""));
    }

    #[test]
    fn plain_sentence_is_readable() {
        assert!(is_readable_text(
            b"John Smith is director of Acme Pte Ltd, located at 1 Raffles Place"
        ));
    }

    #[test]
    fn ratio_must_exceed_the_threshold_strictly() {
        // 8 printable bytes out of 10 is exactly 0.8: not readable.
        let exactly_at = b"abcdefgh\x00\x01";
        assert!(!is_readable_text(exactly_at));
        // 9 out of 10 crosses the threshold.
        let above = b"abcdefghi\x00";
        assert!(is_readable_text(above));
    }

    #[test]
    fn null_padded_binary_is_rejected() {
        let mut buffer = vec![0u8; 100];
        buffer[..30].copy_from_slice(&[b'A'; 30]);
        assert!(!is_readable_text(&buffer));
    }

    #[test]
    fn multibyte_utf8_counts_as_printable() {
        assert!(is_readable_text("Müller & Søn, Zürich".as_bytes()));
    }

    #[test]
    fn routes_by_extension_case_insensitively() {
        assert_eq!(FileKind::from_name("notes.txt"), FileKind::Text);
        assert_eq!(FileKind::from_name("REPORT.PDF"), FileKind::Pdf);
        assert_eq!(FileKind::from_name("scan.JPG"), FileKind::Image);
        assert_eq!(FileKind::from_name("photo.jpeg"), FileKind::Image);
        assert_eq!(FileKind::from_name("page.tiff"), FileKind::Image);
    }

    #[test]
    fn unknown_and_missing_extensions_are_unsupported() {
        assert_eq!(FileKind::from_name("report.docx"), FileKind::Unsupported);
        assert_eq!(FileKind::from_name("archive.tar.gz"), FileKind::Unsupported);
        assert_eq!(FileKind::from_name("README"), FileKind::Unsupported);
        assert_eq!(FileKind::from_name(""), FileKind::Unsupported);
    }
}
