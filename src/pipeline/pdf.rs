//! Page-by-page PDF text extraction via `pdftoppm` + OCR.
//!
//! PDFs arrive scanned more often than born-digital in this pipeline, so
//! every page goes through rasterization and OCR rather than a text-layer
//! read. The loop is bounded and scrupulous about disk:
//!
//! * one page is rasterized at a time into a scratch directory,
//! * the page image is removed as soon as its OCR pass finishes,
//! * a hard page ceiling stops runaway documents,
//! * the scratch `TempDir` drop removes anything a crash left behind.
//!
//! Extraction never fails the request. Rasterizer trouble ends the loop
//! and OCR trouble contributes an empty page; whatever text accumulated up
//! to that point is returned.

use crate::pipeline::ocr::{self, OcrEngine};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// Extract text from every page of `pdf`, stopping at `max_pages`.
///
/// Returns the accumulated text, one `\n`-terminated chunk per processed
/// page. Partial output from a document that stopped early is returned
/// as-is.
pub async fn extract_pdf_text(pdf: &Path, ocr: &OcrEngine, max_pages: u32, dpi: u32) -> String {
    let scratch = match TempDir::new() {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "could not create scratch directory for page images");
            return String::new();
        }
    };
    // TempDir drop is the backstop; pages are removed individually below.
    extract_pdf_text_in(pdf, ocr, max_pages, dpi, scratch.path()).await
}

/// Page loop against an explicit scratch directory.
///
/// Separated from [`extract_pdf_text`] so tests can observe that the
/// directory is empty when the loop returns.
pub(crate) async fn extract_pdf_text_in(
    pdf: &Path,
    ocr: &OcrEngine,
    max_pages: u32,
    dpi: u32,
    scratch: &Path,
) -> String {
    let mut accumulated = String::new();
    for page in 1..=max_pages {
        let image = match rasterize_page(pdf, page, dpi, scratch).await {
            Some(path) => path,
            // Past the last page, or the rasterizer failed: end of document.
            None => break,
        };

        let page_text = match ocr.recognize(&image).await {
            Ok(text) => text,
            Err(diag) => {
                warn!(page, error = %diag, "page OCR failed; continuing with empty text");
                String::new()
            }
        };
        accumulated.push_str(&page_text);
        accumulated.push('\n');

        if let Err(e) = tokio::fs::remove_file(&image).await {
            warn!(page, image = %image.display(), error = %e, "could not remove transient page image");
        }
    }
    accumulated
}

/// Rasterize a single page to a PNG inside `scratch`.
///
/// Returns `None` when the page does not exist or the rasterizer failed;
/// both end the page loop.
pub(crate) async fn rasterize_page(
    pdf: &Path,
    page: u32,
    dpi: u32,
    scratch: &Path,
) -> Option<PathBuf> {
    let page_str = page.to_string();
    let prefix = scratch.join("page");
    debug!(pdf = %pdf.display(), page, dpi, "rasterizing page");

    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-f", &page_str, "-l", &page_str])
        .arg(pdf)
        .arg(&prefix)
        .output()
        .await;
    match output {
        Ok(out) if out.status.success() => {}
        Ok(out) => {
            warn!(
                page,
                status = %out.status,
                detail = %ocr::stderr_snippet(&out.stderr),
                "pdftoppm failed"
            );
            return None;
        }
        Err(e) => {
            warn!(page, error = %ocr::spawn_failure("pdftoppm", "install poppler-utils", e), "could not run pdftoppm");
            return None;
        }
    }

    // pdftoppm pads the page number in the output name to the width of the
    // document's last page; probe the plausible widths.
    for width in [1usize, 2, 3, 4] {
        let candidate = scratch.join(format!("page-{page:0width$}.png"));
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! skip_unless_ocr_tools {
        () => {
            for tool in ["tesseract", "pdftoppm"] {
                if std::process::Command::new(tool).arg("--version").output().is_err() {
                    eprintln!("SKIP: {tool} not installed");
                    return;
                }
            }
        };
    }

    /// Build a valid blank PDF with `pages` pages (no content streams).
    fn minimal_pdf(pages: usize) -> Vec<u8> {
        let kids: String = (0..pages)
            .map(|i| format!("{} 0 R", i + 3))
            .collect::<Vec<_>>()
            .join(" ");
        let mut objects: Vec<String> = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".into(),
            format!("<< /Type /Pages /Kids [{kids}] /Count {pages} >>"),
        ];
        for _ in 0..pages {
            objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] >>".into());
        }

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
        }
        let xref_at = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        pdf.push_str("0000000000 65535 f \n");
        for offset in offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.into_bytes()
    }

    fn write_pdf(dir: &Path, pages: usize) -> PathBuf {
        let path = dir.join("fixture.pdf");
        std::fs::write(&path, minimal_pdf(pages)).unwrap();
        path
    }

    fn remaining_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn rasterize_produces_a_page_image() {
        skip_unless_ocr_tools!();
        let dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let pdf = write_pdf(dir.path(), 2);

        let image = rasterize_page(&pdf, 1, 72, scratch.path()).await;
        let image = image.expect("page 1 should rasterize");
        assert!(image.exists());
    }

    #[tokio::test]
    async fn rasterize_past_the_last_page_returns_none() {
        skip_unless_ocr_tools!();
        let dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let pdf = write_pdf(dir.path(), 2);

        assert!(rasterize_page(&pdf, 3, 72, scratch.path()).await.is_none());
    }

    /// Ceiling and cleanup together: a guaranteed-failing OCR language makes
    /// every page contribute exactly one newline, so the page count is
    /// observable, and the scratch directory must still end up empty.
    #[tokio::test]
    async fn loop_honours_the_ceiling_and_removes_every_image() {
        skip_unless_ocr_tools!();
        let dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let pdf = write_pdf(dir.path(), 3);
        let failing_ocr = OcrEngine::new("zz-no-such-language");

        let text = extract_pdf_text_in(&pdf, &failing_ocr, 2, 72, scratch.path()).await;

        assert_eq!(text, "\n\n", "two pages processed, one newline each");
        assert!(
            remaining_files(scratch.path()).is_empty(),
            "transient page images must be deleted even when OCR fails"
        );
    }

    #[tokio::test]
    async fn missing_pdf_yields_empty_text_and_a_clean_scratch() {
        skip_unless_ocr_tools!();
        let scratch = TempDir::new().unwrap();
        let ocr = OcrEngine::new("eng");

        let text =
            extract_pdf_text_in(Path::new("/nonexistent/missing.pdf"), &ocr, 5, 72, scratch.path())
                .await;

        assert!(text.is_empty());
        assert!(remaining_files(scratch.path()).is_empty());
    }
}
