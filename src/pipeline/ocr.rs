//! Single-image OCR through a `tesseract` subprocess.
//!
//! The engine shells out rather than binding libtesseract: the system
//! package is universally available and a crash in it cannot take the
//! service down. The subprocess boundary also keeps the best-effort
//! contract simple, since any failure is a [`Diagnostic`] the caller folds
//! into empty page text.

use crate::error::Diagnostic;
use std::io;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt carried into a diagnostic detail.
const STDERR_SNIPPET_CHARS: usize = 300;

/// OCR collaborator with a single configured recognition language.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    language: String,
}

impl OcrEngine {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Recognize the text in one image file.
    ///
    /// Callers always recover the `Err` branch into empty text; a failed
    /// image or page must never abort the batch.
    pub async fn recognize(&self, image: &Path) -> Result<String, Diagnostic> {
        debug!(image = %image.display(), language = %self.language, "running tesseract");
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await
            .map_err(|e| spawn_failure("tesseract", "install tesseract-ocr", e))?;

        if !output.status.success() {
            return Err(Diagnostic::OcrFailure {
                detail: format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    stderr_snippet(&output.stderr)
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Probe for the external collaborators this pipeline shells out to.
///
/// Returns one `"tool (install hint)"` entry per missing binary. Intended
/// for a startup check: a deployment without OCR tools can still serve
/// text-only uploads, so callers warn rather than abort.
pub async fn missing_tools() -> Vec<String> {
    let mut missing = Vec::new();
    for (tool, probe_arg, hint) in [
        ("tesseract", "--version", "install tesseract-ocr"),
        ("pdftoppm", "-v", "install poppler-utils"),
    ] {
        // Spawning succeeds whenever the binary exists; the exit code of a
        // version probe is irrelevant here.
        let spawned = Command::new(tool).arg(probe_arg).output().await;
        if spawned.is_err() {
            missing.push(format!("{tool} ({hint})"));
        }
    }
    missing
}

pub(crate) fn spawn_failure(tool: &str, hint: &str, err: io::Error) -> Diagnostic {
    let detail = if err.kind() == io::ErrorKind::NotFound {
        format!("{tool} is not installed ({hint})")
    } else {
        format!("failed to run {tool}: {err}")
    };
    Diagnostic::OcrFailure { detail }
}

pub(crate) fn stderr_snippet(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.chars().count() <= STDERR_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(STDERR_SNIPPET_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! skip_unless_ocr_tools {
        () => {
            if std::process::Command::new("tesseract")
                .arg("--version")
                .output()
                .is_err()
            {
                eprintln!("SKIP: tesseract not installed");
                return;
            }
        };
    }

    #[test]
    fn not_found_maps_to_an_install_hint() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let diag = spawn_failure("tesseract", "install tesseract-ocr", err);
        assert!(diag.to_string().contains("install tesseract-ocr"));
    }

    #[test]
    fn stderr_snippet_is_bounded() {
        let noisy = "x".repeat(5000);
        assert_eq!(stderr_snippet(noisy.as_bytes()).chars().count(), 300);
    }

    #[tokio::test]
    async fn missing_image_is_a_recoverable_diagnostic() {
        skip_unless_ocr_tools!();
        let engine = OcrEngine::new("eng");
        let result = engine
            .recognize(Path::new("/nonexistent/páge-does-not-exist.png"))
            .await;
        assert!(matches!(result, Err(Diagnostic::OcrFailure { .. })));
    }
}
