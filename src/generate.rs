//! Request-level orchestration: uploads in, one diagram out.
//!
//! The pipeline is strictly sequential in upload order: extraction and
//! (in per-file mode) generation happen one file at a time, so overall
//! latency is proportional to the number of files. Nothing here returns an
//! error: every per-unit failure was already degraded to placeholder text
//! or a fallback fragment by the stage that recovered it, and the counters
//! in [`GenerationStats`] are how those degradations stay visible.

use crate::config::{GenerationMode, GeneratorConfig};
use crate::pipeline::extract::{self, ExtractionStatus};
use crate::pipeline::ingest::UploadedFile;
use crate::pipeline::llm::DiagramClient;
use crate::pipeline::merge;
use crate::pipeline::normalize::{self, CombinedCorpus};
use crate::pipeline::ocr::OcrEngine;
use crate::prompts;
use std::time::Instant;
use tracing::{debug, info};

/// Counters for one request, logged at completion.
#[derive(Debug, Clone, Default)]
pub struct GenerationStats {
    /// Files received in the request.
    pub files: usize,
    /// Files whose extraction produced usable text.
    pub extracted_ok: usize,
    /// Files that ended up as the diagnostic placeholder.
    pub placeholders: usize,
    /// Files whose text was cut at the character cap.
    pub truncated: usize,
    /// Generation calls issued (1 in combined mode, one per file otherwise).
    pub model_calls: usize,
    /// Generation calls that returned the fallback fragment.
    pub degraded_calls: usize,
    pub elapsed_ms: u128,
}

/// Final diagram text plus the request counters.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub diagram: String,
    pub stats: GenerationStats,
}

/// Run the whole pipeline for one batch of uploads.
pub async fn generate_diagram(
    files: &[UploadedFile],
    mode: GenerationMode,
    client: &DiagramClient,
    config: &GeneratorConfig,
) -> GenerationOutcome {
    let started = Instant::now();
    let mut stats = GenerationStats {
        files: files.len(),
        ..Default::default()
    };
    let ocr = OcrEngine::new(&config.ocr_language);

    // ── Step 1: Extract and normalize every file, in upload order ────────
    let mut segments = Vec::with_capacity(files.len());
    for file in files {
        let extraction = extract::extract_file(file, &ocr, config).await;
        if extraction.status == ExtractionStatus::Ok {
            stats.extracted_ok += 1;
        }

        let segment = normalize::normalize(&extraction, config.max_chars_per_file);
        if segment.truncated {
            stats.truncated += 1;
        }
        if segment.text == normalize::diagnostic_placeholder(&segment.file_name) {
            stats.placeholders += 1;
        }
        debug!(
            file = %segment.file_name,
            status = ?extraction.status,
            chars = segment.text.len(),
            truncated = segment.truncated,
            "normalized"
        );
        segments.push(segment);
    }

    // ── Step 2: Compose prompts, call the model, assemble the diagram ────
    let diagram = match mode {
        GenerationMode::Combined => {
            let mut corpus = CombinedCorpus::new();
            for segment in segments {
                corpus.push(segment);
            }
            let prompt = prompts::compose_combined(&corpus);
            stats.model_calls += 1;
            let fragment = client.generate(&prompt, "combined").await;
            if fragment.degraded() {
                stats.degraded_calls += 1;
            }
            fragment.text
        }
        GenerationMode::PerFile => {
            let mut fragments = Vec::with_capacity(segments.len());
            for segment in &segments {
                let prompt = prompts::compose_single(segment);
                stats.model_calls += 1;
                let fragment = client.generate(&prompt, &segment.file_name).await;
                if fragment.degraded() {
                    stats.degraded_calls += 1;
                }
                fragments.push(fragment);
            }
            merge::merge(&fragments)
        }
    };

    stats.elapsed_ms = started.elapsed().as_millis();
    info!(
        files = stats.files,
        extracted_ok = stats.extracted_ok,
        placeholders = stats.placeholders,
        truncated = stats.truncated,
        model_calls = stats.model_calls,
        degraded_calls = stats.degraded_calls,
        elapsed_ms = stats.elapsed_ms,
        mode = ?mode,
        "diagram generated"
    );

    GenerationOutcome { diagram, stats }
}
