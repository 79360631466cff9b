//! # doc2graph
//!
//! Turn a pile of uploaded documents into one Mermaid entity graph.
//!
//! ## Why this crate?
//!
//! Case files arrive as a mixed bag of plain-text notes, scanned letters,
//! and multi-page PDFs, and the interesting part is rarely one document but
//! the web of people, organisations, and events connecting all of them. This
//! crate accepts the whole bag over a single HTTP endpoint, pulls text out of
//! each file (reading it directly or OCR-ing it page by page), and asks a
//! language model to draw the entity graph as Mermaid `graph TD` text. A file
//! that cannot be read never fails the request; it degrades to a placeholder
//! note and the remaining files still produce a diagram.
//!
//! ## Pipeline Overview
//!
//! ```text
//! multipart upload
//!  │
//!  ├─ 1. Ingest     spool each part to a scratch dir, upload order kept
//!  ├─ 2. Classify   extension → text / image / PDF / unsupported
//!  ├─ 3. Extract    direct read, OCR (tesseract), or per-page PDF OCR
//!  ├─ 4. Normalize  placeholder on failure, ASCII clean-up, size cap
//!  ├─ 5. Compose    fixed entity-extraction prompt (combined or per-file)
//!  ├─ 6. Generate   Messages API call, first `graph TD|LR` extracted
//!  └─ 7. Merge      per-file fragments → one deduplicated diagram
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2graph::{serve, AppState, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::builder()
//!         .api_key(std::env::var("ANTHROPIC_API_KEY")?)
//!         .build()?;
//!     let state = AppState::new(config)?;
//!     serve(state, "127.0.0.1:8080".parse()?).await?;
//!     Ok(())
//! }
//! ```
//!
//! Then upload files:
//!
//! ```text
//! curl -F "files=@witness_statement.txt" -F "files=@scan.pdf" \
//!      "http://127.0.0.1:8080/diagram?mode=per-file"
//! ```
//!
//! ## Generation Modes
//!
//! | Mode | Query value | Model calls | Behaviour |
//! |------|-------------|-------------|-----------|
//! | Combined | `combined` | 1 | All documents in one prompt; entities are related across files |
//! | Per-file | `per-file` | one per file | Each document prompted alone; fragments merged and deduplicated |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2graph` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library to avoid pulling in CLI-only deps:
//! ```toml
//! doc2graph = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationMode, GeneratorConfig, GeneratorConfigBuilder};
pub use error::{Diagnostic, ServiceError};
pub use generate::{generate_diagram, GenerationOutcome, GenerationStats};
pub use server::{create_router, serve, AppState};
