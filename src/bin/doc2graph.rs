//! CLI binary for doc2graph.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GeneratorConfig` and runs the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use doc2graph::pipeline::ocr;
use doc2graph::{serve, AppState, GenerationMode, GeneratorConfig};
use std::io;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start on the default port
  ANTHROPIC_API_KEY=sk-ant-... doc2graph

  # Bind to all interfaces, default to per-file generation
  doc2graph --host 0.0.0.0 --port 9000 --mode per-file

  # Point at a relay endpoint and cap PDFs at 20 OCR'd pages
  doc2graph --base-url https://relay.internal/v1/messages --max-pages 20

  # Upload documents once the server is running
  curl -F "files=@witness_statement.txt" -F "files=@scan.pdf" \
       "http://127.0.0.1:8080/diagram?mode=per-file"

ENDPOINTS:
  POST /diagram?mode=combined|per-file   multipart upload → Mermaid text
  GET  /health                           liveness probe

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY      API key for the generation endpoint (required)
  DOC2GRAPH_HOST         Bind address (default 127.0.0.1)
  DOC2GRAPH_PORT         Bind port (default 8080)
  DOC2GRAPH_BASE_URL     Generation endpoint URL
  DOC2GRAPH_MODEL        Model ID sent with every request
  DOC2GRAPH_MODE         Default generation mode (combined, per-file)
  DOC2GRAPH_OCR_LANG     Tesseract language code (default eng)
  RUST_LOG               Tracing filter; overrides --verbose/--quiet

SETUP:
  1. Install the OCR tools:  apt install tesseract-ocr poppler-utils
  2. Set the API key:        export ANTHROPIC_API_KEY=sk-ant-...
  3. Start the server:       doc2graph

  Without tesseract/pdftoppm the server still starts; image and PDF
  uploads then degrade to placeholder notes in the diagram.
"#;

/// Serve an HTTP endpoint that turns uploaded documents into a Mermaid entity graph.
#[derive(Parser, Debug)]
#[command(
    name = "doc2graph",
    version,
    about = "Serve an HTTP endpoint that turns uploaded documents into a Mermaid entity graph",
    long_about = "Accepts document uploads (plain text, images, PDFs) over one multipart POST \
endpoint, extracts their text (reading directly or via tesseract OCR), and asks a language \
model to draw the people, organisations, and events they mention as Mermaid `graph TD` text.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "DOC2GRAPH_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(short, long, env = "DOC2GRAPH_PORT", default_value_t = 8080)]
    port: u16,

    /// API key for the generation endpoint.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generation endpoint URL.
    #[arg(long, env = "DOC2GRAPH_BASE_URL")]
    base_url: Option<String>,

    /// Model ID sent with every generation request.
    #[arg(long, env = "DOC2GRAPH_MODEL")]
    model: Option<String>,

    /// Default generation mode when a request does not pass `?mode=`.
    #[arg(long, env = "DOC2GRAPH_MODE", value_enum, default_value = "combined")]
    mode: GenerationMode,

    /// Character cap per file after clean-up.
    #[arg(long, env = "DOC2GRAPH_MAX_CHARS", default_value_t = 20_000)]
    max_chars: usize,

    /// OCR page ceiling per PDF.
    #[arg(long, env = "DOC2GRAPH_MAX_PAGES", default_value_t = 50,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: u32,

    /// Tesseract language code.
    #[arg(long, env = "DOC2GRAPH_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// PDF rasterization DPI (72-600).
    #[arg(long, env = "DOC2GRAPH_OCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    ocr_dpi: u32,

    /// Max model output tokens per generation call.
    #[arg(long, env = "DOC2GRAPH_MAX_TOKENS", default_value_t = 4096)]
    max_output_tokens: u32,

    /// Maximum accepted upload size in MiB.
    #[arg(long, env = "DOC2GRAPH_MAX_UPLOAD_MB", default_value_t = 25)]
    max_upload_mb: usize,

    /// Per-call generation timeout in seconds (unset: wait indefinitely).
    #[arg(long, env = "DOC2GRAPH_API_TIMEOUT")]
    timeout_secs: Option<u64>,

    /// Retries per generation call on retryable failures.
    #[arg(long, env = "DOC2GRAPH_MAX_RETRIES", default_value_t = 0)]
    retries: u32,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2GRAPH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2GRAPH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).context("Invalid configuration")?;
    info!(?config, "starting doc2graph");

    // ── Probe the OCR collaborators ──────────────────────────────────────
    // Missing tools are a warning, not an error: text-only deployments are
    // legitimate and anything unreadable degrades to a placeholder node.
    for tool in ocr::missing_tools().await {
        warn!(%tool, "OCR tool not found; image and PDF uploads will degrade");
    }

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cli.host, cli.port))?;
    let state = AppState::new(config)?;
    serve(state, addr).await.context("Server failed")?;

    Ok(())
}

/// Map CLI args to `GeneratorConfig`.
fn build_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut builder = GeneratorConfig::builder()
        .api_key(cli.api_key.clone().unwrap_or_default())
        .default_mode(cli.mode)
        .max_chars_per_file(cli.max_chars)
        .max_pdf_pages(cli.max_pages)
        .ocr_language(&cli.ocr_lang)
        .ocr_dpi(cli.ocr_dpi)
        .max_output_tokens(cli.max_output_tokens)
        .max_upload_bytes(cli.max_upload_mb * 1024 * 1024)
        .max_retries(cli.retries);

    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(secs) = cli.timeout_secs {
        builder = builder.request_timeout_secs(secs);
    }

    Ok(builder.build()?)
}
