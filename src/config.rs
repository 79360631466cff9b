//! Configuration types for the document-to-diagram service.
//!
//! All behaviour is controlled through [`GeneratorConfig`], built via its
//! [`GeneratorConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across request handlers behind an `Arc`,
//! log it at startup, and diff two deployments to understand why their
//! outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for the diagram-generation service.
///
/// Built via [`GeneratorConfig::builder()`]. The API key is the only field
/// without a usable default.
///
/// # Example
/// ```rust
/// use doc2graph::GeneratorConfig;
///
/// let config = GeneratorConfig::builder()
///     .api_key("sk-ant-test")
///     .ocr_language("eng")
///     .max_pdf_pages(20)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    /// API key sent as the `x-api-key` header on every generation call.
    ///
    /// Required; `build()` rejects an empty key. Redacted from the `Debug`
    /// output so configs can be logged at startup without leaking secrets.
    pub api_key: String,

    /// Endpoint of the text-generation service.
    /// Default: `https://api.anthropic.com/v1/messages`.
    pub base_url: String,

    /// Model identifier sent in the request body. Default: `claude-sonnet-4-20250514`.
    pub model: String,

    /// Upper bound on tokens the model may generate per call. Default: 4096.
    ///
    /// Diagrams are compact; 4096 tokens covers several hundred nodes and
    /// edges. Setting this too low truncates the diagram mid-line, which the
    /// merger then treats as ordinary (possibly duplicate) body lines.
    pub max_output_tokens: u32,

    /// Character cap applied to each file's cleaned text. Default: 20 000.
    ///
    /// Prompts grow linearly with corpus size and the model's context is
    /// finite. Text beyond the cap is cut and a truncation marker appended;
    /// entity mentions past the cap are simply not extracted. Range: ≥ 500.
    pub max_chars_per_file: usize,

    /// Hard ceiling on OCR'd PDF pages per document. Default: 50.
    ///
    /// A malformed or enormous PDF would otherwise stall a request for
    /// minutes of rasterize/OCR work. The ceiling trades completeness for a
    /// bounded worst case; text accumulated before the cut is still used.
    pub max_pdf_pages: u32,

    /// Language passed to the OCR engine (`tesseract -l`). Default: `eng`.
    pub ocr_language: String,

    /// Rasterization resolution in DPI for PDF pages. Range: 72-600. Default: 300.
    ///
    /// 300 DPI is what tesseract's own docs recommend for scanned text.
    /// Lower is faster but loses small glyphs; higher mostly burns CPU.
    pub ocr_dpi: u32,

    /// Maximum accepted multipart body size in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,

    /// Pipeline shape used when the request does not specify one. Default: combined.
    pub default_mode: GenerationMode,

    /// Optional per-call timeout for generation requests, in seconds. Default: none.
    ///
    /// The observed service behaviour is to wait as long as the remote side
    /// does; set this only when a hung upstream is worse than a degraded
    /// diagram. When the timeout fires the call is treated like any other
    /// generation failure and the fallback fragment is returned.
    pub request_timeout_secs: Option<u64>,

    /// Retry attempts after a retryable generation failure. Default: 0.
    ///
    /// Off by default: a degraded diagram is an acceptable outcome and the
    /// caller is waiting synchronously. Raise it for batch-style callers
    /// that prefer latency over placeholders.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_output_tokens: 4096,
            max_chars_per_file: 20_000,
            max_pdf_pages: 50,
            ocr_language: "eng".to_string(),
            ocr_dpi: 300,
            max_upload_bytes: 25 * 1024 * 1024,
            default_mode: GenerationMode::Combined,
            request_timeout_secs: None,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_chars_per_file", &self.max_chars_per_file)
            .field("max_pdf_pages", &self.max_pdf_pages)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("default_mode", &self.default_mode)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n.max(256);
        self
    }

    pub fn max_chars_per_file(mut self, n: usize) -> Self {
        self.config.max_chars_per_file = n.max(500);
        self
    }

    pub fn max_pdf_pages(mut self, n: u32) -> Self {
        self.config.max_pdf_pages = n.max(1);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n.max(1024);
        self
    }

    pub fn default_mode(mut self, mode: GenerationMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, ServiceError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "api_key must not be empty (set ANTHROPIC_API_KEY or --api-key)".into(),
            ));
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(ServiceError::InvalidConfig(format!(
                "base_url must be an HTTP(S) URL, got '{}'",
                c.base_url
            )));
        }
        if c.ocr_dpi < 72 || c.ocr_dpi > 600 {
            return Err(ServiceError::InvalidConfig(format!(
                "ocr_dpi must be 72-600, got {}",
                c.ocr_dpi
            )));
        }
        if c.max_pdf_pages == 0 {
            return Err(ServiceError::InvalidConfig("max_pdf_pages must be ≥ 1".into()));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(ServiceError::InvalidConfig("ocr_language must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which pipeline shape a request uses.
///
/// Combined mode sends every normalized file in one prompt and passes the
/// model's diagram straight through. Per-file mode issues one generation
/// call per file and merges the fragments, which keeps each prompt small
/// but costs one model round-trip per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum GenerationMode {
    /// One prompt carrying the whole corpus; the model output is the response. (default)
    #[default]
    Combined,
    /// One prompt per file; fragments are deduplicated and merged.
    PerFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_usable() {
        let config = GeneratorConfig::builder().api_key("k").build().unwrap();
        assert_eq!(config.max_pdf_pages, 50);
        assert_eq!(config.ocr_dpi, 300);
        assert_eq!(config.default_mode, GenerationMode::Combined);
        assert!(config.request_timeout_secs.is_none());
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = GeneratorConfig::builder().build().unwrap_err();
        assert!(err.to_string().contains("api_key"), "got: {err}");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = GeneratorConfig::builder()
            .api_key("k")
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let config = GeneratorConfig::builder()
            .api_key("k")
            .ocr_dpi(10_000)
            .max_pdf_pages(0)
            .max_chars_per_file(3)
            .build()
            .unwrap();
        assert_eq!(config.ocr_dpi, 600);
        assert_eq!(config.max_pdf_pages, 1);
        assert_eq!(config.max_chars_per_file, 500);
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let config = GeneratorConfig::builder()
            .api_key("sk-ant-very-secret")
            .build()
            .unwrap();
        let dump = format!("{config:?}");
        assert!(!dump.contains("very-secret"));
        assert!(dump.contains("<redacted>"));
    }

    #[test]
    fn mode_parses_from_kebab_case() {
        let mode: GenerationMode = serde_json::from_str("\"per-file\"").unwrap();
        assert_eq!(mode, GenerationMode::PerFile);
    }
}
