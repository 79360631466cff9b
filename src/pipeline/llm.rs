//! Generation client for the remote diagram model.
//!
//! One job: prompt in, usable diagram text out, no exceptions escaping.
//! The response body served to the user *is* (or contains) this module's
//! output, so every failure mode (transport error, non-2xx status,
//! malformed payload, a response with no graph header) degrades to the
//! fixed [`FALLBACK_FRAGMENT`] with the recovered [`Diagnostic`] kept on
//! the fragment for logs and stats.
//!
//! Retries exist but default to zero: the caller is a synchronous HTTP
//! request, and a degraded diagram beats a long wait. When enabled, the
//! delay starts at the configured backoff and doubles per attempt, and only
//! statuses the service is known to recover from are retried.

use crate::config::GeneratorConfig;
use crate::error::{Diagnostic, ServiceError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Diagram returned when generation fails or the response has no header.
pub const FALLBACK_FRAGMENT: &str =
    "graph TD\nN0[\"No extractable entities / no valid diagram returned\"]";

/// Protocol revision sent with every request.
const API_VERSION: &str = "2023-06-01";

/// Longest response-body excerpt carried into a failure detail.
const BODY_SNIPPET_CHARS: usize = 300;

static RE_GRAPH_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)graph[ \t]+(?:td|lr)\b").unwrap());

/// Raw model output for one prompt (combined corpus or a single file).
///
/// `text` is always usable diagram text; when generation degraded, `error`
/// records what was recovered and `text` holds the fallback.
#[derive(Debug, Clone)]
pub struct DiagramFragment {
    /// Which unit of work produced this: `"combined"` or a file name.
    pub source: String,
    pub text: String,
    pub error: Option<Diagnostic>,
}

impl DiagramFragment {
    /// Whether this fragment carries fallback content instead of a real
    /// model diagram.
    pub fn degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Client for the text-generation service.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct DiagramClient {
    config: Arc<GeneratorConfig>,
    http: reqwest::Client,
}

impl DiagramClient {
    pub fn new(config: Arc<GeneratorConfig>) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|source| ServiceError::ClientBuild { source })?;
        Ok(Self { config, http })
    }

    /// Generate a diagram fragment for one prompt.
    ///
    /// Infallible by contract: the returned fragment always holds usable
    /// diagram text, falling back to [`FALLBACK_FRAGMENT`] on any failure.
    pub async fn generate(&self, prompt: &str, source: &str) -> DiagramFragment {
        let mut last_failure: Option<CallFailure> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_ms = self.config.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(source, attempt, backoff_ms, "retrying generation call");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }

            match self.request_once(prompt).await {
                Ok(raw) => {
                    return match extract_graph(&raw) {
                        Some(diagram) => {
                            debug!(source, chars = diagram.len(), "generation succeeded");
                            DiagramFragment {
                                source: source.to_string(),
                                text: diagram,
                                error: None,
                            }
                        }
                        None => {
                            warn!(source, "model response has no graph header; using fallback");
                            DiagramFragment {
                                source: source.to_string(),
                                text: FALLBACK_FRAGMENT.to_string(),
                                error: Some(Diagnostic::NoExtractableEntities),
                            }
                        }
                    };
                }
                Err(failure) => {
                    let can_retry = failure.retryable && attempt < self.config.max_retries;
                    warn!(
                        source,
                        attempt,
                        retryable = failure.retryable,
                        detail = %failure.detail,
                        "generation call failed"
                    );
                    last_failure = Some(failure);
                    if !can_retry {
                        break;
                    }
                }
            }
        }

        let detail = last_failure
            .map(|f| f.detail)
            .unwrap_or_else(|| "unknown failure".to_string());
        DiagramFragment {
            source: source.to_string(),
            text: FALLBACK_FRAGMENT.to_string(),
            error: Some(Diagnostic::RemoteGenerationFailure { detail }),
        }
    }

    async fn request_once(&self, prompt: &str) -> Result<String, CallFailure> {
        let request = GenerationRequest {
            model: &self.config.model,
            max_tokens: self.config.max_output_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        };

        let response = self
            .http
            .post(&self.config.base_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(CallFailure::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallFailure {
                retryable: is_retryable_status(status.as_u16()),
                detail: format!("HTTP {status}: {}", body_snippet(&body)),
            });
        }

        let payload: GenerationResponse =
            response.json().await.map_err(CallFailure::malformed_from)?;
        payload
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| CallFailure {
                retryable: false,
                detail: "response contained no text block".to_string(),
            })
    }
}

/// Extract the diagram: everything from the first case-insensitive
/// graph-declaration header to the end of the text. Leading commentary and
/// markdown fencing the model may have added is discarded.
fn extract_graph(raw: &str) -> Option<String> {
    RE_GRAPH_HEADER
        .find(raw)
        .map(|m| raw[m.start()..].trim_end().to_string())
}

/// Statuses the generation service recovers from on its own.
fn is_retryable_status(code: u16) -> bool {
    matches!(code, 429 | 500 | 502 | 503 | 504 | 529)
}

fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(BODY_SNIPPET_CHARS).collect()
    }
}

struct CallFailure {
    retryable: bool,
    detail: String,
}

impl CallFailure {
    fn transport(err: reqwest::Error) -> Self {
        Self {
            retryable: true,
            detail: format!("transport error: {err}"),
        }
    }

    fn malformed_from(err: reqwest::Error) -> Self {
        Self {
            retryable: false,
            detail: format!("malformed response: {err}"),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
struct ContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    text: Option<String>,
}
