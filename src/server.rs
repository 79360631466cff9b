//! HTTP surface: one generation endpoint plus a liveness probe.
//!
//! The response body is a diagram on every path: success, degraded
//! success, no files, even an internal failure. Consumers render whatever
//! comes back, so error conditions are communicated as a diagram with a
//! single diagnostic node, never as JSON or an error page.
//!
//! Status codes: 200 success (including degraded placeholder diagrams),
//! 400 no files / undecodable multipart, 405 wrong method (axum's method
//! router), 500 unhandled failure.

use crate::config::{GenerationMode, GeneratorConfig};
use crate::error::ServiceError;
use crate::generate::{self, GenerationOutcome};
use crate::pipeline::ingest;
use crate::pipeline::llm::DiagramClient;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Body of the 400 response when a request carries no files.
pub const NO_FILES_DIAGRAM: &str = "graph TD\nN0[\"No files were uploaded\"]";

/// Body of the 500 response when the pipeline fails unexpectedly.
pub const FAILURE_DIAGRAM: &str = "graph TD\nN0[\"Diagram generation failed unexpectedly\"]";

/// Shared per-process state; cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GeneratorConfig>,
    pub client: DiagramClient,
}

impl AppState {
    pub fn new(config: GeneratorConfig) -> Result<Self, ServiceError> {
        let config = Arc::new(config);
        let client = DiagramClient::new(Arc::clone(&config))?;
        Ok(Self { config, client })
    }
}

#[derive(Debug, Deserialize)]
struct DiagramQuery {
    mode: Option<GenerationMode>,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/diagram", post(generate_diagram_handler))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServiceError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Serve {
            addr: addr.to_string(),
            source,
        })?;
    info!(%addr, "doc2graph listening");
    axum::serve(listener, create_router(state))
        .await
        .map_err(|source| ServiceError::Serve {
            addr: addr.to_string(),
            source,
        })
}

async fn health() -> &'static str {
    "ok"
}

async fn generate_diagram_handler(
    State(state): State<AppState>,
    query: Result<Query<DiagramQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // ── Step 1: Resolve the request shape ────────────────────────────────
    let mode = match query {
        Ok(Query(DiagramQuery { mode })) => mode.unwrap_or(state.config.default_mode),
        Err(rejection) => {
            warn!(error = %rejection, "unusable query string; using the configured mode");
            state.config.default_mode
        }
    };
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(error = %rejection, "request body is not decodable multipart");
            return diagram_response(StatusCode::BAD_REQUEST, NO_FILES_DIAGRAM);
        }
    };

    // ── Step 2: Spool the uploads ────────────────────────────────────────
    let batch = match ingest::spool_multipart(multipart).await {
        Ok(batch) => batch,
        Err(err) => {
            error!(error = %err, "failed to spool uploads");
            return diagram_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_DIAGRAM);
        }
    };
    if batch.is_empty() {
        warn!("request carried no file parts");
        return diagram_response(StatusCode::BAD_REQUEST, NO_FILES_DIAGRAM);
    }

    // ── Step 3: Run the pipeline ─────────────────────────────────────────
    info!(files = batch.len(), mode = ?mode, "received diagram request");
    let client = state.client.clone();
    let config = Arc::clone(&state.config);
    // Spawned so a panic surfaces as a JoinError and degrades to the
    // failure diagram instead of tearing down the connection.
    let outcome = tokio::spawn(async move {
        generate::generate_diagram(&batch.files, mode, &client, &config).await
    })
    .await;

    match outcome {
        Ok(GenerationOutcome { diagram, .. }) => diagram_response(StatusCode::OK, &diagram),
        Err(join_error) => {
            error!(error = %join_error, "diagram pipeline aborted");
            diagram_response(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_DIAGRAM)
        }
    }
}

fn diagram_response(status: StatusCode, body: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.to_string(),
    )
        .into_response()
}
