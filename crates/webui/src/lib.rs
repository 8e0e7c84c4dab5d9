// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! HTTP interface for BMCTrace
//!
//! Exposes counterexample reconstruction to browser clients: a checker report
//! and the analysed source go in, a [`VerificationResponse`] comes out.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bmctrace_engine::{HarnessConfig, HarnessError, HarnessGenerator, ParseOptions, VerificationResponse};
use eyre::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Configuration for the Web UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebUiConfig {
    /// Interface to bind
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Default parse options, overridable per request
    pub parse: ParseOptions,
    /// Ranges used by generated harnesses
    pub harness: HarnessConfig,
}

impl Default for WebUiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            parse: ParseOptions::default(),
            harness: HarnessConfig::default(),
        }
    }
}

/// Body of `POST /api/trace`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRequest {
    /// Raw checker output
    pub report: String,
    /// The analysed source text
    pub source: String,
    /// Name of the analysed file as the checker saw it
    #[serde(default)]
    pub file_name: Option<String>,
    /// Command line that produced the report
    #[serde(default)]
    pub command: Option<String>,
    /// Checker run time in seconds
    #[serde(default)]
    pub elapsed: Option<f64>,
}

/// Error body returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"error"`
    pub status: String,
    /// What went wrong
    pub message: String,
}

/// Request failures and their HTTP mapping
#[derive(Debug, Error)]
pub enum WebUiError {
    /// The request body was not a valid trace request
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// The reproduction harness could not be generated
    #[error(transparent)]
    Harness(#[from] HarnessError),
}

impl From<JsonRejection> for WebUiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for WebUiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Harness(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(%status, error = %self, "Request failed");

        let body = ErrorResponse { status: "error".to_string(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug)]
struct AppState {
    parse: ParseOptions,
    generator: HarnessGenerator,
}

/// Main Web UI server
#[derive(Debug)]
pub struct WebUi {
    config: WebUiConfig,
}

impl WebUi {
    /// Create a new Web UI instance
    pub fn new(config: WebUiConfig) -> Self {
        Self { config }
    }

    /// Build the router for the web application
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            parse: self.config.parse.clone(),
            generator: HarnessGenerator::new(self.config.harness),
        });

        Router::new()
            .route("/health", get(|| async { "OK" }))
            .route("/api/trace", post(trace_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Run the Web UI server
    pub async fn run(self) -> Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;

        tracing::info!("Starting Web UI server on http://{}", listener.local_addr()?);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn trace_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TraceRequest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, WebUiError> {
    let Json(request) = payload?;

    let options = ParseOptions { file_name: request.file_name.or_else(|| state.parse.file_name.clone()) };
    tracing::debug!(
        report_bytes = request.report.len(),
        source_bytes = request.source.len(),
        file_name = ?options.file_name,
        "Reconstructing counterexample"
    );

    let response = VerificationResponse::build(&request.report, &request.source, &options, &state.generator)?
        .with_command(request.command)
        .with_elapsed(request.elapsed);

    tracing::info!(verdict = %response.verdict, steps = response.counterexample.len(), "Trace request served");
    Ok(Json(response))
}

/// Public API for the Web UI module
pub mod api {
    use super::*;

    /// Start the Web UI with the given configuration
    pub async fn start_webui(config: WebUiConfig) -> Result<()> {
        let webui = WebUi::new(config);
        webui.run().await
    }
}
