//! HTTP status, health and on-demand generation endpoints

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use phrasecast_domain::{GenerationReport, PipelineStatus};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::commands::AppPipeline;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<AppPipeline>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(rename = "status")]
    state: &'static str,
    #[serde(flatten)]
    pipeline: PipelineStatus,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<GenerationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn router(pipeline: Arc<AppPipeline>) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(health_handler))
        .route("/generate", post(generate_handler))
        .with_state(AppState { pipeline })
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, pipeline: Arc<AppPipeline>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "HTTP server listening");
    }

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn status_handler(State(state): State<AppState>) -> Response {
    match state.pipeline.status().await {
        Ok(pipeline) => Json(StatusResponse {
            state: "running",
            pipeline,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Status query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn generate_handler(State(state): State<AppState>) -> Response {
    match state.pipeline.generate_all().await {
        Ok(report) => Json(GenerateResponse {
            success: true,
            report: Some(report),
            error: None,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(GenerateResponse {
                success: false,
                report: None,
                error: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}
