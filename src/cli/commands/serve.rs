//! HTTP API server.
//!
//! Exposes episode processing and read-back over REST. Failed runs are
//! reported with their stage and cause only, never with an episode id.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::{ErrorKind, PodsumError};
use crate::orchestrator::Orchestrator;
use crate::pipeline::{EpisodeProcessingRequest, PipelineFailure, PipelineStage};
use crate::store::{EpisodeId, EpisodeOverview, EpisodeRecord};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

/// Build the API router around an orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/episodes", get(list_episodes))
        .route("/api/episodes/{id}", get(get_episode))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let orchestrator = Arc::new(Orchestrator::new(&settings)?);
    let app = router(orchestrator);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Podsum API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Process", "POST /api/upload");
    Output::kv("List Episodes", "GET  /api/episodes");
    Output::kv("Get Episode", "GET  /api/episodes/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Response Types ===

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct FailureResponse {
    status: &'static str,
    stage: &'static str,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct EpisodeListResponse {
    episodes: Vec<EpisodeOverview>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Persistence | ErrorKind::Config | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn failure_response(failure: &PipelineFailure) -> Response {
    (
        status_for(failure.kind()),
        Json(FailureResponse {
            status: "error",
            stage: failure.stage().label(),
            kind: failure.kind().as_str(),
            message: format!("Error: {}", failure),
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

// === Handlers ===

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Hello World" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// A body that does not decode into a request fails the audio stage as a
/// validation error, like an empty `audio_url`.
fn request_failure(rejection: JsonRejection) -> PipelineFailure {
    PipelineFailure::new(
        PipelineStage::Audio,
        PodsumError::Validation(format!("Invalid request body: {}", rejection.body_text())),
    )
}

async fn upload(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<EpisodeProcessingRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return failure_response(&request_failure(rejection)),
    };

    match state.orchestrator.process_episode(req).await {
        Ok(_) => Json(UploadResponse {
            status: "success",
            message: "Episode processed successfully",
        })
        .into_response(),
        Err(failure) => {
            error!("Episode processing failed: {}", failure);
            failure_response(&failure)
        }
    }
}

async fn list_episodes(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.store().list_episodes().await {
        Ok(episodes) => Json(EpisodeListResponse {
            total: episodes.len(),
            episodes,
        })
        .into_response(),
        Err(e) => error_response(status_for(e.kind()), e.to_string()),
    }
}

async fn get_episode(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let id: EpisodeId = match id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let found: crate::Result<Option<EpisodeRecord>> =
        state.orchestrator.store().get_episode(id).await;

    match found {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Episode not found: {}", id)),
        Err(e) => error_response(status_for(e.kind()), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Upstream), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorKind::Persistence),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_failure_response_status() {
        let failure = PipelineFailure::new(
            PipelineStage::SaveTranscript,
            PodsumError::Persistence("disk full".to_string()),
        );
        let response = failure_response(&failure);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
