//! Request handlers and wire types for the HTTP surface.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::error;

use crate::app::AppContext;
use crate::error::RagError;
use crate::search::SimilarityResult;
use crate::storage::JobFields;

/// Jobs retrieved as generation context per chat turn
const CHAT_CONTEXT_K: usize = 3;

/// Default result count for /search_jobs
const DEFAULT_SEARCH_LIMIT: usize = 5;

pub type ApiRejection = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub features: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct AddJobResponse {
    pub success: bool,
    pub job_id: i64,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SearchJobsRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchJobsResponse {
    pub jobs: Vec<SimilarityResult>,
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub relevant_jobs: Vec<SimilarityResult>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub chat_history: Vec<ChatHistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryEntry {
    pub message: String,
    pub response: String,
    pub timestamp: String,
}

pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<HealthResponse> {
    let mut features = vec!["vector-search", "chat-history"];
    if ctx.generation_enabled {
        features.push("generation");
    }
    Json(HealthResponse {
        status: "healthy",
        service: "jobrag",
        version: env!("CARGO_PKG_VERSION"),
        features,
    })
}

pub async fn add_job(
    State(ctx): State<Arc<AppContext>>,
    Json(fields): Json<JobFields>,
) -> Result<Json<AddJobResponse>, ApiRejection> {
    let store = ctx.store.clone();
    let job_id = task::spawn_blocking(move || store.add_job(&fields))
        .await
        .map_err(join_failure)?
        .map_err(reject)?;

    Ok(Json(AddJobResponse {
        success: true,
        job_id,
        message: "job added to the vector store",
    }))
}

pub async fn search_jobs(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<SearchJobsRequest>,
) -> Result<Json<SearchJobsResponse>, ApiRejection> {
    let query = request
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| reject(RagError::Validation("query is required".to_string())))?;

    let limit = request
        .limit
        .map_or(DEFAULT_SEARCH_LIMIT, |l| l.max(0) as usize);

    let ranker = ctx.ranker.clone();
    let ranked_query = query.clone();
    let jobs = task::spawn_blocking(move || ranker.rank(&ranked_query, limit))
        .await
        .map_err(join_failure)?
        .map_err(reject)?;

    let count = jobs.len();
    Ok(Json(SearchJobsResponse { jobs, query, count }))
}

pub async fn chat(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiRejection> {
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| reject(RagError::Validation("message is required".to_string())))?;
    let user_id = request.user_id.unwrap_or_else(|| "default".to_string());

    let ranker = ctx.ranker.clone();
    let query = message.clone();
    let relevant_jobs = task::spawn_blocking(move || ranker.rank(&query, CHAT_CONTEXT_K))
        .await
        .map_err(join_failure)?
        .map_err(reject)?;

    let response = ctx.composer.respond(&message, &relevant_jobs).await;

    let context_ids: Vec<i64> = relevant_jobs.iter().map(|job| job.id).collect();
    let store = ctx.store.clone();
    let (turn_message, turn_response) = (message.clone(), response.clone());
    task::spawn_blocking(move || {
        store.record_chat(&user_id, &turn_message, &turn_response, &context_ids)
    })
    .await
    .map_err(join_failure)?
    .map_err(reject)?;

    Ok(Json(ChatResponse {
        response,
        relevant_jobs,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

pub async fn chat_history(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
) -> Result<Json<ChatHistoryResponse>, ApiRejection> {
    let store = ctx.store.clone();
    let turns = task::spawn_blocking(move || store.chat_history(&user_id))
        .await
        .map_err(join_failure)?
        .map_err(reject)?;

    let chat_history = turns
        .into_iter()
        .map(|turn| ChatHistoryEntry {
            message: turn.message,
            response: turn.response,
            timestamp: turn.created_at,
        })
        .collect();

    Ok(Json(ChatHistoryResponse { chat_history }))
}

/// Map core errors onto HTTP statuses: validation is the caller's fault,
/// everything else is ours and gets logged.
fn reject(err: RagError) -> ApiRejection {
    let status = match err {
        RagError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn join_failure(err: task::JoinError) -> ApiRejection {
    error!(error = %err, "blocking task failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal task failure".to_string(),
        }),
    )
}
