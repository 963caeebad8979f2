//! HTTP handlers exposing `SearchService`'s operations (spec.md §6). Each
//! handler is a thin translation: decode the request DTO, call the core
//! operation, encode the response DTO. No business logic lives here.

use crate::error::ApiError;
use crate::types::{
    AddRequest, AddResponse, AgentResetResponse, AgentStatsResponse, ArmStatsResponse, OkResponse,
    SearchRequest, SearchResponse, TrainRequest, TrainResponse,
};
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddRequest>,
) -> Result<Json<AddResponse>, ApiError> {
    let outcome = state.service.add(&req.vectors, &req.ids)?;
    Ok(Json(outcome.into()))
}

pub async fn train(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrainRequest>,
) -> Result<Json<TrainResponse>, ApiError> {
    let outcome = state.service.train(req.n_cells, req.seed)?;
    Ok(Json(outcome.into()))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let outcome = state
        .service
        .search(&req.vector, req.top_k, req.use_index, req.use_agent)?;
    Ok(Json(outcome.into()))
}

pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<OkResponse>, ApiError> {
    state.service.reset()?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn agent_stats(State(state): State<Arc<AppState>>) -> Json<AgentStatsResponse> {
    let stats = state.service.agent_stats();
    Json(AgentStatsResponse {
        statistics: stats
            .into_iter()
            .map(|(name, s)| ArmStatsResponse {
                arm: name.to_string(),
                pulls: s.pulls,
                total_reward: s.total_reward,
                avg_reward: s.avg_reward,
                avg_latency_ms: s.avg_latency_ms,
            })
            .collect(),
    })
}

pub async fn agent_reset(State(state): State<Arc<AppState>>) -> Json<AgentResetResponse> {
    state.service.agent_reset();
    Json(AgentResetResponse { ok: true })
}
