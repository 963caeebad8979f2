use nanoindex_service::{AddOutcome, SearchHit, SearchOutcome, TrainOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub vectors: Vec<f32>,
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub inserted: usize,
    pub total: usize,
}

impl From<AddOutcome> for AddResponse {
    fn from(o: AddOutcome) -> Self {
        Self {
            inserted: o.inserted,
            total: o.total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub n_cells: usize,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub k: usize,
    pub n_trained: usize,
}

impl From<TrainOutcome> for TrainResponse {
    fn from(o: TrainOutcome) -> Self {
        Self {
            k: o.k,
            n_trained: o.n_trained,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    #[serde(default)]
    pub use_index: bool,
    #[serde(default)]
    pub use_agent: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub id: i64,
    pub distance: f32,
}

impl From<SearchHit> for SearchResultResponse {
    fn from(hit: SearchHit) -> Self {
        Self {
            id: hit.id,
            distance: hit.distance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultResponse>,
    pub latency_ms: f64,
    pub strategy: String,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(o: SearchOutcome) -> Self {
        Self {
            results: o.results.into_iter().map(Into::into).collect(),
            latency_ms: o.latency_ms,
            strategy: o.strategy,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ArmStatsResponse {
    pub arm: String,
    pub pulls: u64,
    pub total_reward: f64,
    pub avg_reward: f64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct AgentStatsResponse {
    pub statistics: Vec<ArmStatsResponse>,
}

#[derive(Debug, Serialize)]
pub struct AgentResetResponse {
    pub ok: bool,
}
