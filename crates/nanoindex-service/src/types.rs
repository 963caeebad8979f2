use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    pub latency_ms: f64,
    pub strategy: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AddOutcome {
    pub inserted: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrainOutcome {
    pub k: usize,
    pub n_trained: usize,
}
