//! Thin HTTP transport exposing `SearchService` (spec.md §1: "the HTTP
//! transport... [is a] thin collaborator, not specified here"). This crate
//! does request decoding, response encoding, and status-code mapping; every
//! non-trivial decision lives in `nanoindex-service` and below.

mod error;
mod handlers;
mod types;

pub use types::*;

use axum::routing::{get, post};
use axum::Router;
use nanoindex_service::SearchService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state handed to every handler, replacing the
/// source's process-wide singletons (spec.md §9 "Global mutable state").
pub struct AppState {
    pub service: SearchService,
}

/// Builds the full axum router over `state`. Kept free of global state: the
/// caller owns the `AppState` and decides how (and how many times) to bind
/// it, which is what makes the handlers testable without a live socket.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/add", post(handlers::add))
        .route("/train", post(handlers::train))
        .route("/search", post(handlers::search))
        .route("/reset", post(handlers::reset))
        .route("/agent/stats", get(handlers::agent_stats))
        .route("/agent/reset", post(handlers::agent_reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use nanoindex_core::NanoIndexConfig;
    use tower::ServiceExt;

    fn test_state(dim: usize) -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = NanoIndexConfig::new(dir.path().to_string_lossy().to_string(), dim);
        cfg.initial_capacity = 8;
        let service = SearchService::open(cfg).unwrap();
        (dir, Arc::new(AppState { service }))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (_dir, state) = test_state(2);
        let app = router(state);
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn add_then_search_round_trips_over_http() {
        let (_dir, state) = test_state(2);
        let app = router(state);

        let add_body = serde_json::json!({"vectors": [1.0, 0.0, 0.0, 1.0], "ids": [1, 2]});
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/add")
                    .header("content-type", "application/json")
                    .body(Body::from(add_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let search_body = serde_json::json!({"vector": [1.0, 0.0], "top_k": 1});
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(search_body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["results"][0]["id"], 1);
    }

    #[tokio::test]
    async fn duplicate_add_returns_conflict() {
        let (_dir, state) = test_state(1);
        let app = router(state);
        let body = serde_json::json!({"vectors": [1.0], "ids": [1]});
        let req = || {
            Request::builder()
                .method("POST")
                .uri("/add")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        app.clone().oneshot(req()).await.unwrap();
        let resp = app.oneshot(req()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
