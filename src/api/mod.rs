//! HTTP API.
//!
//! A thin axum layer over [`HabitEngine`]. Engine calls block on SQLite, so
//! every handler hops onto the blocking pool and dispatches the returned
//! effects there before responding.

mod error;
mod habits;
mod jobs;
mod stats;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use habitual_core::{EffectSink, HabitEngine};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};

#[derive(Clone)]
pub struct AppState {
    pub engine: HabitEngine,
    pub sink: Arc<dyn EffectSink>,
}

impl AppState {
    pub fn new(engine: HabitEngine, sink: Arc<dyn EffectSink>) -> Self {
        Self { engine, sink }
    }

    /// Run a blocking engine call off the async runtime.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&HabitEngine, &dyn EffectSink) -> habitual_core::Result<T> + Send + 'static,
    {
        let engine = self.engine.clone();
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || f(&engine, sink.as_ref()))
            .await
            .map_err(|e| ApiError::internal(format!("engine task failed: {}", e)))?
            .map_err(ApiError::from)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(habits::routes())
        .merge(stats::routes())
        .merge(jobs::routes());

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
