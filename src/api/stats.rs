//! Read-side views: heatmap, dashboard, per-habit streak statistics.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use habitual_core::models::{DashboardMetrics, Heatmap, StreakHistory, StreakStats};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/habits/{id}/stats", get(streak_stats))
        .route("/habits/{id}/history", get(streak_history))
        .route("/users/{user_id}/heatmap", get(heatmap))
        .route("/users/{user_id}/dashboard", get(dashboard))
}

async fn streak_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StreakStats>, ApiError> {
    let stats = state.run(move |engine, _| engine.get_streak_stats(id)).await?;
    Ok(Json(stats))
}

async fn streak_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StreakHistory>>, ApiError> {
    let history = state
        .run(move |engine, _| {
            engine.get_habit(id)?;
            engine.list_streak_history(id)
        })
        .await?;
    Ok(Json(history))
}

async fn heatmap(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<Heatmap>, ApiError> {
    let heatmap = state
        .run(move |engine, _| engine.get_heatmap_data(&user_id, query.start, query.end))
        .await?;
    Ok(Json(heatmap))
}

async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DashboardMetrics>, ApiError> {
    let metrics = state
        .run(move |engine, _| engine.get_dashboard_metrics(&user_id))
        .await?;
    Ok(Json(metrics))
}
