//! Manual triggers for the batch jobs the scheduler normally runs.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use habitual_core::engine::ReconcileReport;
use serde::Serialize;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct AffectedResponse {
    pub affected: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/reset-daily", post(reset_daily))
        .route("/jobs/check-streaks", post(check_streaks))
        .route("/jobs/reminders", post(reminders))
}

async fn reset_daily(State(state): State<AppState>) -> Result<Json<AffectedResponse>, ApiError> {
    let affected = state
        .run(|engine, _| engine.reset_daily_completions())
        .await?;
    Ok(Json(AffectedResponse { affected }))
}

async fn check_streaks(State(state): State<AppState>) -> Result<Json<ReconcileReport>, ApiError> {
    let report = state
        .run(|engine, sink| Ok(engine.check_and_reset_broken_streaks()?.dispatch(sink)))
        .await?;
    Ok(Json(report))
}

async fn reminders(State(state): State<AppState>) -> Result<Json<AffectedResponse>, ApiError> {
    let affected = state
        .run(|engine, sink| Ok(engine.send_due_reminders()?.dispatch(sink)))
        .await?;
    Ok(Json(AffectedResponse { affected }))
}
