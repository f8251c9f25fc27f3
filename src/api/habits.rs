//! Habit CRUD and the mark/unmark transitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use habitual_core::models::{CreateHabitInput, Habit, UpdateHabitInput};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListHabitsQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteHabitRequest {
    pub user_id: String,
    /// Defaults to now.
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UncompleteHabitRequest {
    pub user_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/habits", post(create_habit).get(list_habits))
        .route(
            "/habits/{id}",
            get(get_habit).patch(update_habit).delete(delete_habit),
        )
        .route("/habits/{id}/complete", post(complete_habit))
        .route("/habits/{id}/uncomplete", post(uncomplete_habit))
}

async fn create_habit(
    State(state): State<AppState>,
    Json(input): Json<CreateHabitInput>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    let habit = state
        .run(move |engine, sink| Ok(engine.create_habit(input)?.dispatch(sink)))
        .await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn list_habits(
    State(state): State<AppState>,
    Query(query): Query<ListHabitsQuery>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let habits = state
        .run(move |engine, _| engine.list_habits(&query.user_id))
        .await?;
    Ok(Json(habits))
}

async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError> {
    let habit = state.run(move |engine, _| engine.view_habit(id)).await?;
    Ok(Json(habit))
}

async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateHabitInput>,
) -> Result<Json<Habit>, ApiError> {
    let habit = state
        .run(move |engine, sink| Ok(engine.update_habit(id, input)?.dispatch(sink)))
        .await?;
    Ok(Json(habit))
}

async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .run(move |engine, sink| Ok(engine.delete_habit(id)?.dispatch(sink)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn complete_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompleteHabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let habit = state
        .run(move |engine, sink| {
            Ok(engine
                .mark_completed(id, &req.user_id, req.completion_date)?
                .dispatch(sink))
        })
        .await?;
    Ok(Json(habit))
}

async fn uncomplete_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UncompleteHabitRequest>,
) -> Result<Json<Habit>, ApiError> {
    let habit = state
        .run(move |engine, sink| Ok(engine.unmark_completed(id, &req.user_id)?.dispatch(sink)))
        .await?;
    Ok(Json(habit))
}
