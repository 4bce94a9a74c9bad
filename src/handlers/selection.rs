// src/handlers/selection.rs - Selection set and session-preference surface.
use crate::session::{Command, CommandOutcome, Direction};
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
struct ToggleRequest {
    id: i64,
}

#[derive(Deserialize)]
struct DirectionRequest {
    dir: String,
}

pub fn selection_routes() -> Router {
    Router::new()
        .route("/api/selection", get(get_selection))
        .route("/api/selection/toggle", post(toggle_selection))
        .route("/api/selection/clear", post(clear_selection))
        .route("/api/direction", post(set_direction))
        .route("/api/state", get(get_state))
}

fn selection_body(selected: Vec<crate::catalog::Product>) -> Json<Value> {
    Json(json!({ "selected": selected }))
}

async fn get_selection(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let controller = state.controller.read().await;
    selection_body(controller.selected_products())
}

async fn toggle_selection(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ToggleRequest>,
) -> Json<Value> {
    let mut controller = state.controller.write().await;
    match controller.dispatch(Command::SelectProduct(request.id)) {
        CommandOutcome::Selection { selected } => selection_body(selected),
        _ => selection_body(controller.selected_products()),
    }
}

async fn clear_selection(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let mut controller = state.controller.write().await;
    match controller.dispatch(Command::ClearSelection) {
        CommandOutcome::Selection { selected } => selection_body(selected),
        _ => selection_body(controller.selected_products()),
    }
}

async fn set_direction(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<DirectionRequest>,
) -> impl IntoResponse {
    let Some(direction) = Direction::parse(&request.dir) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "direction must be \"ltr\" or \"rtl\"" })),
        );
    };

    let mut controller = state.controller.write().await;
    let applied = match controller.dispatch(Command::SetDirection(direction)) {
        CommandOutcome::Direction(applied) => applied,
        _ => direction,
    };
    (StatusCode::OK, Json(json!({ "dir": applied.as_str() })))
}

/// Bootstrap snapshot for the page: who we think the user is, how the
/// conversation has progressed, and what is selected.
async fn get_state(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let controller = state.controller.read().await;
    let last_question_at = controller
        .context()
        .questions()
        .last()
        .map(|question| question.timestamp);
    Json(json!({
        "user_name": controller.context().user_name(),
        "question_count": controller.context().question_count(),
        "last_question_at": last_question_at,
        "has_routine": controller.context().generated_routine().is_some(),
        "direction": controller.direction().as_str(),
        "selected": controller.selected_products(),
        "model": state.relay.model(),
    }))
}
